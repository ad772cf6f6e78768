//! The chess rules collaborator.
//!
//! Move generation lives outside this crate. The explorer only needs the
//! ordered list of legal moves from a position together with the position
//! each move leads to.

/// Legal move enumeration for one game variant.
pub trait Rules {
    type Position;
    type Move;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Legal moves from `position`, each paired with the resulting position.
    ///
    /// The returned order is the order the explorer presents children in.
    fn legal_moves(
        &self,
        position: &Self::Position,
    ) -> Result<Vec<(Self::Move, Self::Position)>, Self::Error>;
}

impl<R: Rules + ?Sized> Rules for &R {
    type Position = R::Position;
    type Move = R::Move;
    type Error = R::Error;

    fn legal_moves(
        &self,
        position: &Self::Position,
    ) -> Result<Vec<(Self::Move, Self::Position)>, Self::Error> {
        (**self).legal_moves(position)
    }
}
