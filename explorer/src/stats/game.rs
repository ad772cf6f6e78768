//! # Game References
//!
//! A [`GameReference`] is what the import pipeline hands the core for each
//! ingested game: who won, how fast it was played, when, and roughly how
//! strong the players were. The core never looks further into a game than
//! this.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::config::GAME_ID_LENGTH;

use super::month::Month;

// ---------------------------------------------------------------------------
// GameId
// ---------------------------------------------------------------------------

/// Eight alphanumeric ASCII characters, e.g. `"Qa7FJNk2"`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameId([u8; GAME_ID_LENGTH]);

impl GameId {
    pub fn from_bytes(bytes: [u8; GAME_ID_LENGTH]) -> Result<GameId, InvalidGameId> {
        if bytes.iter().all(u8::is_ascii_alphanumeric) {
            Ok(GameId(bytes))
        } else {
            Err(InvalidGameId)
        }
    }

    pub fn as_bytes(&self) -> &[u8; GAME_ID_LENGTH] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Construction guarantees ASCII.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for GameId {
    type Err = InvalidGameId;

    fn from_str(s: &str) -> Result<GameId, InvalidGameId> {
        let bytes: [u8; GAME_ID_LENGTH] = s.as_bytes().try_into().map_err(|_| InvalidGameId)?;
        GameId::from_bytes(bytes)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameId({})", self.as_str())
    }
}

impl Serialize for GameId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(self.as_str())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let text = String::deserialize(deserializer)?;
            text.parse().map_err(de::Error::custom)
        } else {
            let bytes = <[u8; GAME_ID_LENGTH]>::deserialize(deserializer)?;
            GameId::from_bytes(bytes).map_err(de::Error::custom)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid game id: expected {} alphanumeric characters", GAME_ID_LENGTH)]
pub struct InvalidGameId;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "white")]
    WhiteWins,
    #[serde(rename = "black")]
    BlackWins,
    #[serde(rename = "draw")]
    Draw,
}

impl Outcome {
    /// `None` means nobody won.
    pub fn from_winner(white_won: Option<bool>) -> Outcome {
        match white_won {
            Some(true) => Outcome::WhiteWins,
            Some(false) => Outcome::BlackWins,
            None => Outcome::Draw,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::WhiteWins => "white",
            Outcome::BlackWins => "black",
            Outcome::Draw => "draw",
        }
    }
}

impl FromStr for Outcome {
    type Err = InvalidOutcome;

    /// Accepts `white`/`black`/`draw` and PGN results.
    fn from_str(s: &str) -> Result<Outcome, InvalidOutcome> {
        match s {
            "white" | "1-0" => Ok(Outcome::WhiteWins),
            "black" | "0-1" => Ok(Outcome::BlackWins),
            "draw" | "1/2-1/2" => Ok(Outcome::Draw),
            _ => Err(InvalidOutcome),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid outcome")]
pub struct InvalidOutcome;

// ---------------------------------------------------------------------------
// Speed
// ---------------------------------------------------------------------------

/// Time control category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Speed {
    UltraBullet,
    Bullet,
    Blitz,
    Rapid,
    Classical,
    Correspondence,
}

impl Speed {
    pub const ALL: [Speed; 6] = [
        Speed::UltraBullet,
        Speed::Bullet,
        Speed::Blitz,
        Speed::Rapid,
        Speed::Classical,
        Speed::Correspondence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Speed::UltraBullet => "ultraBullet",
            Speed::Bullet => "bullet",
            Speed::Blitz => "blitz",
            Speed::Rapid => "rapid",
            Speed::Classical => "classical",
            Speed::Correspondence => "correspondence",
        }
    }
}

impl FromStr for Speed {
    type Err = InvalidSpeed;

    fn from_str(s: &str) -> Result<Speed, InvalidSpeed> {
        Speed::ALL
            .into_iter()
            .find(|speed| speed.as_str() == s)
            .ok_or(InvalidSpeed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid speed")]
pub struct InvalidSpeed;

/// One `T` per [`Speed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BySpeed<T> {
    pub ultra_bullet: T,
    pub bullet: T,
    pub blitz: T,
    pub rapid: T,
    pub classical: T,
    pub correspondence: T,
}

impl<T> BySpeed<T> {
    pub fn by_speed(&self, speed: Speed) -> &T {
        match speed {
            Speed::UltraBullet => &self.ultra_bullet,
            Speed::Bullet => &self.bullet,
            Speed::Blitz => &self.blitz,
            Speed::Rapid => &self.rapid,
            Speed::Classical => &self.classical,
            Speed::Correspondence => &self.correspondence,
        }
    }

    pub fn by_speed_mut(&mut self, speed: Speed) -> &mut T {
        match speed {
            Speed::UltraBullet => &mut self.ultra_bullet,
            Speed::Bullet => &mut self.bullet,
            Speed::Blitz => &mut self.blitz,
            Speed::Rapid => &mut self.rapid,
            Speed::Classical => &mut self.classical,
            Speed::Correspondence => &mut self.correspondence,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Speed, &T)> {
        Speed::ALL.into_iter().map(move |speed| (speed, self.by_speed(speed)))
    }

    pub fn zip_with<F>(&mut self, other: BySpeed<T>, mut f: F)
    where
        F: FnMut(&mut T, T),
    {
        f(&mut self.ultra_bullet, other.ultra_bullet);
        f(&mut self.bullet, other.bullet);
        f(&mut self.blitz, other.blitz);
        f(&mut self.rapid, other.rapid);
        f(&mut self.classical, other.classical);
        f(&mut self.correspondence, other.correspondence);
    }
}

// ---------------------------------------------------------------------------
// GameReference
// ---------------------------------------------------------------------------

/// One ingested game, as far as the statistics care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameReference {
    pub id: GameId,
    pub outcome: Outcome,
    pub speed: Speed,
    /// Month the game was played (last move).
    pub month: Month,
    /// Mean rating of both players.
    pub rating: u16,
}

impl GameReference {
    /// Mean of both ratings without overflowing.
    pub fn average_rating(white: u16, black: u16) -> u16 {
        ((u32::from(white) + u32::from(black)) / 2) as u16
    }
}
