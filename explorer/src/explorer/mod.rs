//! Read-side composition: hashing, storage and the rules collaborator.

pub mod tree;

pub use tree::{ExplorerError, ExplorerNode, ExplorerTree};
