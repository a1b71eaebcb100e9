//! Hash-keyed opening tree classifier.
//!
//! An [`OpeningTree`] indexes known theory by the Zobrist hash of the
//! positions it passes through, built either from [`builtin`] seed data
//! or from a database's `optree` table. [`OpeningTree::classify`] walks a
//! game's mainline against the index and returns the deepest ECO match.

pub mod builtin;
pub mod opening;
pub mod tree;

pub use builtin::builtin_tree;
pub use opening::{Classification, OpeningLabel, OpeningTreeEntry};
pub use tree::OpeningTree;
