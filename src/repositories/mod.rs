//! # Repository Layer
//!
//! A single generic repository encapsulates SeaORM operations for any entity,
//! providing a uniform API for data access over a borrowed connection.

pub mod generic;
pub mod options;

pub use generic::Repository;
pub use options::{FindOptions, Include, Tracking};
