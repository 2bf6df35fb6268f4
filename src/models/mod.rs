//! # Data Models
//!
//! Sample SeaORM entities served through the generic repository.

pub mod author;
pub mod book;

pub use author::Entity as Author;
pub use book::Entity as Book;
