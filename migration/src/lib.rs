//! Database migrations for the sample repokit schema.
//!
//! The schema backs the repository test-suite and the `repokit migrate` command.

pub use sea_orm_migration::prelude::*;

mod m2025_01_01_000001_create_authors;
mod m2025_01_01_000002_create_books;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_01_01_000001_create_authors::Migration),
            Box::new(m2025_01_01_000002_create_books::Migration),
        ]
    }
}
