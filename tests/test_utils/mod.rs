//! Test utilities for database testing.
//!
//! Sets up in-memory SQLite databases with the sample schema applied and
//! builds author/book fixtures.

use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use repokit::models::{author, book};
use repokit::repositories::Repository;
use sea_orm::{Database, DatabaseConnection, Set};
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// SQLite enforces foreign keys on these connections, so books must reference
/// an existing author.
#[allow(dead_code)]
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// An author ready for insertion; the store assigns the id.
#[allow(dead_code)]
pub fn new_author(name: &str) -> author::ActiveModel {
    author::ActiveModel {
        name: Set(name.to_string()),
        email: Set(Some(format!("{}@example.com", name.to_lowercase()))),
        ..Default::default()
    }
}

/// A book ready for insertion with a fresh UUID key.
#[allow(dead_code)]
pub fn new_book(author_id: i32, title: &str, pages: i32) -> book::ActiveModel {
    book::ActiveModel {
        id: Set(Uuid::new_v4()),
        author_id: Set(author_id),
        title: Set(title.to_string()),
        pages: Set(pages),
    }
}

/// Seeds two authors with books and one author without any.
///
/// Returns the authors in insertion order: Le Guin (3 books), Butler
/// (2 books), Delany (none).
#[allow(dead_code)]
pub async fn seed_library(db: &DatabaseConnection) -> Result<Vec<author::Model>> {
    let authors = Repository::<author::Entity, _>::new(db);
    let books = Repository::<book::Entity, _>::new(db);

    let le_guin = authors.add(new_author("Le Guin")).await?;
    let butler = authors.add(new_author("Butler")).await?;
    let delany = authors.add(new_author("Delany")).await?;

    books
        .add_many([
            new_book(le_guin.id, "The Dispossessed", 387),
            new_book(le_guin.id, "The Left Hand of Darkness", 304),
            new_book(le_guin.id, "A Wizard of Earthsea", 183),
            new_book(butler.id, "Kindred", 264),
            new_book(butler.id, "Parable of the Sower", 345),
        ])
        .await?;

    Ok(vec![le_guin, butler, delany])
}
