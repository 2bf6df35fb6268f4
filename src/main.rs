//! # repokit command line
//!
//! Applies the sample schema and inspects it through the generic repository.

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use repokit::{
    config::ConfigLoader,
    db::{health_check, init_pool},
    models::{Author, Book, author},
    repositories::{FindOptions, Repository},
    telemetry::init_tracing,
};
use sea_orm::sea_query::Condition;

#[derive(Debug, Parser)]
#[command(name = "repokit", version, about = "Generic repository toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Verify the database answers queries
    Check,
    /// Print row counts per table
    Stats,
    /// Print every author as JSON, ordered by name
    Authors,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load()?;
    init_tracing(&config)?;
    tracing::info!(profile = %config.profile, config = %config.redacted_json()?, "configuration loaded");

    let db = init_pool(&config).await?;

    match cli.command {
        Command::Migrate => {
            Migrator::up(&db, None).await?;
            println!("migrations applied");
        }
        Command::Check => {
            health_check(&db).await?;
            println!("ok");
        }
        Command::Stats => {
            let authors = Repository::<Author, _>::new(&db).count(Condition::all()).await?;
            let books = Repository::<Book, _>::new(&db).count(Condition::all()).await?;
            println!("authors: {authors}");
            println!("books: {books}");
        }
        Command::Authors => {
            let options = FindOptions::new().include(author::order_by_name());
            let authors = Repository::<Author, _>::new(&db).get_all(options).await?;
            println!("{}", serde_json::to_string_pretty(&authors)?);
        }
    }

    Ok(())
}
