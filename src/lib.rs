//! # repokit
//!
//! A generic repository over SeaORM: one entity-agnostic CRUD and query
//! surface, plus the configuration, connection and tracing plumbing needed to
//! run it.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod telemetry;
pub use migration;
