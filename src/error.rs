//! # Error Handling
//!
//! Repository operations return the store's native [`DbErr`] unchanged. The
//! helpers here classify those errors for callers without wrapping them.

use sea_orm::{DbErr, RuntimeErr, SqlErr};

const PG_UNIQUE: &str = "23505";
const PG_FOREIGN_KEY: &str = "23503";
const MYSQL_DUPLICATE_CODES: &[&str] = &["1022", "1062", "1169", "1586"];
const MYSQL_FOREIGN_KEY_CODES: &[&str] = &["1216", "1217", "1451", "1452"];
const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];
const SQLITE_FOREIGN_KEY_CODES: &[&str] = &["787"];

/// Returns true when `error` is a uniqueness or primary-key violation.
pub fn is_unique_violation(error: &DbErr) -> bool {
    if matches!(error.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }

    database_error_code(error).is_some_and(|code| {
        code == PG_UNIQUE
            || MYSQL_DUPLICATE_CODES.contains(&code.as_str())
            || SQLITE_DUPLICATE_CODES.contains(&code.as_str())
    })
}

/// Returns true when `error` is a foreign-key violation.
pub fn is_foreign_key_violation(error: &DbErr) -> bool {
    if matches!(
        error.sql_err(),
        Some(SqlErr::ForeignKeyConstraintViolation(_))
    ) {
        return true;
    }

    database_error_code(error).is_some_and(|code| {
        code == PG_FOREIGN_KEY
            || MYSQL_FOREIGN_KEY_CODES.contains(&code.as_str())
            || SQLITE_FOREIGN_KEY_CODES.contains(&code.as_str())
    })
}

/// Returns true when `error` reports that a row targeted by primary key was
/// not found, e.g. an update of a row that no longer exists.
pub fn is_missing_row(error: &DbErr) -> bool {
    matches!(
        error,
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated
    )
}

fn database_error_code(error: &DbErr) -> Option<String> {
    let runtime_err = match error {
        DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return None,
    };

    runtime_err
        .as_database_error()
        .and_then(|db_error| db_error.code())
        .map(|code| code.into_owned())
}
