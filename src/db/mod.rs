//! SQLite access for the dashboard tables.
//!
//! The tables have no schema known at compile time, so everything here goes
//! through raw statements rather than entities:
//! - `seed.rs`: first-run sample data and backfill of missing seed tables
//! - `tables.rs`: dynamic reads, whole-table replacement, version stamps

use thiserror::Error;

pub mod seed;
pub mod tables;

pub use seed::{seed_database, SEED_TABLES};
pub use tables::{ColumnInfo, ColumnSpec, SeriesPoint, TableData};

/// Error types for the database layer
#[derive(Error, Debug)]
pub enum DbError {
    /// Error from the underlying database driver
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Requested table does not exist in the database
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// Table or column name is not a safe SQL identifier
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Declared column type is outside the SQLite allowlist
    #[error("unsupported column type '{0}'")]
    UnsupportedColumnType(String),

    /// Replacement payload declared no columns
    #[error("table replacement requires at least one column")]
    NoColumns,

    /// Requested column does not exist in the table
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Chart series requested over a non-numeric column
    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),

    /// Optimistic concurrency check failed
    #[error("version conflict on table '{table}': expected {expected}, found {found}")]
    VersionConflict {
        table: String,
        expected: i64,
        found: i64,
    },
}

/// Identifiers are interpolated into DDL and PRAGMA statements, so they are
/// restricted to `[A-Za-z_][A-Za-z0-9_]*` with a modest length cap.
pub fn validate_identifier(name: &str) -> Result<(), DbError> {
    let mut chars = name.chars();
    let valid_first = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_first && valid_rest && name.len() <= 64 {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_validation() {
        assert!(validate_identifier("revenue").is_ok());
        assert!(validate_identifier("balance_sheet").is_ok());
        assert!(validate_identifier("_table_versions").is_ok());
        assert!(validate_identifier("col2").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2col").is_err());
        assert!(validate_identifier("bad name").is_err());
        assert!(validate_identifier("a;DROP TABLE x").is_err());
        assert!(validate_identifier("quoted\"name").is_err());
        assert!(validate_identifier(&"x".repeat(65)).is_err());
    }
}
