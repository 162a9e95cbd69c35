use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, JsonValue, Statement,
    TransactionTrait, Value,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use super::{validate_identifier, DbError};

const ALLOWED_COLUMN_TYPES: [&str; 5] = ["TEXT", "INTEGER", "REAL", "NUMERIC", "BLOB"];

/// A column as reported by the database.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared SQLite type
    pub sql_type: String,
    /// Whether the column holds numbers and can be charted
    pub numeric: bool,
}

/// A column as declared by a table replacement payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// SQLite type (TEXT, INTEGER, REAL, NUMERIC or BLOB)
    pub sql_type: String,
}

/// Full contents of one table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableData {
    /// Table name
    pub name: String,
    /// Column metadata in declaration order
    pub columns: Vec<ColumnInfo>,
    /// Rows as JSON objects keyed by column name
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<JsonValue>,
    /// Version stamp, incremented on every replacement
    pub version: i64,
}

/// One point of a chart series.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SeriesPoint {
    /// Date value when the table has a `date` column, row position otherwise
    pub label: String,
    /// Numeric cell value
    pub value: f64,
}

fn is_numeric_type(sql_type: &str) -> bool {
    let ty = sql_type.to_uppercase();
    ty.contains("INT")
        || ty.contains("REAL")
        || ty.contains("FLOA")
        || ty.contains("DOUB")
        || ty.contains("NUMERIC")
        || ty.contains("DEC")
}

fn normalize_column_type(sql_type: &str) -> Result<String, DbError> {
    let ty = sql_type.trim().to_uppercase();
    if ALLOWED_COLUMN_TYPES.contains(&ty.as_str()) {
        Ok(ty)
    } else {
        Err(DbError::UnsupportedColumnType(sql_type.to_string()))
    }
}

/// Convert a JSON cell into a bindable database value.
fn bind_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::String(None),
        JsonValue::Bool(b) => (*b).into(),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(f) = n.as_f64() {
                f.into()
            } else {
                Value::String(None)
            }
        }
        JsonValue::String(s) => s.clone().into(),
        other => other.to_string().into(),
    }
}

/// Names of all user tables, excluding SQLite internals and the version
/// bookkeeping table.
pub async fn existing_tables<C: ConnectionTrait>(db: &C) -> Result<Vec<String>, DbError> {
    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            "SELECT name FROM sqlite_master WHERE type = 'table' \
             AND name NOT LIKE 'sqlite_%' AND name != '_table_versions' ORDER BY name"
                .to_string(),
        ))
        .await?;
    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        names.push(row.try_get::<String>("", "name")?);
    }
    Ok(names)
}

pub async fn table_exists<C: ConnectionTrait>(db: &C, table: &str) -> Result<bool, DbError> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT count(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?",
            [table.into()],
        ))
        .await?;
    let count: i64 = match row {
        Some(row) => row.try_get("", "n")?,
        None => 0,
    };
    Ok(count > 0)
}

/// Column metadata via `PRAGMA table_info`. Errors with `TableNotFound` when
/// the table does not exist.
pub async fn columns_of<C: ConnectionTrait>(
    db: &C,
    table: &str,
) -> Result<Vec<ColumnInfo>, DbError> {
    validate_identifier(table)?;
    let rows = db
        .query_all(Statement::from_string(
            DbBackend::Sqlite,
            format!("PRAGMA table_info(\"{table}\")"),
        ))
        .await?;
    if rows.is_empty() {
        return Err(DbError::TableNotFound(table.to_string()));
    }
    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get("", "name")?;
        let sql_type: String = row.try_get("", "type")?;
        let numeric = is_numeric_type(&sql_type);
        columns.push(ColumnInfo {
            name,
            sql_type,
            numeric,
        });
    }
    Ok(columns)
}

/// Current version stamp of a table. Tables without a recorded stamp start
/// at 1.
pub async fn table_version<C: ConnectionTrait>(db: &C, table: &str) -> Result<i64, DbError> {
    let row = db
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT version FROM _table_versions WHERE name = ?",
            [table.into()],
        ))
        .await?;
    match row {
        Some(row) => Ok(row.try_get("", "version")?),
        None => Ok(1),
    }
}

/// Load the full contents of a table.
pub async fn read_table<C: ConnectionTrait>(db: &C, table: &str) -> Result<TableData, DbError> {
    validate_identifier(table)?;
    let columns = columns_of(db, table).await?;
    let rows = JsonValue::find_by_statement(Statement::from_string(
        DbBackend::Sqlite,
        format!("SELECT * FROM \"{table}\""),
    ))
    .all(db)
    .await?;
    let version = table_version(db, table).await?;
    debug!("read {} rows from table '{}'", rows.len(), table);
    Ok(TableData {
        name: table.to_string(),
        columns,
        rows,
        version,
    })
}

/// Chart series for one numeric column, indexed by the `date` column when
/// present and by row position otherwise.
pub async fn column_series<C: ConnectionTrait>(
    db: &C,
    table: &str,
    column: &str,
) -> Result<Vec<SeriesPoint>, DbError> {
    let data = read_table(db, table).await?;
    let info = data
        .columns
        .iter()
        .find(|c| c.name == column)
        .ok_or_else(|| DbError::ColumnNotFound(column.to_string()))?;
    if !info.numeric {
        return Err(DbError::NonNumericColumn(column.to_string()));
    }
    let has_date = data.columns.iter().any(|c| c.name == "date");

    let mut points = Vec::with_capacity(data.rows.len());
    for (idx, row) in data.rows.iter().enumerate() {
        let Some(value) = row.get(column).and_then(|v| v.as_f64()) else {
            continue;
        };
        let label = if has_date {
            match row.get("date") {
                Some(JsonValue::String(s)) => s.clone(),
                Some(JsonValue::Null) | None => idx.to_string(),
                Some(other) => other.to_string(),
            }
        } else {
            idx.to_string()
        };
        points.push(SeriesPoint { label, value });
    }
    Ok(points)
}

/// Replace the whole table with the supplied columns and rows, inside one
/// transaction: drop, recreate, insert, bump the version stamp.
///
/// When `expected_version` is given and does not match the stored stamp the
/// replacement is rejected with `VersionConflict` and nothing is written.
/// When it is omitted the last save wins.
pub async fn replace_table(
    db: &DatabaseConnection,
    table: &str,
    columns: &[ColumnSpec],
    rows: &[JsonValue],
    expected_version: Option<i64>,
) -> Result<i64, DbError> {
    validate_identifier(table)?;
    if columns.is_empty() {
        return Err(DbError::NoColumns);
    }
    let mut column_defs = Vec::with_capacity(columns.len());
    let mut column_names = Vec::with_capacity(columns.len());
    for column in columns {
        validate_identifier(&column.name)?;
        let ty = normalize_column_type(&column.sql_type)?;
        column_defs.push(format!("\"{}\" {}", column.name, ty));
        column_names.push(column.name.clone());
    }

    let txn = db.begin().await?;

    if !table_exists(&txn, table).await? {
        return Err(DbError::TableNotFound(table.to_string()));
    }
    let found = table_version(&txn, table).await?;
    if let Some(expected) = expected_version {
        if expected != found {
            return Err(DbError::VersionConflict {
                table: table.to_string(),
                expected,
                found,
            });
        }
    }

    txn.execute(Statement::from_string(
        DbBackend::Sqlite,
        format!("DROP TABLE IF EXISTS \"{table}\""),
    ))
    .await?;
    txn.execute(Statement::from_string(
        DbBackend::Sqlite,
        format!("CREATE TABLE \"{table}\" ({})", column_defs.join(", ")),
    ))
    .await?;

    let quoted: Vec<String> = column_names.iter().map(|n| format!("\"{n}\"")).collect();
    let placeholders: Vec<&str> = std::iter::repeat("?").take(columns.len()).collect();
    let insert_sql = format!(
        "INSERT INTO \"{table}\" ({}) VALUES ({})",
        quoted.join(", "),
        placeholders.join(", ")
    );
    for row in rows {
        let values: Vec<Value> = column_names
            .iter()
            .map(|name| bind_value(row.get(name).unwrap_or(&JsonValue::Null)))
            .collect();
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            insert_sql.as_str(),
            values,
        ))
        .await?;
    }

    let next = found + 1;
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "INSERT INTO _table_versions (name, version) VALUES (?, ?) \
         ON CONFLICT(name) DO UPDATE SET version = excluded.version",
        [table.into(), next.into()],
    ))
    .await?;

    txn.commit().await?;
    debug!("replaced table '{}' with {} rows, version {}", table, rows.len(), next);
    Ok(next)
}
