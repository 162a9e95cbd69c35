use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, DbBackend, Statement, Value};
use tracing::{debug, info};

use super::{tables, DbError};

/// Tables auto-generated on first initialization.
pub const SEED_TABLES: [&str; 5] = [
    "revenue",
    "expenses",
    "payroll",
    "forecasts",
    "balance_sheet",
];

/// Bookkeeping table backing the per-table version stamps.
pub const VERSIONS_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS _table_versions (name TEXT PRIMARY KEY, version INTEGER NOT NULL)";

const REVENUE_AMOUNTS: [i64; 12] = [
    10000, 12000, 11000, 13000, 12500, 14000, 15000, 14500, 15500, 16000, 17000, 18000,
];

const EXPENSE_AMOUNTS: [i64; 12] = [
    8000, 8500, 9000, 9200, 8800, 9400, 9800, 10200, 10000, 10500, 11000, 11500,
];

/// Last day of the given month of 2025, formatted as an ISO date.
fn month_end(month: u32) -> String {
    let (next_year, next_month) = if month == 12 {
        (2026, 1)
    } else {
        (2025, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .expect("month in 1..=12")
        .format("%Y-%m-%d")
        .to_string()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

async fn create_and_fill<C: ConnectionTrait>(
    db: &C,
    name: &str,
    create_sql: &str,
    insert_sql: &str,
    rows: Vec<Vec<Value>>,
) -> Result<(), DbError> {
    info!("seeding table '{}' with {} rows", name, rows.len());
    db.execute(Statement::from_string(DbBackend::Sqlite, create_sql.to_string()))
        .await?;
    for row in rows {
        db.execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            insert_sql,
            row,
        ))
        .await?;
    }
    Ok(())
}

async fn seed_one<C: ConnectionTrait>(db: &C, name: &str) -> Result<(), DbError> {
    let dates: Vec<String> = (1..=12).map(month_end).collect();

    match name {
        "revenue" => {
            let rows = (0..12)
                .map(|i| vec![dates[i].clone().into(), REVENUE_AMOUNTS[i].into()])
                .collect();
            create_and_fill(
                db,
                name,
                "CREATE TABLE revenue (date TEXT NOT NULL, amount INTEGER NOT NULL)",
                "INSERT INTO revenue (date, amount) VALUES (?, ?)",
                rows,
            )
            .await
        }
        "expenses" => {
            let rows = (0..12)
                .map(|i| vec![dates[i].clone().into(), EXPENSE_AMOUNTS[i].into()])
                .collect();
            create_and_fill(
                db,
                name,
                "CREATE TABLE expenses (date TEXT NOT NULL, amount INTEGER NOT NULL)",
                "INSERT INTO expenses (date, amount) VALUES (?, ?)",
                rows,
            )
            .await
        }
        "payroll" => {
            // Payroll is half of expenses
            let rows = (0..12)
                .map(|i| {
                    vec![
                        dates[i].clone().into(),
                        round2(EXPENSE_AMOUNTS[i] as f64 * 0.5).into(),
                    ]
                })
                .collect();
            create_and_fill(
                db,
                name,
                "CREATE TABLE payroll (date TEXT NOT NULL, amount REAL NOT NULL)",
                "INSERT INTO payroll (date, amount) VALUES (?, ?)",
                rows,
            )
            .await
        }
        "forecasts" => {
            // Forecasts project revenue up by 10%
            let rows = (0..12)
                .map(|i| {
                    vec![
                        dates[i].clone().into(),
                        round2(REVENUE_AMOUNTS[i] as f64 * 1.1).into(),
                    ]
                })
                .collect();
            create_and_fill(
                db,
                name,
                "CREATE TABLE forecasts (date TEXT NOT NULL, amount REAL NOT NULL)",
                "INSERT INTO forecasts (date, amount) VALUES (?, ?)",
                rows,
            )
            .await
        }
        "balance_sheet" => {
            let rows = (0..12)
                .map(|i| {
                    vec![
                        dates[i].clone().into(),
                        round2(REVENUE_AMOUNTS[i] as f64 * 2.0).into(),
                        round2(EXPENSE_AMOUNTS[i] as f64 * 1.2).into(),
                    ]
                })
                .collect();
            create_and_fill(
                db,
                name,
                "CREATE TABLE balance_sheet (date TEXT NOT NULL, assets REAL NOT NULL, liabilities REAL NOT NULL)",
                "INSERT INTO balance_sheet (date, assets, liabilities) VALUES (?, ?, ?)",
                rows,
            )
            .await
        }
        other => Err(DbError::TableNotFound(other.to_string())),
    }
}

/// Initialize the database: create any of the five seed tables that are
/// missing and register version stamps for them. Tables that already exist
/// are never touched, so re-running is safe at every startup.
pub async fn seed_database<C: ConnectionTrait>(db: &C) -> Result<(), DbError> {
    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        VERSIONS_TABLE_SQL.to_string(),
    ))
    .await?;

    let existing = tables::existing_tables(db).await?;
    for name in SEED_TABLES {
        if existing.iter().any(|t| t == name) {
            debug!("table '{}' already exists, leaving it untouched", name);
        } else {
            seed_one(db, name).await?;
        }
        db.execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "INSERT INTO _table_versions (name, version) VALUES (?, 1) ON CONFLICT(name) DO NOTHING",
            [name.into()],
        ))
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_end_dates_cover_2025() {
        assert_eq!(month_end(1), "2025-01-31");
        assert_eq!(month_end(2), "2025-02-28");
        assert_eq!(month_end(6), "2025-06-30");
        assert_eq!(month_end(12), "2025-12-31");
    }

    #[test]
    fn derived_amounts_round_to_two_decimals() {
        assert_eq!(round2(8500.0 * 0.5), 4250.0);
        assert_eq!(round2(11000.0 * 1.1), 12100.0);
        assert_eq!(round2(9200.0 * 1.2), 11040.0);
    }
}
