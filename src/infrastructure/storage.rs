use crate::infrastructure::error::PlannerError;
use rusqlite::Connection;
use std::path::Path;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub fn initialize_database(path: &Path) -> Result<(), PlannerError> {
    let connection = Connection::open(path)?;
    connection.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

pub(crate) fn date_column(value: chrono::NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub(crate) fn minutes_column(value: i64, column: &str) -> Result<u32, PlannerError> {
    u32::try_from(value)
        .map_err(|_| PlannerError::Persistence(format!("invalid {column} value in database: {value}")))
}
