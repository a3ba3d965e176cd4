//! Repositories for data access
//!
//! One repository per entity family. Every write is a single statement:
//! `INSERT ... RETURNING` or a collapse-patch `UPDATE ... RETURNING`, wrapped
//! in a CTE when the caller needs the joined projection back. Storage errors
//! pass through [`constraint::translate`] so uniqueness, reference and check
//! violations surface as domain errors.

mod batch;
mod catalog;
mod drug;
mod registration;


pub use batch::BatchRepository;
pub use catalog::{
    AuthorityHolders, CatalogKind, CatalogRepository, DosageForms, Ingredients, ManufacturingSites,
    MarketingAuthorizations, RoutesOfAdmin, StrengthUnits,
};
pub use drug::DrugRepository;
pub use registration::RegistrationRepository;

use crate::db::constraint;
use crate::db::models::Normalize;
use crate::errors::Result;
use crate::patch::{collapse, collapse_text};
use crate::validation::ValidationEngine;
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement, Value};

/// Postgres statement from SQL and positional values
pub(crate) fn statement<I>(sql: impl Into<String>, values: I) -> Statement
where
    I: IntoIterator<Item = Value>,
{
    Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
}

/// `INSERT INTO table (cols...) VALUES ($1, ...)` followed by `returning`.
pub(crate) fn insert_sql(table: &str, columns: &[&str], returning: &str) -> String {
    let placeholders = (1..=columns.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {table} ({})\nVALUES ({placeholders})\n{returning}",
        columns.join(", ")
    )
}

/// Collapse-patch UPDATE: `$1` is the row id, `$2..` bind the columns in
/// order, and a NULL bind keeps the stored value.
pub(crate) fn patch_sql(table: &str, columns: &[&str], returning: &str) -> String {
    let sets = columns
        .iter()
        .enumerate()
        .map(|(i, col)| format!("{col} = COALESCE(${}, {col})", i + 2))
        .collect::<Vec<_>>()
        .join(",\n       ");
    format!("UPDATE {table}\n   SET {sets},\n       updated_at = now()\n WHERE id = $1\n{returning}")
}

/// Patch text bind: blank collapses to NULL.
pub(crate) fn opt_text(value: &str) -> Value {
    collapse_text(value).into()
}

/// Patch id bind: `0` collapses to NULL.
pub(crate) fn opt_id(value: i64) -> Value {
    collapse(&value).into()
}

/// Normalize then validate a payload.
pub(crate) fn prepare<T: Normalize + 'static>(validator: &ValidationEngine, mut value: T) -> Result<T> {
    value.normalize();
    validator.validate(&value)?;
    Ok(value)
}

pub(crate) async fn fetch_one<T: FromQueryResult>(
    conn: &DatabaseConnection,
    stmt: Statement,
) -> Result<Option<T>> {
    T::find_by_statement(stmt)
        .one(conn)
        .await
        .map_err(constraint::translate)
}

pub(crate) async fn fetch_all<T: FromQueryResult>(
    conn: &DatabaseConnection,
    stmt: Statement,
) -> Result<Vec<T>> {
    T::find_by_statement(stmt)
        .all(conn)
        .await
        .map_err(constraint::translate)
}
