//! Expense handlers - validation and persistence for the collection endpoints.

use crate::db;
use crate::error::{AppError, Result};
use serde::Serialize;
use sqlx::PgPool;
use tally_engine::{normalize_amount, validate_expense, Expense};

/// Response for a bulk replace.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceResponse {
    /// Number of expenses now stored
    pub count: usize,
}

/// Validate an incoming expense and normalize its amount.
pub fn prepare(expense: &Expense) -> Result<Expense> {
    validate_expense(expense)?;
    Ok(normalize_amount(expense)?)
}

/// Make sure the path id and the body id agree.
pub fn check_id(path_id: &str, expense: &Expense) -> Result<()> {
    if path_id != expense.id {
        return Err(AppError::BadRequest(format!(
            "path id '{}' does not match body id '{}'",
            path_id, expense.id
        )));
    }
    Ok(())
}

/// Return every expense.
pub async fn handle_list(pool: &PgPool) -> Result<Vec<Expense>> {
    Ok(db::list_expenses(pool).await?)
}

/// Replace the whole collection. Nothing is written if any expense is invalid.
pub async fn handle_replace_all(pool: &PgPool, expenses: Vec<Expense>) -> Result<ReplaceResponse> {
    let prepared = expenses.iter().map(prepare).collect::<Result<Vec<_>>>()?;

    db::replace_expenses(pool, &prepared).await?;
    tracing::info!(count = prepared.len(), "Replaced expense collection");

    Ok(ReplaceResponse {
        count: prepared.len(),
    })
}

/// Store an expense under its id.
pub async fn handle_create(pool: &PgPool, expense: Expense) -> Result<Expense> {
    let expense = prepare(&expense)?;
    db::upsert_expense(pool, &expense).await?;
    tracing::debug!(id = %expense.id, "Stored expense");
    Ok(expense)
}

/// Merge an expense into the stored copy.
pub async fn handle_update(pool: &PgPool, id: &str, expense: Expense) -> Result<Expense> {
    check_id(id, &expense)?;
    let expense = prepare(&expense)?;
    let merged = db::merge_expense(pool, &expense).await?;
    tracing::debug!(id = %merged.id, "Updated expense");
    Ok(merged)
}

/// Delete an expense. Deleting a missing id succeeds.
pub async fn handle_remove(pool: &PgPool, id: &str) -> Result<()> {
    if !db::delete_expense(pool, id).await? {
        tracing::debug!(id, "Delete for unknown expense");
    }
    Ok(())
}
