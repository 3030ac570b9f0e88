//! Database operations for the expenses table.

use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tally_engine::Expense;

/// A stored expense row from the database.
#[derive(Debug)]
pub struct StoredExpense {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub date: String,
    pub category: Option<String>,
    pub note: Option<String>,
    pub payment_method: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredExpense {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredExpense {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            amount: row.try_get("amount")?,
            date: row.try_get("date")?,
            category: row.try_get("category")?,
            note: row.try_get("note")?,
            payment_method: row.try_get("payment_method")?,
        })
    }
}

impl From<StoredExpense> for Expense {
    fn from(row: StoredExpense) -> Self {
        Expense {
            id: row.id,
            title: row.title,
            amount: row.amount,
            date: row.date,
            category: row.category,
            note: row.note,
            payment_method: row.payment_method,
        }
    }
}

const SELECT_COLUMNS: &str = "id, title, amount, date, category, note, payment_method";

/// All expenses, newest date first.
pub async fn list_expenses(pool: &PgPool) -> Result<Vec<Expense>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StoredExpense>(&format!(
        "SELECT {} FROM expenses ORDER BY date DESC, id",
        SELECT_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Expense::from).collect())
}

/// Replace the whole collection in one transaction.
pub async fn replace_expenses(pool: &PgPool, expenses: &[Expense]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM expenses").execute(&mut *tx).await?;
    for expense in expenses {
        upsert_in(&mut tx, expense).await?;
    }

    tx.commit().await
}

/// Insert an expense or overwrite every field of an existing one.
pub async fn upsert_expense(pool: &PgPool, expense: &Expense) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    upsert_in(&mut tx, expense).await?;
    tx.commit().await
}

async fn upsert_in(
    tx: &mut Transaction<'_, Postgres>,
    expense: &Expense,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO expenses (
            id, title, amount, date, category, note, payment_method, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE SET
            title = EXCLUDED.title,
            amount = EXCLUDED.amount,
            date = EXCLUDED.date,
            category = EXCLUDED.category,
            note = EXCLUDED.note,
            payment_method = EXCLUDED.payment_method,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(&expense.id)
    .bind(&expense.title)
    .bind(expense.amount)
    .bind(&expense.date)
    .bind(&expense.category)
    .bind(&expense.note)
    .bind(&expense.payment_method)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Merge an expense into the stored one and return the result.
///
/// Required fields are overwritten; optional fields that are `None` keep the
/// stored value. A missing row is inserted.
pub async fn merge_expense(pool: &PgPool, expense: &Expense) -> Result<Expense, sqlx::Error> {
    let row = sqlx::query_as::<_, StoredExpense>(&format!(
        r#"
        INSERT INTO expenses (
            id, title, amount, date, category, note, payment_method, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE SET
            title = EXCLUDED.title,
            amount = EXCLUDED.amount,
            date = EXCLUDED.date,
            category = COALESCE(EXCLUDED.category, expenses.category),
            note = COALESCE(EXCLUDED.note, expenses.note),
            payment_method = COALESCE(EXCLUDED.payment_method, expenses.payment_method),
            updated_at = EXCLUDED.updated_at
        RETURNING {}
        "#,
        SELECT_COLUMNS
    ))
    .bind(&expense.id)
    .bind(&expense.title)
    .bind(expense.amount)
    .bind(&expense.date)
    .bind(&expense.category)
    .bind(&expense.note)
    .bind(&expense.payment_method)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Delete an expense. Returns whether a row was removed.
pub async fn delete_expense(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
