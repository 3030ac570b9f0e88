//! Expense validation.
//!
//! Two callers use this module: the queue drain (amount only, a bad amount
//! drops the queued entry) and the remote store service (full check on every
//! write).

use crate::{error::Result, Error, Expense, NewExpense};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format of [`Expense::date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// When the hybrid repository validates writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationPolicy {
    /// Accept any local write; malformed amounts are caught when the queue
    /// drains (default)
    #[default]
    DrainOnly,
    /// Reject invalid create/update input before any store is touched
    Eager,
}

impl std::str::FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drain" | "drain-only" => Ok(ValidationPolicy::DrainOnly),
            "eager" => Ok(ValidationPolicy::Eager),
            other => Err(format!("unknown validation policy: {}", other)),
        }
    }
}

/// Check that an amount is finite and non-negative.
///
/// Returns the normalized amount (negative zero becomes zero).
pub fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount(amount));
    }
    Ok(amount + 0.0)
}

/// Check that a date is a calendar date in `YYYY-MM-DD` form.
pub fn validate_date(date: &str) -> Result<()> {
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| Error::InvalidDate(date.to_string()))
}

/// Validate creation input.
pub fn validate_new_expense(fields: &NewExpense) -> Result<()> {
    if fields.title.trim().is_empty() {
        return Err(Error::MissingRequiredField("title".into()));
    }
    validate_amount(fields.amount)?;
    validate_date(&fields.date)
}

/// Validate a complete expense.
pub fn validate_expense(expense: &Expense) -> Result<()> {
    if expense.id.trim().is_empty() {
        return Err(Error::MissingRequiredField("id".into()));
    }
    validate_new_expense(&expense.without_id())
}

/// Return a copy with a normalized amount, or the amount error.
pub fn normalize_amount(expense: &Expense) -> Result<Expense> {
    let amount = validate_amount(expense.amount)?;
    Ok(Expense {
        amount,
        ..expense.clone()
    })
}
