//! Expense records.

use crate::ExpenseId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Suggested categories offered by the UI. Categories stay free-form strings.
pub const EXPENSE_CATEGORIES: [&str; 7] = [
    "Food",
    "Housing",
    "Transportation",
    "Bills",
    "Supplies",
    "Labor",
    "Other",
];

/// A single expense.
///
/// The `id` is assigned once at creation and never changes; every other
/// field may be overwritten by an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Globally unique identifier (`{millis}-{suffix}`)
    pub id: ExpenseId,
    /// Short description, must not be empty
    pub title: String,
    /// Amount spent
    #[serde(
        default = "missing_amount",
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub amount: f64,
    /// Calendar date, `YYYY-MM-DD` (lexically sortable)
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// Every expense field except the identifier. Input of a create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub title: String,
    #[serde(
        default = "missing_amount",
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub amount: f64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

impl NewExpense {
    /// Create expense input with the required fields.
    pub fn new(title: impl Into<String>, amount: f64, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            amount,
            date: date.into(),
            category: None,
            note: None,
            payment_method: None,
        }
    }

    /// Builder-style category setter.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder-style note setter.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Builder-style payment method setter.
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

impl Expense {
    /// Create an expense with the required fields.
    pub fn new(
        id: impl Into<ExpenseId>,
        title: impl Into<String>,
        amount: f64,
        date: impl Into<String>,
    ) -> Self {
        Self::from_new(id, NewExpense::new(title, amount, date))
    }

    /// Attach an identifier to creation input.
    pub fn from_new(id: impl Into<ExpenseId>, fields: NewExpense) -> Self {
        Self {
            id: id.into(),
            title: fields.title,
            amount: fields.amount,
            date: fields.date,
            category: fields.category,
            note: fields.note,
            payment_method: fields.payment_method,
        }
    }

    /// Strip the identifier.
    pub fn without_id(&self) -> NewExpense {
        NewExpense {
            title: self.title.clone(),
            amount: self.amount,
            date: self.date.clone(),
            category: self.category.clone(),
            note: self.note.clone(),
            payment_method: self.payment_method.clone(),
        }
    }

    /// Builder-style category setter.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder-style note setter.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Builder-style payment method setter.
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

/// Parse a user-entered amount such as `"1,234.56"` or `"1 234"`.
///
/// Commas and whitespace are stripped. Returns NaN when nothing numeric is left.
pub fn parse_amount_input(value: &str) -> f64 {
    let normalized: String = value
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if normalized.is_empty() {
        return f64::NAN;
    }
    normalized.parse().unwrap_or(f64::NAN)
}

fn missing_amount() -> f64 {
    f64::NAN
}

// Non-finite amounts have no JSON representation; they persist as null and
// come back as NaN.
fn serialize_amount<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.is_finite() {
        serializer.serialize_f64(*amount)
    } else {
        serializer.serialize_none()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw: Option<RawAmount> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawAmount::Number(n)) => n,
        Some(RawAmount::Text(text)) => parse_amount_input(&text),
        None => f64::NAN,
    })
}
