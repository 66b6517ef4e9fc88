//! Expense records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::DATE_FORMAT;

/// A single spend record.
///
/// `date` is kept as the raw wire string. A record whose date is missing,
/// not a string, or does not parse as `YYYY-MM-DD` is skipped by aggregation
/// rather than failing the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Positive spend amount
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<String>,
}

/// Keep string dates; any other JSON value decodes as no date.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Text(String),
        Other(#[allow(dead_code)] IgnoredAny),
    }

    Ok(match Option::<RawDate>::deserialize(deserializer)? {
        Some(RawDate::Text(raw)) => Some(raw),
        Some(RawDate::Other(_)) | None => None,
    })
}

impl Expense {
    /// Create an expense dated `date` (raw string, not validated)
    pub fn new(date: impl Into<String>, amount: Decimal) -> Self {
        Self {
            amount,
            date: Some(date.into()),
            ..Default::default()
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Parsed calendar date, or `None` if missing or malformed
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
    }
}

/// Body of `GET /api/expenses`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpensesResponse {
    #[serde(default)]
    pub expenses: Vec<Expense>,
}
