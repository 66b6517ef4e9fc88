//! Alert payloads and dedupe keys

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::DATE_FORMAT;

/// Alert kinds produced by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Rent falls due on the 1st within the warning window
    RentDueSoon,
    /// A payday (1st or 15th) is coming up
    PayrollIncoming,
    /// Month-to-date spend exceeds all of last month
    SpendUpMonthOverMonth,
}

impl AlertKind {
    /// Name used in the alert payload
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::RentDueSoon => "rent_due_soon",
            AlertKind::PayrollIncoming => "payroll_incoming",
            AlertKind::SpendUpMonthOverMonth => "spend_up_month_over_month",
        }
    }

    /// Namespace of this kind's dedupe keys.
    ///
    /// Differs from `as_str` for the spend rule; both names are stable.
    pub fn dedupe_namespace(&self) -> &'static str {
        match self {
            AlertKind::RentDueSoon => "rent_due_soon",
            AlertKind::PayrollIncoming => "payroll_incoming",
            AlertKind::SpendUpMonthOverMonth => "spend_up_mom",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Identity of one logical alert occurrence.
///
/// The same occurrence (e.g. "rent due 2024-06-01") always produces the same
/// key, and keys of different kinds never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey {
    kind: AlertKind,
    occurrence: String,
}

impl DedupeKey {
    pub fn new(kind: AlertKind, occurrence: impl Into<String>) -> Self {
        Self {
            kind,
            occurrence: occurrence.into(),
        }
    }

    /// Key for an occurrence identified by a calendar date
    pub fn for_date(kind: AlertKind, date: NaiveDate) -> Self {
        Self::new(kind, date.format(DATE_FORMAT).to_string())
    }

    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    pub fn occurrence(&self) -> &str {
        &self.occurrence
    }

    /// `(namespace, occurrence)` pair
    pub fn as_tuple(&self) -> (&'static str, &str) {
        (self.kind.dedupe_namespace(), &self.occurrence)
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.dedupe_namespace(), self.occurrence)
    }
}

/// Alert submitted to the notifier.
///
/// Immutable once built; delivered at most once per process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Related transaction, sent as `txn_id` (empty when absent)
    #[serde(rename = "txn_id", with = "txn_ref", default)]
    pub transaction_reference: Option<String>,
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
    /// Signed amount; outflows are negative
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl AlertEvent {
    /// Create an alert with zero amount and balance
    pub fn new(kind: AlertKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            transaction_reference: None,
            kind,
            message: message.into(),
            severity,
            amount: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Set the signed amount
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    /// Set the balance
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    /// Attach a transaction reference
    pub fn with_transaction_reference(mut self, reference: impl Into<String>) -> Self {
        self.transaction_reference = Some(reference.into());
        self
    }
}

mod txn_ref {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.filter(|s| !s.is_empty()))
    }
}
