//! Account records

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A linked account as reported by the balances endpoint.
///
/// No rule inspects accounts beyond their presence; they are read for the
/// current pass and then dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Account type, e.g. "depository"
    #[serde(default, rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub balance: Decimal,
}

/// Body of `GET /api/balances`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalancesResponse {
    #[serde(default)]
    pub accounts: Vec<Account>,
}
