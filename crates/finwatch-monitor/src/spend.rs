//! Spend aggregation over expense snapshots

use chrono::NaiveDate;
use finwatch_types::Expense;
use rust_decimal::Decimal;

use crate::error::{RuleError, RuleResult};

/// Sum of `amount` over expenses dated within `[start, end]` (inclusive).
///
/// Records with a missing or malformed date are skipped. A total outside the
/// decimal range is an error.
pub fn sum_in_range(expenses: &[Expense], start: NaiveDate, end: NaiveDate) -> RuleResult<Decimal> {
    expenses
        .iter()
        .filter_map(|e| e.parsed_date().map(|date| (date, e.amount)))
        .filter(|(date, _)| start <= *date && *date <= end)
        .try_fold(Decimal::ZERO, |total, (_, amount)| {
            total
                .checked_add(amount)
                .ok_or(RuleError::Overflow("spend total"))
        })
}
