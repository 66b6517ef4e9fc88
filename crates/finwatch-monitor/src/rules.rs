//! Alert rules
//!
//! Each rule is a pure function of `(now, snapshot)`. A rule that fires
//! returns a [`Firing`]: the alert plus the key of the occurrence it is
//! about. Whether the alert is actually emitted is decided by the
//! evaluator against the dedupe store.
//!
//! - **Rent due soon**: rent is due on the 1st; warn 1..=5 days ahead
//! - **Payroll incoming**: paydays on the 1st and 15th; warn 1..=3 days ahead
//! - **Spend up month over month**: month-to-date spend exceeds all of last month

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use finwatch_types::{Account, AlertEvent, AlertKind, DedupeKey, Expense, Severity};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{RuleError, RuleResult};
use crate::spend::sum_in_range;
use crate::time::{
    format_date, midnight, next_month_first, previous_month_bounds, start_of_month,
    whole_days_until, ymd,
};

/// Day of month rent falls due
pub const RENT_DUE_DAY: u32 = 1;
/// Rent warning window in days
pub const RENT_WARNING_DAYS: i64 = 5;
/// Days of month payroll lands
pub const PAYDAYS: [u32; 2] = [1, 15];
/// Payroll warning window in days
pub const PAYROLL_WARNING_DAYS: i64 = 3;

/// Accounts and expenses fetched for one pass
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub accounts: Vec<Account>,
    pub expenses: Vec<Expense>,
}

impl Snapshot {
    pub fn new(accounts: Vec<Account>, expenses: Vec<Expense>) -> Self {
        Self { accounts, expenses }
    }
}

/// A rule's verdict that an occurrence is due
#[derive(Debug, Clone, PartialEq)]
pub struct Firing {
    pub key: DedupeKey,
    pub alert: AlertEvent,
}

/// The built-in alert rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    RentDueSoon,
    PayrollIncoming,
    SpendUpMonthOverMonth,
}

impl Rule {
    /// All rules in evaluation order
    pub const ALL: [Rule; 3] = [
        Rule::RentDueSoon,
        Rule::PayrollIncoming,
        Rule::SpendUpMonthOverMonth,
    ];

    pub fn kind(&self) -> AlertKind {
        match self {
            Rule::RentDueSoon => AlertKind::RentDueSoon,
            Rule::PayrollIncoming => AlertKind::PayrollIncoming,
            Rule::SpendUpMonthOverMonth => AlertKind::SpendUpMonthOverMonth,
        }
    }

    /// Evaluate the rule; `Ok(None)` when nothing is due
    pub fn evaluate(&self, now: NaiveDateTime, snapshot: &Snapshot) -> RuleResult<Option<Firing>> {
        match self {
            Rule::RentDueSoon => rent_due_soon(now),
            Rule::PayrollIncoming => payroll_incoming(now),
            Rule::SpendUpMonthOverMonth => spend_up_month_over_month(now, &snapshot.expenses),
        }
    }
}

/// Next rent due date; on the due day itself that is today.
pub fn next_rent_date(today: NaiveDate) -> RuleResult<NaiveDate> {
    if today.day() > RENT_DUE_DAY {
        next_month_first(today)
    } else {
        start_of_month(today)
    }
}

/// Earliest payday whose midnight is not before `now`
pub fn next_payday(now: NaiveDateTime) -> RuleResult<NaiveDate> {
    let today = now.date();
    let mut candidates = Vec::with_capacity(PAYDAYS.len());
    for day in PAYDAYS {
        let payday = ymd(today.year(), today.month(), day)?;
        if midnight(payday) >= now {
            candidates.push(payday);
        }
    }

    match candidates.into_iter().min() {
        Some(payday) => Ok(payday),
        None => next_month_first(today),
    }
}

// The due day itself yields zero days and never alerts.
fn rent_due_soon(now: NaiveDateTime) -> RuleResult<Option<Firing>> {
    let due = next_rent_date(now.date())?;
    let days = whole_days_until(due, now);
    if days <= 0 || days > RENT_WARNING_DAYS {
        return Ok(None);
    }

    let alert = AlertEvent::new(
        AlertKind::RentDueSoon,
        Severity::Medium,
        format!("Rent is due in {} day(s) on {}.", days, format_date(due)),
    );
    Ok(Some(Firing {
        key: DedupeKey::for_date(AlertKind::RentDueSoon, due),
        alert,
    }))
}

fn payroll_incoming(now: NaiveDateTime) -> RuleResult<Option<Firing>> {
    let payday = next_payday(now)?;
    let days = whole_days_until(payday, now);
    if days <= 0 || days > PAYROLL_WARNING_DAYS {
        return Ok(None);
    }

    let alert = AlertEvent::new(
        AlertKind::PayrollIncoming,
        Severity::Low,
        format!("Payroll expected on {}.", format_date(payday)),
    );
    Ok(Some(Firing {
        key: DedupeKey::for_date(AlertKind::PayrollIncoming, payday),
        alert,
    }))
}

fn spend_up_month_over_month(
    now: NaiveDateTime,
    expenses: &[Expense],
) -> RuleResult<Option<Firing>> {
    let today = now.date();
    let month_start = start_of_month(today)?;
    let (prev_start, prev_end) = previous_month_bounds(today)?;

    let this_month = sum_in_range(expenses, month_start, today)?;
    let last_month = sum_in_range(expenses, prev_start, prev_end)?;
    if this_month <= Decimal::ZERO || this_month <= last_month {
        return Ok(None);
    }

    // Refunds can leave last month negative
    let delta = this_month
        .checked_sub(last_month)
        .ok_or(RuleError::Overflow("month-over-month delta"))?;
    let alert = AlertEvent::new(
        AlertKind::SpendUpMonthOverMonth,
        Severity::Medium,
        format!(
            "Spending is up by ${} vs last month.",
            format_whole_amount(delta)
        ),
    )
    .with_amount(-delta);

    Ok(Some(Firing {
        key: DedupeKey::for_date(AlertKind::SpendUpMonthOverMonth, month_start),
        alert,
    }))
}

/// Round to whole units (banker's rounding) and group digits with `,`
pub fn format_whole_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
