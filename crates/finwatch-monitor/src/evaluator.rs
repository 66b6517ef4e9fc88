//! Rule evaluator
//!
//! Runs every rule against one snapshot and gates the results through the
//! dedupe store. A key is recorded the moment its alert is accepted, before
//! any delivery attempt, so an occurrence is emitted at most once even if its
//! delivery later fails.

use chrono::NaiveDateTime;
use finwatch_types::AlertEvent;
use tracing::{debug, error, info};

use crate::dedupe::DedupeStore;
use crate::error::RuleError;
use crate::rules::{Rule, Snapshot};

/// Outcome of evaluating all rules once
#[derive(Debug, Default)]
pub struct Evaluation {
    /// Newly due alerts, in rule order
    pub alerts: Vec<AlertEvent>,
    /// Rules that failed; the others still ran
    pub failures: Vec<RuleError>,
}

#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    rules: Vec<Rule>,
}

impl RuleEvaluator {
    /// Evaluator with all built-in rules
    pub fn new() -> Self {
        Self::with_rules(Rule::ALL)
    }

    pub fn with_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn evaluate(
        &self,
        now: NaiveDateTime,
        snapshot: &Snapshot,
        store: &mut DedupeStore,
    ) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for rule in &self.rules {
            match rule.evaluate(now, snapshot) {
                Ok(Some(firing)) => {
                    if store.contains(&firing.key) {
                        debug!(key = %firing.key, "Alert already fired, suppressing");
                        continue;
                    }
                    info!(
                        key = %firing.key,
                        severity = %firing.alert.severity,
                        message = %firing.alert.message,
                        "Alert due"
                    );
                    store.record(firing.key);
                    evaluation.alerts.push(firing.alert);
                }
                Ok(None) => {
                    debug!(kind = %rule.kind(), "Rule quiet");
                }
                Err(e) => {
                    error!(
                        kind = %rule.kind(),
                        now = %now,
                        expenses = snapshot.expenses.len(),
                        error = %e,
                        "Rule evaluation failed"
                    );
                    evaluation.failures.push(e);
                }
            }
        }

        evaluation
    }
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
