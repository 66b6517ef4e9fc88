//! Poll loop
//!
//! The monitor alternates between two states: idle until the next tick, then
//! one evaluation pass (fetch -> evaluate -> deliver). Passes never overlap;
//! a slow pass pushes the next tick back. Any pass failure is logged and the
//! next tick starts over from a fresh snapshot.

use std::future::Future;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::collaborator::{DataSource, Notifier};
use crate::dedupe::DedupeStore;
use crate::error::{CollaboratorResult, PassError, PassResult};
use crate::evaluator::RuleEvaluator;
use crate::rules::Snapshot;

/// Time between pass starts
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Upper bound on each collaborator call
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between pass starts
    pub poll_interval: Duration,
    /// Timeout applied to each fetch and each delivery
    pub io_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

/// Summary of a completed pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub accounts: usize,
    pub expenses: usize,
    /// Alerts accepted by the evaluator
    pub fired: usize,
    /// Alerts the notifier acknowledged
    pub delivered: usize,
}

pub struct Monitor<S, N> {
    source: S,
    notifier: N,
    evaluator: RuleEvaluator,
    store: DedupeStore,
    config: MonitorConfig,
}

impl<S: DataSource, N: Notifier> Monitor<S, N> {
    /// Create a monitor with all built-in rules and an empty dedupe store
    pub fn new(source: S, notifier: N, config: MonitorConfig) -> Self {
        Self {
            source,
            notifier,
            evaluator: RuleEvaluator::new(),
            store: DedupeStore::new(),
            config,
        }
    }

    /// Replace the rule set
    pub fn with_evaluator(mut self, evaluator: RuleEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Start from a pre-populated dedupe store
    pub fn with_store(mut self, store: DedupeStore) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &DedupeStore {
        &self.store
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run one pass at the current UTC time
    pub async fn run_pass(&mut self) -> PassResult<PassReport> {
        self.run_pass_at(Utc::now().naive_utc()).await
    }

    /// Run one pass as if the current time were `now`
    pub async fn run_pass_at(&mut self, now: NaiveDateTime) -> PassResult<PassReport> {
        let snapshot = self.fetch_snapshot().await?;

        let evaluation = self.evaluator.evaluate(now, &snapshot, &mut self.store);

        let mut report = PassReport {
            accounts: snapshot.accounts.len(),
            expenses: snapshot.expenses.len(),
            fired: evaluation.alerts.len(),
            delivered: 0,
        };

        let mut failed = 0;
        for alert in &evaluation.alerts {
            match self.bounded("alert delivery", self.notifier.send(alert)).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        notifier = self.notifier.name(),
                        kind = %alert.kind,
                        error = %e,
                        "Alert delivery failed; occurrence stays recorded"
                    );
                }
            }
        }

        if failed > 0 {
            return Err(PassError::Delivery {
                failed,
                attempted: evaluation.alerts.len(),
                rule_failures: evaluation.failures,
            });
        }
        if !evaluation.failures.is_empty() {
            return Err(PassError::Evaluation(evaluation.failures));
        }

        Ok(report)
    }

    /// Poll forever
    pub async fn run(mut self) {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Poll until `shutdown` resolves. A pass in progress is finished first.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            source = self.source.name(),
            notifier = self.notifier.name(),
            interval_secs = self.config.poll_interval.as_secs(),
            "Monitor started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(fired_total = self.store.len(), "Monitor stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            match self.run_pass().await {
                Ok(report) => info!(
                    accounts = report.accounts,
                    expenses = report.expenses,
                    fired = report.fired,
                    delivered = report.delivered,
                    "Pass complete"
                ),
                Err(e) => error!(error = %e, "Pass failed"),
            }
        }
    }

    async fn fetch_snapshot(&self) -> PassResult<Snapshot> {
        let accounts = self.bounded("accounts", self.source.accounts()).await?;
        let expenses = self.bounded("expenses", self.source.expenses()).await?;
        Ok(Snapshot::new(accounts, expenses))
    }

    /// Apply the I/O timeout to a collaborator call
    async fn bounded<T, F>(&self, what: &'static str, call: F) -> PassResult<T>
    where
        F: Future<Output = CollaboratorResult<T>>,
    {
        match time::timeout(self.config.io_timeout, call).await {
            Ok(result) => result.map_err(|source| PassError::Collaborator { what, source }),
            Err(_) => Err(PassError::Timeout {
                what,
                timeout: self.config.io_timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::NaiveDate;
    use finwatch_types::{Account, AlertKind, Expense};
    use rust_decimal_macros::dec;

    use crate::collaborator::{InMemoryDataSource, InMemoryNotifier};
    use rust_decimal::Decimal;

    use crate::error::{CollaboratorError, RuleError};
    use crate::time::midnight;

    type TestMonitor = Monitor<Arc<InMemoryDataSource>, Arc<InMemoryNotifier>>;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        midnight(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn setup() -> (TestMonitor, Arc<InMemoryDataSource>, Arc<InMemoryNotifier>) {
        let source = Arc::new(InMemoryDataSource::new("memory"));
        source.set_accounts(vec![Account {
            id: "acc_chk".to_string(),
            balance: dec!(2500),
            ..Default::default()
        }]);
        source.set_expenses(vec![
            Expense::new("2024-05-20", dec!(300)),
            Expense::new("2024-06-02", dec!(500)),
        ]);
        let notifier = Arc::new(InMemoryNotifier::new("memory"));
        let monitor = Monitor::new(source.clone(), notifier.clone(), MonitorConfig::default());
        (monitor, source, notifier)
    }

    #[tokio::test]
    async fn test_pass_delivers_due_alerts() {
        let (mut monitor, _source, notifier) = setup();

        let report = monitor.run_pass_at(at(2024, 6, 13)).await.unwrap();

        assert_eq!(
            report,
            PassReport {
                accounts: 1,
                expenses: 2,
                fired: 2,
                delivered: 2,
            }
        );
        let sent = notifier.get_notifications();
        assert_eq!(sent[0].kind, AlertKind::PayrollIncoming);
        assert_eq!(sent[1].kind, AlertKind::SpendUpMonthOverMonth);
        assert_eq!(sent[1].amount, dec!(-200));
    }

    #[tokio::test]
    async fn test_repeated_pass_does_not_refire() {
        let (mut monitor, _source, notifier) = setup();

        monitor.run_pass_at(at(2024, 6, 13)).await.unwrap();
        let report = monitor.run_pass_at(at(2024, 6, 13)).await.unwrap();

        assert_eq!(report.fired, 0);
        assert_eq!(notifier.get_notifications().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_no_state() {
        let (mut monitor, source, notifier) = setup();
        source.set_unavailable(true);

        let err = monitor.run_pass_at(at(2024, 6, 13)).await.unwrap_err();
        assert!(matches!(
            err,
            PassError::Collaborator {
                what: "accounts",
                source: CollaboratorError::Unavailable(_),
            }
        ));
        assert!(monitor.store().is_empty());
        assert!(notifier.get_notifications().is_empty());

        // Next pass starts over with a fresh snapshot
        source.set_unavailable(false);
        let report = monitor.run_pass_at(at(2024, 6, 13)).await.unwrap();
        assert_eq!(report.delivered, 2);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_spends_the_key() {
        let (mut monitor, _source, notifier) = setup();
        notifier.set_rejecting(true);

        let err = monitor.run_pass_at(at(2024, 6, 13)).await.unwrap_err();
        assert!(matches!(
            err,
            PassError::Delivery {
                failed: 2,
                attempted: 2,
                ref rule_failures,
            } if rule_failures.is_empty()
        ));
        assert_eq!(monitor.store().len(), 2);

        notifier.set_rejecting(false);
        let report = monitor.run_pass_at(at(2024, 6, 13)).await.unwrap();
        assert_eq!(report.fired, 0);
        assert!(notifier.get_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_rule_failures_fail_the_pass() {
        let (mut monitor, source, notifier) = setup();
        source.set_expenses(Vec::new());

        let err = monitor
            .run_pass_at(midnight(NaiveDate::MAX))
            .await
            .unwrap_err();

        assert!(matches!(err, PassError::Evaluation(ref failures) if failures.len() == 2));
        assert!(notifier.get_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_spend_fails_only_that_rule() {
        let (mut monitor, source, notifier) = setup();
        source.set_expenses(vec![
            Expense::new("2024-06-02", Decimal::MAX),
            Expense::new("2024-06-05", dec!(1)),
        ]);

        let err = monitor.run_pass_at(at(2024, 6, 13)).await.unwrap_err();

        assert!(matches!(
            err,
            PassError::Evaluation(ref failures)
                if failures == &[RuleError::Overflow("spend total")]
        ));
        // Payroll is unaffected
        let sent = notifier.get_notifications();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, AlertKind::PayrollIncoming);
    }

    #[tokio::test]
    async fn test_delivery_error_carries_rule_failures() {
        let (mut monitor, source, notifier) = setup();
        source.set_expenses(vec![
            Expense::new("2024-06-02", Decimal::MAX),
            Expense::new("2024-06-05", dec!(1)),
        ]);
        notifier.set_rejecting(true);

        let err = monitor.run_pass_at(at(2024, 6, 13)).await.unwrap_err();

        assert!(matches!(
            err,
            PassError::Delivery {
                failed: 1,
                attempted: 1,
                ref rule_failures,
            } if rule_failures == &[RuleError::Overflow("spend total")]
        ));
    }

    #[tokio::test]
    async fn test_undated_expenses_are_skipped() {
        let (mut monitor, source, notifier) = setup();
        let undated = Expense {
            date: None,
            amount: dec!(10000),
            ..Default::default()
        };
        source.set_expenses(vec![
            Expense::new("2024-05-20", dec!(300)),
            undated,
            Expense::new("2024-06-02", dec!(500)),
            Expense::new("02/06/2024", dec!(10000)),
        ]);

        let report = monitor.run_pass_at(at(2024, 6, 13)).await.unwrap();

        assert_eq!(report.expenses, 4);
        assert_eq!(report.delivered, 2);
        assert_eq!(
            notifier.get_notifications()[1].message,
            "Spending is up by $200 vs last month."
        );
    }

    struct StalledSource;

    #[async_trait::async_trait]
    impl DataSource for StalledSource {
        async fn accounts(&self) -> CollaboratorResult<Vec<Account>> {
            std::future::pending().await
        }

        async fn expenses(&self) -> CollaboratorResult<Vec<Expense>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_source_times_out() {
        let notifier = Arc::new(InMemoryNotifier::new("memory"));
        let mut monitor = Monitor::new(StalledSource, notifier, MonitorConfig::default());

        let err = monitor.run_pass_at(at(2024, 5, 27)).await.unwrap_err();

        assert!(matches!(
            err,
            PassError::Timeout {
                what: "accounts",
                timeout,
            } if timeout == DEFAULT_IO_TIMEOUT
        ));
        assert!(monitor.store().is_empty());
    }

    struct CountingSource {
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl DataSource for CountingSource {
        async fn accounts(&self) -> CollaboratorResult<Vec<Account>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn expenses(&self) -> CollaboratorResult<Vec<Expense>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_ticks_every_interval_until_shutdown() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            fetches: fetches.clone(),
        };
        let mut monitor = Monitor::new(
            source,
            Arc::new(InMemoryNotifier::new("memory")),
            MonitorConfig::default(),
        );

        // Ticks at 0s, 10s and 20s
        monitor
            .run_until(time::sleep(Duration::from_secs(25)))
            .await;

        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_failing_passes() {
        let source = Arc::new(InMemoryDataSource::new("memory"));
        source.set_unavailable(true);
        let notifier = Arc::new(InMemoryNotifier::new("memory"));
        let mut monitor = Monitor::new(source.clone(), notifier.clone(), MonitorConfig::default());

        monitor
            .run_until(time::sleep(Duration::from_secs(35)))
            .await;

        assert!(monitor.store().is_empty());
        assert!(notifier.get_notifications().is_empty());
    }
}
