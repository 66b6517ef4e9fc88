//! finwatch Monitor - Alert rules, dedupe and the poll loop
//!
//! Each pass pulls a snapshot of accounts and expenses from a [`DataSource`],
//! runs the built-in rules against it, drops occurrences already in the
//! [`DedupeStore`], and hands the rest to a [`Notifier`].
//!
//! ```text
//! tick -> DataSource -> RuleEvaluator -> DedupeStore -> Notifier
//! ```
//!
//! # Example
//!
//! ```ignore
//! use finwatch_monitor::{InMemoryDataSource, InMemoryNotifier, Monitor, MonitorConfig};
//!
//! let mut monitor = Monitor::new(source, notifier, MonitorConfig::default());
//!
//! // One pass, as of now
//! let report = monitor.run_pass().await?;
//!
//! // Or poll every 10 seconds until shutdown
//! monitor.run_until(shutdown_signal()).await;
//! ```

pub mod collaborator;
pub mod dedupe;
pub mod error;
pub mod evaluator;
pub mod monitor;
pub mod rules;
pub mod spend;
pub mod time;

pub use collaborator::{DataSource, InMemoryDataSource, InMemoryNotifier, Notifier};
pub use dedupe::DedupeStore;
pub use error::{CollaboratorError, CollaboratorResult, PassError, PassResult, RuleError, RuleResult};
pub use evaluator::{Evaluation, RuleEvaluator};
pub use monitor::{Monitor, MonitorConfig, PassReport, DEFAULT_IO_TIMEOUT, POLL_INTERVAL};
pub use rules::{Firing, Rule, Snapshot};
pub use spend::sum_in_range;

// Re-export core types
pub use finwatch_types::{Account, AlertEvent, AlertKind, DedupeKey, Expense, Severity};
