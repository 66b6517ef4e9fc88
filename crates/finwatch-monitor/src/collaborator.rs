//! External collaborators of the monitor
//!
//! The monitor reads snapshots from a [`DataSource`] and delivers alerts to a
//! [`Notifier`]. Both are I/O boundaries; the HTTP implementations live in
//! `finwatch-client`. The in-memory versions here back tests and dry runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use finwatch_types::{Account, AlertEvent, Expense};
use parking_lot::RwLock;

use crate::error::{CollaboratorError, CollaboratorResult};

/// Read side of the finance API
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch all linked accounts
    async fn accounts(&self) -> CollaboratorResult<Vec<Account>>;

    /// Fetch all expense records
    async fn expenses(&self) -> CollaboratorResult<Vec<Expense>>;

    /// Get source name
    fn name(&self) -> &str;
}

/// Write side of the finance API
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a single alert
    async fn send(&self, alert: &AlertEvent) -> CollaboratorResult<()>;

    /// Get notifier name
    fn name(&self) -> &str;
}

#[async_trait::async_trait]
impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    async fn accounts(&self) -> CollaboratorResult<Vec<Account>> {
        (**self).accounts().await
    }

    async fn expenses(&self) -> CollaboratorResult<Vec<Expense>> {
        (**self).expenses().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait::async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn send(&self, alert: &AlertEvent) -> CollaboratorResult<()> {
        (**self).send(alert).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// In-memory data source for testing
pub struct InMemoryDataSource {
    name: String,
    accounts: RwLock<Vec<Account>>,
    expenses: RwLock<Vec<Expense>>,
    unavailable: AtomicBool,
}

impl InMemoryDataSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accounts: RwLock::new(Vec::new()),
            expenses: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_accounts(&self, accounts: Vec<Account>) {
        *self.accounts.write() = accounts;
    }

    pub fn set_expenses(&self, expenses: Vec<Expense>) {
        *self.expenses.write() = expenses;
    }

    /// Make every fetch fail until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> CollaboratorResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable(self.name.clone()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DataSource for InMemoryDataSource {
    async fn accounts(&self) -> CollaboratorResult<Vec<Account>> {
        self.check_available()?;
        Ok(self.accounts.read().clone())
    }

    async fn expenses(&self) -> CollaboratorResult<Vec<Expense>> {
        self.check_available()?;
        Ok(self.expenses.read().clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// In-memory notifier for testing
pub struct InMemoryNotifier {
    name: String,
    notifications: RwLock<Vec<AlertEvent>>,
    rejecting: AtomicBool,
}

impl InMemoryNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notifications: RwLock::new(Vec::new()),
            rejecting: AtomicBool::new(false),
        }
    }

    pub fn get_notifications(&self) -> Vec<AlertEvent> {
        self.notifications.read().clone()
    }

    /// Reject every delivery until switched back
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, alert: &AlertEvent) -> CollaboratorResult<()> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Status {
                status: 503,
                body: format!("{} rejected {}", self.name, alert.kind),
            });
        }
        self.notifications.write().push(alert.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
