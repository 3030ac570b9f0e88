use super::{merge_into, RemoteStore};
use crate::error::RemoteError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tally_engine::{sort_by_date_desc, validate_expense, Expense, ExpenseId};
use tokio::sync::Mutex;

/// A call received by [`MemoryRemoteStore`], successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    List,
    ReplaceAll(usize),
    Create(ExpenseId),
    Update(ExpenseId),
    Remove(ExpenseId),
}

/// In-process remote store.
///
/// Validates writes the way the server does and can be switched offline,
/// told to fail the next calls, or slowed down to exercise timeouts.
#[derive(Debug)]
pub struct MemoryRemoteStore {
    expenses: Mutex<HashMap<ExpenseId, Expense>>,
    calls: Mutex<Vec<RemoteCall>>,
    online: AtomicBool,
    fail_next: AtomicUsize,
    latency: Mutex<Option<Duration>>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self {
            expenses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            online: AtomicBool::new(true),
            fail_next: AtomicUsize::new(0),
            latency: Mutex::new(None),
        }
    }
}

impl MemoryRemoteStore {
    /// Create an empty, reachable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `expenses`.
    pub async fn with_expenses(expenses: impl IntoIterator<Item = Expense>) -> Self {
        let store = Self::new();
        store.seed(expenses).await;
        store
    }

    /// Insert expenses directly, bypassing validation and the call log.
    pub async fn seed(&self, expenses: impl IntoIterator<Item = Expense>) {
        let mut stored = self.expenses.lock().await;
        for expense in expenses {
            stored.insert(expense.id.clone(), expense);
        }
    }

    /// Make the store reachable or not.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Fail the next `count` calls with [`RemoteError::Unavailable`].
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().await = latency;
    }

    /// Stored expense by id.
    pub async fn get(&self, id: &str) -> Option<Expense> {
        self.expenses.lock().await.get(id).cloned()
    }

    /// Every stored expense, date descending.
    pub async fn snapshot(&self) -> Vec<Expense> {
        let mut expenses: Vec<_> = self.expenses.lock().await.values().cloned().collect();
        expenses.sort_by(|a, b| a.id.cmp(&b.id));
        sort_by_date_desc(&mut expenses);
        expenses
    }

    /// Calls received so far, oldest first.
    pub async fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().await.clone()
    }

    /// Forget the call log.
    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn begin(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let latency = *self.latency.lock().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.calls.lock().await.push(call);

        if !self.online.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("remote store offline".into()));
        }

        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(RemoteError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn list(&self) -> Result<Vec<Expense>, RemoteError> {
        self.begin(RemoteCall::List).await?;
        Ok(self.snapshot().await)
    }

    async fn replace_all(&self, expenses: &[Expense]) -> Result<(), RemoteError> {
        self.begin(RemoteCall::ReplaceAll(expenses.len())).await?;
        for expense in expenses {
            validate_expense(expense)?;
        }

        let mut stored = self.expenses.lock().await;
        stored.clear();
        for expense in expenses {
            stored.insert(expense.id.clone(), expense.clone());
        }
        Ok(())
    }

    async fn create(&self, expense: &Expense) -> Result<(), RemoteError> {
        self.begin(RemoteCall::Create(expense.id.clone())).await?;
        validate_expense(expense)?;

        self.expenses
            .lock()
            .await
            .insert(expense.id.clone(), expense.clone());
        Ok(())
    }

    async fn update(&self, expense: &Expense) -> Result<(), RemoteError> {
        self.begin(RemoteCall::Update(expense.id.clone())).await?;
        validate_expense(expense)?;

        let mut stored = self.expenses.lock().await;
        match stored.get_mut(&expense.id) {
            Some(existing) => merge_into(existing, expense),
            None => {
                stored.insert(expense.id.clone(), expense.clone());
            }
        }
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), RemoteError> {
        self.begin(RemoteCall::Remove(id.to_string())).await?;
        self.expenses.lock().await.remove(id);
        Ok(())
    }
}
