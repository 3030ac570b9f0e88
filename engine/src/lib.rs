//! # Tally Engine
//!
//! Deterministic core of the Tally offline-first expense tracker.
//!
//! This crate holds the logic of the sync layer that does not need I/O:
//! the expense model, identifier generation, validation, the sync queue entry
//! type, the local/remote merge, and the snapshot envelope used to persist
//! collections. The async orchestration lives in `tally-client`.
//!
//! ## Design Principles
//!
//! - **No IO**: Engine has no knowledge of files, network, or platform
//! - **Deterministic**: Same inputs always produce same outputs; clock
//!   readings and entropy are passed in
//! - **Testable**: Pure logic, no mocks needed
//!
//! ## Core Concepts
//!
//! ### Expenses
//!
//! An [`Expense`] has an immutable id plus title, amount, date and a few
//! optional fields. [`IdGenerator`] issues `{millis}-{suffix}` ids.
//!
//! ### Sync Queue Entries
//!
//! Mutations that have not reached the remote store are queued as
//! [`SyncEntry`] values (create, update, delete) and replayed in order.
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] merges the local list with the remote list. The remote
//! copy wins unless the id has an outstanding local write:
//! - [`MergeStrategy::PendingLocalWins`] - remote is authoritative except for pending ids (default)
//! - [`MergeStrategy::LocalWins`] - every local record wins
//!
//! ## Quick Start
//!
//! ```rust
//! use tally_engine::{pending_sync_ids, Expense, Reconciler, SyncEntry};
//!
//! let local = vec![Expense::new("2", "Rent (edited)", 1100.0, "2026-01-05")];
//! let remote = vec![
//!     Expense::new("1", "Groceries", 100.0, "2026-01-01"),
//!     Expense::new("2", "Rent", 1000.0, "2026-01-02"),
//! ];
//! let queue = vec![SyncEntry::update(local[0].clone())];
//!
//! let outcome = Reconciler::default().merge(local, remote, &pending_sync_ids(&queue));
//!
//! assert_eq!(outcome.expenses[0].title, "Rent (edited)");
//! assert_eq!(outcome.expenses[1].id, "1");
//! ```
//!
//! ## Persistence
//!
//! Use [`Snapshot::to_json`] and [`Snapshot::from_json`] for persistence.
//! `from_json` also reads the bare JSON arrays older clients wrote.

pub mod error;
pub mod expense;
pub mod id;
pub mod operation;
pub mod reconcile;
pub mod snapshot;
pub mod validation;

// Re-export main types at crate root
pub use error::Error;
pub use expense::{parse_amount_input, Expense, NewExpense, EXPENSE_CATEGORIES};
pub use id::IdGenerator;
pub use operation::{pending_sync_ids, SyncEntry, SyncEntryKind};
pub use reconcile::{sort_by_date_desc, MergeOutcome, MergeStrategy, Reconciler};
pub use snapshot::{Snapshot, SnapshotMetadata, SNAPSHOT_FORMAT_VERSION};
pub use validation::{
    normalize_amount, validate_amount, validate_date, validate_expense, validate_new_expense,
    ValidationPolicy,
};

/// Type aliases for clarity
pub type ExpenseId = String;
pub type Timestamp = u64;
