//! Database module for PostgreSQL persistence.

mod expenses;
mod pool;

pub use expenses::*;
pub use pool::*;
