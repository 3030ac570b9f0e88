//! Request handlers for the expense collection.

mod expenses;

pub use expenses::*;
