//! Expense identifier generation.
//!
//! Identifiers are `{millis}-{suffix}`: a per-generator monotonic millisecond
//! timestamp followed by six base-36 characters of caller-supplied entropy.
//! The timestamp keeps ids roughly creation-ordered; the suffix keeps two
//! offline devices that create an expense in the same millisecond apart.

use crate::{ExpenseId, Timestamp};
use serde::{Deserialize, Serialize};

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 6;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Issues expense identifiers.
///
/// The engine does no I/O, so the wall clock reading and the entropy are
/// passed in by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdGenerator {
    /// Millisecond component of the last issued id
    last_millis: Timestamp,
}

impl IdGenerator {
    /// Create a generator that has issued nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Millisecond component of the last issued id.
    pub fn last_millis(&self) -> Timestamp {
        self.last_millis
    }

    /// Issue the next identifier.
    ///
    /// If `now_millis` does not move past the previous id (clock went
    /// backwards, or two ids in the same millisecond) the timestamp is bumped
    /// to `last + 1`.
    pub fn next_id(&mut self, now_millis: Timestamp, entropy: u64) -> ExpenseId {
        let millis = if now_millis > self.last_millis {
            now_millis
        } else {
            self.last_millis + 1
        };
        self.last_millis = millis;

        format!("{}-{}", millis, encode_suffix(entropy))
    }
}

fn encode_suffix(mut entropy: u64) -> String {
    let mut suffix = [b'0'; SUFFIX_LEN];
    for slot in suffix.iter_mut().rev() {
        *slot = ALPHABET[(entropy % 36) as usize];
        entropy /= 36;
    }
    // Only ASCII alphanumerics are written above.
    suffix.iter().map(|b| *b as char).collect()
}

/// Split an identifier into its timestamp and suffix, if it has that shape.
pub fn parse_id(id: &str) -> Option<(Timestamp, &str)> {
    let (millis, suffix) = id.split_once('-')?;
    let millis = millis.parse().ok()?;
    Some((millis, suffix))
}
