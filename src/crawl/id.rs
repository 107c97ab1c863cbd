//! Identifier types for users and tweets.
//!
//! The remote API encodes identifiers as decimal strings because they exceed
//! the integer precision of a double. Ordering therefore has to treat them as
//! arbitrary-precision integers, never as floats.

use core::cmp::Ordering;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Compare two non-negative decimal-string integers with arbitrary precision.
///
/// After stripping leading zeros, a longer number is larger; equal lengths
/// fall back to lexicographic comparison.
fn decimal_cmp(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Stable opaque key for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single tweet.
///
/// Tweet ids are ordered, since max-id pagination walks a timeline from the
/// newest id downward. Ids arrive from the API in canonical form (no leading
/// zeros), which keeps the derived equality consistent with the ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TweetId(String);

impl TweetId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TweetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialOrd for TweetId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TweetId {
    fn cmp(&self, other: &Self) -> Ordering {
        decimal_cmp(&self.0, &other.0)
    }
}
