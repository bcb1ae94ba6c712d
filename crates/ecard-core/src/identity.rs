//! Stable identifiers
//!
//! A child row counts as persisted exactly when its identifier has the
//! canonical UUID text layout. Generation is behind [`IdGenerator`] so the
//! save path can be driven deterministically in tests.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

static STABLE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("stable id pattern is valid")
});

/// Canonical 8-4-4-4-12 hex layout check
#[inline]
#[must_use]
pub fn is_stable_id(candidate: &str) -> bool {
    STABLE_ID.is_match(candidate)
}

/// Same check over an optional id
#[inline]
#[must_use]
pub fn has_stable_id(id: Option<&str>) -> bool {
    id.is_some_and(is_stable_id)
}

/// Source of fresh stable identifiers
pub trait IdGenerator: Send + Sync + Debug {
    /// Produce an identifier in canonical UUID text form
    fn generate(&self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic ids for dry runs and tests
///
/// Yields `00000000-0000-4000-8000-000000000001`, `...002`, and so on.
/// The node field holds 48 bits, so the sequence wraps to `...000` after
/// `...ffffffffffff` and repeats.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `offset`
    #[inline]
    #[must_use]
    pub fn starting_after(offset: u64) -> Self {
        Self {
            next: AtomicU64::new(offset),
        }
    }

    /// Number of ids handed out so far
    #[inline]
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

const NODE_MASK: u64 = 0xffff_ffff_ffff;

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst).wrapping_add(1) & NODE_MASK;
        format!("00000000-0000-4000-8000-{n:012x}")
    }
}
