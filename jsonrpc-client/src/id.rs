//! Generation of request ids.
//!
//! The client never makes up ids itself; it asks an [`IdGenerator`], which is injected at
//! construction time.  Tests substitute a generator that returns a scripted sequence.
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::types::Id;

/// Upper bound (exclusive) of ids produced by [`RandomIdGenerator`]: at most 12 decimal digits.
pub const RANDOM_ID_BOUND: u64 = 1_000_000_000_000;

/// Source of ids for outgoing requests.
pub trait IdGenerator: Send + Sync + 'static {
    fn next_id(&self) -> Id;
}

impl<F> IdGenerator for F
where
    F: Fn() -> Id + Send + Sync + 'static,
{
    fn next_id(&self) -> Id {
        self()
    }
}

/// Default generator: a pseudo-random non-negative integer below [`RANDOM_ID_BOUND`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> Id {
        Id::Number(rand::rng().random_range(0..RANDOM_ID_BOUND))
    }
}

/// String ids from time-ordered v7 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> Id {
        Id::Str(uuid::Uuid::now_v7().to_string())
    }
}

/// Monotonically increasing numeric ids.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> Id {
        Id::Number(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
