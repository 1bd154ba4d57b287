//! Shared counters and the ways of bumping them.
//!
//! Every counter is backed by an `AtomicU64` so that racing on it never
//! leaves the memory model. Whether an increment is serialized is decided
//! entirely by the [`Increment`] strategy applied to it.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::{Relaxed, SeqCst};

#[derive(Debug, Default)]
pub struct Counter {
    inner: AtomicU64,
}

impl Counter {
    pub const fn new() -> Counter {
        Counter {
            inner: AtomicU64::new(0),
        }
    }

    /// Reads the final value. Only meaningful once every writer is joined.
    pub fn get(&self) -> u64 {
        self.inner.load(SeqCst)
    }

    pub(crate) fn cell(&self) -> &AtomicU64 {
        &self.inner
    }
}

/// One way of adding one to a [`Counter`].
pub trait Increment: Sync {
    /// Label used when reporting the counter this strategy drives.
    fn name(&self) -> &'static str;

    /// Whether concurrent increments are guaranteed not to be lost.
    fn is_atomic(&self) -> bool;

    fn increment(&self, counter: &Counter);
}

/// The language-level atomic increment.
#[derive(Debug, Clone, Copy)]
pub struct FetchAdd;

impl Increment for FetchAdd {
    fn name(&self) -> &'static str {
        "atomic"
    }

    fn is_atomic(&self) -> bool {
        true
    }

    #[inline]
    fn increment(&self, counter: &Counter) {
        counter.cell().fetch_add(1, SeqCst);
    }
}

/// A plain read-modify-write: load, add, store. Another thread's store
/// landing between our load and store is overwritten and lost.
#[derive(Debug, Clone, Copy)]
pub struct LoadStore;

impl Increment for LoadStore {
    fn name(&self) -> &'static str {
        "non_atomic"
    }

    fn is_atomic(&self) -> bool {
        false
    }

    #[inline]
    fn increment(&self, counter: &Counter) {
        let cell = counter.cell();
        let seen = cell.load(Relaxed);
        cell.store(seen.wrapping_add(1), Relaxed);
    }
}
