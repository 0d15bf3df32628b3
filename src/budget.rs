use std::sync::atomic::{AtomicI64, Ordering};

/// Thread-safe counter bounding the dispatches of a call chain.
///
/// Calls sharing one budget draw slots through an [`AttemptLease`], which
/// hands them back when the call ends. A limit of zero or below is always
/// exhausted.
#[derive(Debug)]
pub struct AttemptBudget {
    limit: i64,
    count: AtomicI64,
}

impl AttemptBudget {
    pub fn new(limit: i64) -> Self {
        Self {
            limit,
            count: AtomicI64::new(0),
        }
    }

    /// Records one dispatch and returns the new count.
    pub fn increment(&self) -> i64 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Checks the limit and records a dispatch in one atomic step, so two
    /// concurrent calls cannot both take the last slot. Returns the new count.
    pub fn try_acquire(&self) -> Option<i64> {
        self.count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                (count < self.limit).then_some(count + 1)
            })
            .ok()
            .map(|previous| previous + 1)
    }

    /// Returns `attempts` slots taken by a finished call; never drops below zero.
    pub fn release(&self, attempts: i64) {
        let _ = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                Some((count - attempts).max(0))
            });
    }

    /// Starts a call whose slots are released when the lease is dropped.
    pub fn lease(&self) -> AttemptLease<'_> {
        AttemptLease {
            budget: self,
            taken: 0,
        }
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    pub fn has_reached_limit(&self) -> bool {
        self.count.load(Ordering::SeqCst) >= self.limit
    }

    pub fn value(&self) -> i64 {
        self.count.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }
}

/// Slots held by one logical call against a shared [`AttemptBudget`].
#[derive(Debug)]
pub struct AttemptLease<'a> {
    budget: &'a AttemptBudget,
    taken: i64,
}

impl AttemptLease<'_> {
    /// Takes one slot for this call; `None` once the shared limit is reached.
    pub fn try_acquire(&mut self) -> Option<i64> {
        let count = self.budget.try_acquire()?;
        self.taken += 1;
        Some(count)
    }

    /// Dispatches recorded by this call so far.
    pub fn taken(&self) -> i64 {
        self.taken
    }
}

impl Drop for AttemptLease<'_> {
    fn drop(&mut self) {
        self.budget.release(self.taken);
    }
}
