//! Predicate-guarded wait/notify over a shared mutex

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::trace;

use super::SyncError;

type Predicate<S> = Box<dyn Fn(&S) -> bool + Send + Sync>;

/// Blocks callers until a predicate over shared state holds
///
/// Several conditions may share one lock (the queue's "can read" and
/// "can write" do). The predicate is evaluated with the lock held, so it must
/// not block or try to take the lock again.
pub struct Condition<S> {
    lock: Arc<Mutex<S>>,
    condvar: Condvar,
    predicate: Predicate<S>,
}

impl<S> Condition<S> {
    /// Create a condition over `lock` that is satisfied when `predicate` holds
    pub fn new(lock: Arc<Mutex<S>>, predicate: impl Fn(&S) -> bool + Send + Sync + 'static) -> Self {
        Self {
            lock,
            condvar: Condvar::new(),
            predicate: Box::new(predicate),
        }
    }

    /// Start building a condition from parts that may not be available yet
    pub fn builder() -> ConditionBuilder<S> {
        ConditionBuilder {
            lock: None,
            predicate: None,
        }
    }

    /// The lock this condition guards
    pub fn lock(&self) -> &Arc<Mutex<S>> {
        &self.lock
    }

    /// Evaluate the predicate against state the caller has already locked
    pub fn holds(&self, state: &S) -> bool {
        (self.predicate)(state)
    }

    /// Wait until the predicate holds, returning with the lock held
    ///
    /// Spurious wakeups are absorbed by re-checking the predicate.
    pub fn wait(&self) -> MutexGuard<'_, S> {
        let mut guard = self.lock.lock();
        while !(self.predicate)(&guard) {
            self.condvar.wait(&mut guard);
        }
        guard
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`
    pub fn wait_for(&self, timeout: Duration) -> Option<MutexGuard<'_, S>> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        while !(self.predicate)(&guard) {
            if self.condvar.wait_until(&mut guard, deadline).timed_out() {
                trace!(?timeout, "Condition::wait_for: timed out");
                return (self.predicate)(&guard).then_some(guard);
            }
        }
        Some(guard)
    }

    /// Wake one waiter if the predicate currently holds
    pub fn signal(&self) -> bool {
        let guard = self.lock.lock();
        if (self.predicate)(&guard) {
            self.condvar.notify_one()
        } else {
            false
        }
    }

    /// Wake every waiter if the predicate currently holds
    pub fn signal_all(&self) -> usize {
        let guard = self.lock.lock();
        self.signal_all_held(&guard)
    }

    /// Same as [`signal_all`](Self::signal_all) for a caller that already holds the lock
    pub fn signal_all_held(&self, guard: &MutexGuard<'_, S>) -> usize {
        if (self.predicate)(guard) {
            self.condvar.notify_all()
        } else {
            0
        }
    }
}

/// Assembles a [`Condition`] and reports which part is missing
pub struct ConditionBuilder<S> {
    lock: Option<Arc<Mutex<S>>>,
    predicate: Option<Predicate<S>>,
}

impl<S> ConditionBuilder<S> {
    pub fn lock(mut self, lock: Arc<Mutex<S>>) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn predicate(mut self, predicate: impl Fn(&S) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    pub fn build(self) -> Result<Condition<S>, SyncError> {
        let lock = self.lock.ok_or(SyncError::MissingLock)?;
        let predicate = self.predicate.ok_or(SyncError::MissingPredicate)?;
        Ok(Condition {
            lock,
            condvar: Condvar::new(),
            predicate,
        })
    }
}
