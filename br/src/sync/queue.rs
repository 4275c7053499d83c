//! Fixed-capacity blocking ring buffer
//!
//! One mutex shields both ends of the buffer. Producers wait on "can write"
//! (a free slot exists), consumers wait on "can read" (an item exists), and
//! each side wakes the other after it moves a cursor. A full queue throttles
//! producers instead of growing.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use super::SyncError;
use super::condition::Condition;

/// Buffer state shared by both conditions
struct Slots<T> {
    items: Vec<Option<T>>,
    free: usize,
    available: usize,
    read: usize,
    write: usize,
}

impl<T> Slots<T> {
    fn new(capacity: usize) -> Self {
        Self {
            items: (0..capacity).map(|_| None).collect(),
            free: capacity,
            available: 0,
            read: 0,
            write: 0,
        }
    }

    fn push(&mut self, item: T) {
        let capacity = self.items.len();
        if let Some(slot) = self.items.get_mut(self.write) {
            *slot = Some(item);
        }
        self.write = (self.write + 1) % capacity;
        self.free -= 1;
        self.available += 1;
    }

    fn pop(&mut self) -> Option<T> {
        let capacity = self.items.len();
        let item = self.items.get_mut(self.read).and_then(Option::take)?;
        self.read = (self.read + 1) % capacity;
        self.available -= 1;
        self.free += 1;
        Some(item)
    }

    fn front(&self) -> Option<&T> {
        self.items.get(self.read).and_then(Option::as_ref)
    }
}

/// Bounded multi-producer queue with blocking hand-off
pub struct BoundedBlockingQueue<T> {
    capacity: usize,
    can_read: Condition<Slots<T>>,
    can_write: Condition<Slots<T>>,
}

impl<T: 'static> BoundedBlockingQueue<T> {
    /// Create a queue holding at most `capacity` items
    pub fn new(capacity: usize) -> Result<Self, SyncError> {
        if capacity == 0 {
            return Err(SyncError::ZeroCapacity);
        }
        let lock = Arc::new(Mutex::new(Slots::new(capacity)));
        Ok(Self {
            capacity,
            can_read: Condition::new(lock.clone(), |s: &Slots<T>| s.available > 0),
            can_write: Condition::new(lock, |s: &Slots<T>| s.free > 0),
        })
    }
}

impl<T> BoundedBlockingQueue<T> {
    /// Append an item, blocking while the queue is full
    pub fn enqueue(&self, item: T) {
        {
            let mut slots = self.can_write.wait();
            slots.push(item);
            trace!(count = slots.available, "BoundedBlockingQueue::enqueue: stored");
        }
        self.can_read.signal_all();
    }

    /// Remove the oldest item, blocking while the queue is empty
    pub fn dequeue(&self) -> T {
        loop {
            let item = {
                let mut slots = self.can_read.wait();
                slots.pop()
            };
            if let Some(item) = item {
                self.can_write.signal_all();
                return item;
            }
        }
    }

    /// Like [`dequeue`](Self::dequeue) but gives up after `timeout`
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<T> {
        let item = self.can_read.wait_for(timeout)?.pop();
        if item.is_some() {
            self.can_write.signal_all();
        }
        item
    }

    /// Remove the oldest item without ever waiting
    ///
    /// Returns `None` when the queue is empty or another thread holds the lock.
    pub fn try_dequeue(&self) -> Option<T> {
        let mut slots = self.can_read.lock().try_lock()?;
        let item = slots.pop()?;
        self.can_write.signal_all_held(&slots);
        Some(item)
    }

    /// Number of queued items
    pub fn count(&self) -> usize {
        self.can_read.lock().lock().available
    }

    pub fn is_full(&self) -> bool {
        self.can_read.lock().lock().free == 0
    }

    pub fn is_empty(&self) -> bool {
        self.can_read.lock().lock().available == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone> BoundedBlockingQueue<T> {
    /// Return a copy of the oldest item without removing it, blocking while empty
    pub fn peek(&self) -> T {
        loop {
            let slots = self.can_read.wait();
            if let Some(item) = slots.front() {
                return item.clone();
            }
        }
    }
}

impl<T> std::fmt::Debug for BoundedBlockingQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedBlockingQueue")
            .field("capacity", &self.capacity)
            .field("count", &self.count())
            .finish()
    }
}
