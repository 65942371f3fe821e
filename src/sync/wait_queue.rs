// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Wait Queue
//!
//! Threads blocked on a synchronization object. Each waiter owns a
//! [`ThreadWaitEntry`]; the object keeps the entries in arrival order and
//! sets the entry's `signaled` flag when it hands the waiter a wakeup.
//!
//! The queue carries no lock of its own: it lives inside the owning
//! object's [`SpinMutex`](super::SpinMutex).

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use crate::sched::Thread;

/// ============================================================================
/// Wait Queue Entry
/// ============================================================================

/// Linkage of one blocked thread into one wait queue
#[derive(Debug)]
pub struct ThreadWaitEntry {
    thread: Arc<Thread>,
    signaled: AtomicBool,
}

impl ThreadWaitEntry {
    pub fn new(thread: Arc<Thread>) -> Self {
        Self {
            thread,
            signaled: AtomicBool::new(false),
        }
    }

    pub fn thread(&self) -> &Arc<Thread> {
        &self.thread
    }

    /// Set by the signaling object only
    pub(crate) fn signal(&self) {
        self.signaled.store(true, Ordering::Release);
    }

    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }

    /// Consume the wakeup, returning whether there was one
    pub(crate) fn take_signal(&self) -> bool {
        self.signaled.swap(false, Ordering::AcqRel)
    }
}

/// ============================================================================
/// Wait Queue
/// ============================================================================

/// FIFO of waiters
#[derive(Debug, Default)]
pub struct WaitQueue {
    entries: VecDeque<Arc<ThreadWaitEntry>>,
}

impl WaitQueue {
    pub const fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push_back(&mut self, entry: Arc<ThreadWaitEntry>) {
        self.entries.push_back(entry);
    }

    /// Oldest waiter
    pub fn pop_front(&mut self) -> Option<Arc<ThreadWaitEntry>> {
        self.entries.pop_front()
    }

    /// Drop `entry` if it is still queued (the waiter timed out)
    pub fn remove(&mut self, entry: &Arc<ThreadWaitEntry>) -> bool {
        match self.entries.iter().position(|e| Arc::ptr_eq(e, entry)) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Take every waiter, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = Arc<ThreadWaitEntry>> + '_ {
        self.entries.drain(..)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::thread::tests::detached_thread;

    #[test]
    fn test_wait_queue_empty() {
        let mut wq = WaitQueue::new();
        assert!(wq.is_empty());
        assert_eq!(wq.len(), 0);
        assert!(wq.pop_front().is_none());
    }

    #[test]
    fn test_wait_queue_fifo_order() {
        let mut wq = WaitQueue::new();
        let entries: alloc::vec::Vec<_> = (0..3)
            .map(|_| Arc::new(ThreadWaitEntry::new(detached_thread("waiter"))))
            .collect();

        for entry in &entries {
            wq.push_back(entry.clone());
        }

        for entry in &entries {
            let popped = wq.pop_front().unwrap();
            assert!(Arc::ptr_eq(&popped, entry));
        }
        assert!(wq.pop_front().is_none());
    }

    #[test]
    fn test_wait_queue_remove() {
        let mut wq = WaitQueue::new();
        let a = Arc::new(ThreadWaitEntry::new(detached_thread("a")));
        let b = Arc::new(ThreadWaitEntry::new(detached_thread("b")));
        wq.push_back(a.clone());
        wq.push_back(b.clone());

        assert!(wq.remove(&a));
        assert!(!wq.remove(&a));
        assert_eq!(wq.len(), 1);
        assert!(Arc::ptr_eq(&wq.pop_front().unwrap(), &b));
    }

    #[test]
    fn test_entry_signal_is_consumed_once() {
        let entry = ThreadWaitEntry::new(detached_thread("w"));
        assert!(!entry.is_signaled());

        entry.signal();
        assert!(entry.is_signaled());
        assert!(entry.take_signal());
        assert!(!entry.take_signal());
    }
}
