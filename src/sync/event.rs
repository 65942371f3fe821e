// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Event Object
//!
//! Binary signaling object in two flavors:
//!
//! - **Auto-reset**: `set` releases exactly one waiter (FIFO) and the event
//!   stays clear; with nobody waiting it latches until one wait consumes it.
//! - **Manual-reset**: `set` releases every waiter and the event stays
//!   signaled until `reset`.
//!
//! # Locking
//!
//! The waiter queue is guarded by a [`SpinMutex`]. A waiter enqueues itself
//! and calls [`Scheduler::delay`] while still holding it, so a `set` racing
//! on another core always finds the thread already parked. The event lock
//! is taken before any scheduler lock, never after.
//!
//! [`Scheduler::delay`]: crate::sched::Scheduler::delay

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use super::spinlock::SpinMutex;
use super::wait_queue::{ThreadWaitEntry, WaitQueue};
use crate::error::{KernelError, KernelResult};
use crate::kernel::Kernel;
use crate::object::{AccessMask, Accessor, Directory, KernelObject, ObjectHeader};
use crate::time::TimeSpan;

/// Event object
pub struct Event {
    header: ObjectHeader,
    raised: AtomicBool,
    auto_reset: bool,
    waiters: SpinMutex<WaitQueue>,
}

impl Event {
    /// Rights an event accessor may carry: wait (READ) and set/reset (WRITE)
    pub const VALID_ACCESS: AccessMask = AccessMask::READ.union(AccessMask::WRITE);

    /// Create an unnamed, clear event
    pub const fn new(auto_reset: bool) -> Self {
        Self {
            header: ObjectHeader::new(),
            raised: AtomicBool::new(false),
            auto_reset,
            waiters: SpinMutex::new(WaitQueue::new()),
        }
    }

    /// Create a clear event named `name` under `parent` (default: root)
    pub fn create(
        kernel: &Kernel,
        name: &str,
        auto_reset: bool,
        parent: Option<&Accessor<Directory>>,
    ) -> KernelResult<Accessor<Event>> {
        kernel
            .objects()
            .create_object(Arc::new(Self::new(auto_reset)), name, parent)
    }

    pub fn is_auto_reset(&self) -> bool {
        self.auto_reset
    }

    pub fn is_set(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Clear the signaled state
    pub fn reset(&self) {
        self.raised.store(false, Ordering::Release);
    }

    pub fn waiter_count(&self, kernel: &Kernel) -> usize {
        self.waiters.lock(&**kernel.chip()).len()
    }

    /// Wait until the event is signaled or `timeout` elapses
    ///
    /// Fails with `ArgumentOutOfRange` for a negative timeout and with
    /// `Timeout` when the deadline passes first. A zero timeout polls.
    pub fn wait(&self, kernel: &Kernel, timeout: TimeSpan) -> KernelResult<()> {
        match self.enqueue_wait(kernel, timeout)? {
            None => Ok(()),
            Some(entry) => self.complete_wait(kernel, &entry),
        }
    }

    /// Signal the event
    pub fn set(&self, kernel: &Kernel) -> KernelResult<()> {
        let mut waiters = self.waiters.lock(&**kernel.chip());

        if self.auto_reset {
            while let Some(entry) = waiters.pop_front() {
                if Self::release(kernel, &entry) {
                    return Ok(());
                }
            }
            // Nobody left to take it
            self.raised.store(true, Ordering::Release);
        } else {
            self.raised.store(true, Ordering::Release);
            for entry in waiters.drain() {
                Self::release(kernel, &entry);
            }
        }
        Ok(())
    }

    /// First half of `wait`: consume a pending signal, or queue the running
    /// thread and delay it
    ///
    /// Returns `None` when the signal was taken without waiting. Otherwise the
    /// returned entry must be passed to [`complete_wait`](Self::complete_wait)
    /// once the thread runs again.
    pub(crate) fn enqueue_wait(
        &self,
        kernel: &Kernel,
        timeout: TimeSpan,
    ) -> KernelResult<Option<Arc<ThreadWaitEntry>>> {
        if timeout.is_negative() {
            return Err(KernelError::ArgumentOutOfRange);
        }
        if self.try_consume() {
            return Ok(None);
        }

        let scheduler = kernel.current_scheduler();
        let mut waiters = self.waiters.lock(&**kernel.chip());

        // A set may have landed before the lock was taken
        if self.try_consume() {
            return Ok(None);
        }
        if timeout.is_zero() {
            return Err(KernelError::Timeout);
        }

        let thread = scheduler.running_thread().ok_or(KernelError::InvalidOperation)?;
        let entry = Arc::new(ThreadWaitEntry::new(thread));
        waiters.push_back(entry.clone());

        if let Err(err) = scheduler.delay(timeout) {
            waiters.remove(&entry);
            return Err(err);
        }
        Ok(Some(entry))
    }

    /// Second half of `wait`, run after the thread was resumed
    pub(crate) fn complete_wait(
        &self,
        kernel: &Kernel,
        entry: &Arc<ThreadWaitEntry>,
    ) -> KernelResult<()> {
        let mut waiters = self.waiters.lock(&**kernel.chip());
        // Still queued means the deadline won
        waiters.remove(entry);

        if entry.take_signal() {
            Ok(())
        } else {
            Err(KernelError::Timeout)
        }
    }

    fn try_consume(&self) -> bool {
        if self.auto_reset {
            self.raised
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        } else {
            self.raised.load(Ordering::Acquire)
        }
    }

    /// Hand the signal to one waiter; `false` if its thread is gone
    fn release(kernel: &Kernel, entry: &Arc<ThreadWaitEntry>) -> bool {
        entry.signal();
        match entry.thread().undelay(kernel) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("event: waiter thread {} not woken: {}", entry.thread().id(), err);
                false
            }
        }
    }
}

impl KernelObject for Event {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn valid_access_mask(&self) -> AccessMask {
        Self::VALID_ACCESS
    }

    fn type_name(&self) -> &'static str {
        "event"
    }
}
