// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread state and delayed queue
//!
//! Defines thread states and the wake-tick ordered queue of sleeping
//! threads.

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;

use super::thread::{Thread, ThreadId};

/// Why a thread is not runnable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitKind {
    /// Sleeping until a wake tick
    Timed,
    /// Parked until explicitly undelayed
    Infinite,
}

/// Thread states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Thread is ready to run
    Ready,
    /// Thread is currently running
    Running,
    /// Thread is delayed or blocked
    Wait(WaitKind),
    /// Thread has terminated
    Terminated,
}

impl ThreadState {
    /// Encoding used for atomic storage
    pub const fn into_raw(self) -> u8 {
        match self {
            Self::Ready => 0,
            Self::Running => 1,
            Self::Wait(WaitKind::Timed) => 2,
            Self::Wait(WaitKind::Infinite) => 3,
            Self::Terminated => 4,
        }
    }

    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Ready),
            1 => Some(Self::Running),
            2 => Some(Self::Wait(WaitKind::Timed)),
            3 => Some(Self::Wait(WaitKind::Infinite)),
            4 => Some(Self::Terminated),
            _ => None,
        }
    }

    pub const fn is_waiting(self) -> bool {
        matches!(self, Self::Wait(_))
    }
}

/// Delayed queue entry
#[derive(Debug, Clone)]
pub struct ThreadScheduleEntry {
    /// Sleeping thread
    pub thread: Arc<Thread>,
    /// Absolute tick at which the thread becomes ready
    pub wake_tick: u64,
}

/// Sleeping threads, ascending by wake tick
///
/// Entries with equal wake ticks keep their insertion order.
#[derive(Debug, Default)]
pub struct DelayedQueue {
    entries: VecDeque<ThreadScheduleEntry>,
}

impl DelayedQueue {
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

    /// Insert before the first entry waking strictly later
    pub fn insert(&mut self, entry: ThreadScheduleEntry) {
        let index = self
            .entries
            .iter()
            .position(|e| e.wake_tick > entry.wake_tick)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
    }

    /// Pop the head if it is due at `tick`
    pub fn pop_due(&mut self, tick: u64) -> Option<ThreadScheduleEntry> {
        match self.entries.front() {
            Some(head) if head.wake_tick <= tick => self.entries.pop_front(),
            _ => None,
        }
    }

    /// Remove `thread` wherever it is queued
    pub fn remove(&mut self, thread: &Arc<Thread>) -> bool {
        match self.entries.iter().position(|e| Arc::ptr_eq(&e.thread, thread)) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Wake tick of `thread`, if it is queued
    pub fn wake_tick_of(&self, thread: &Arc<Thread>) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| Arc::ptr_eq(&e.thread, thread))
            .map(|e| e.wake_tick)
    }

    /// Thread ids in wake order
    pub fn ids(&self) -> Vec<ThreadId> {
        self.entries.iter().map(|e| e.thread.id()).collect()
    }
}
