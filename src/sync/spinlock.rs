// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Spinlock Implementation
//!
//! A spin mutex whose guard is a [`SpinCriticalSection`]: the holder runs
//! with local interrupts masked, so an interrupt handler on the same core
//! can never spin on a lock its own core already holds.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

use super::critical::SpinCriticalSection;
use crate::traits::ChipControl;

/// Interrupt-safe spin mutex
pub struct SpinMutex<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SpinMutex<T> {}
unsafe impl<T: Send> Sync for SpinMutex<T> {}

impl<T> SpinMutex<T> {
    /// Create a new spinlock
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Mask local interrupts and spin until the lock is available
    pub fn lock<'a>(&'a self, chip: &'a dyn ChipControl) -> SpinMutexGuard<'a, T> {
        let section = SpinCriticalSection::enter(chip, &self.locked);
        SpinMutexGuard { mutex: self, _section: section }
    }

    /// Try to acquire the lock without spinning
    pub fn try_lock<'a>(&'a self, chip: &'a dyn ChipControl) -> Option<SpinMutexGuard<'a, T>> {
        SpinCriticalSection::try_enter(chip, &self.locked)
            .map(|section| SpinMutexGuard { mutex: self, _section: section })
    }

    /// Check if the mutex is currently locked
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Exclusive access without locking; `&mut self` already proves it
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

/// RAII guard for a SpinMutex
pub struct SpinMutexGuard<'a, T> {
    mutex: &'a SpinMutex<T>,
    _section: SpinCriticalSection<'a>,
}

impl<T> Deref for SpinMutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for SpinMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

// ============================================================================
// Tests
// ============================================================================
