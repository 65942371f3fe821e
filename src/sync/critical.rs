// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Critical Sections
//!
//! Two scoped guards:
//!
//! - **ProcessorCriticalSection**: masks local interrupts. Enough for state
//!   that only the owning core's interrupt context touches.
//! - **SpinCriticalSection**: masks local interrupts, then spins on a lock
//!   flag so other cores are excluded as well.
//!
//! Interrupts are masked *before* spinning: if the local IRQ handler could
//! run while this core holds the flag, it would spin forever on it. On
//! release the flag is cleared first and the interrupt state restored last.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::traits::{ChipControl, InterruptState};

/// Local interrupt masking, restored on drop
#[must_use = "interrupts are restored as soon as the section is dropped"]
pub struct ProcessorCriticalSection<'a> {
    chip: &'a dyn ChipControl,
    saved: InterruptState,
}

impl<'a> ProcessorCriticalSection<'a> {
    /// Disable local interrupts and remember the previous mask
    pub fn enter(chip: &'a dyn ChipControl) -> Self {
        let saved = chip.disable_interrupt();
        Self { chip, saved }
    }

    /// Interrupt state that will be restored on drop
    pub fn saved_state(&self) -> InterruptState {
        self.saved
    }
}

impl Drop for ProcessorCriticalSection<'_> {
    fn drop(&mut self) {
        self.chip.restore_interrupt(self.saved);
    }
}

/// Local interrupt masking plus a cross-core busy-wait lock
#[must_use = "the lock is released as soon as the section is dropped"]
pub struct SpinCriticalSection<'a> {
    lock: &'a AtomicBool,
    // Dropped after `Drop::drop` has released `lock`
    _local: ProcessorCriticalSection<'a>,
}

impl<'a> SpinCriticalSection<'a> {
    /// Mask interrupts, then spin until `lock` is ours
    pub fn enter(chip: &'a dyn ChipControl, lock: &'a AtomicBool) -> Self {
        let local = ProcessorCriticalSection::enter(chip);
        while lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            while lock.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
        Self { lock, _local: local }
    }

    /// Take the lock only if it is free right now
    pub fn try_enter(chip: &'a dyn ChipControl, lock: &'a AtomicBool) -> Option<Self> {
        let local = ProcessorCriticalSection::enter(chip);
        if lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(Self { lock, _local: local })
        } else {
            None
        }
    }
}

impl Drop for SpinCriticalSection<'_> {
    fn drop(&mut self) {
        self.lock.store(false, Ordering::Release);
    }
}

// ============================================================================
// Tests
// ============================================================================
