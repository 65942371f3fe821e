// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Platform contract
//!
//! The kernel core never touches hardware directly. Interrupt masking,
//! timer programming and the actual context switch live behind
//! [`ChipControl`], which each board support package implements:
//! - x86_64: RFLAGS.IF, Local APIC timer, IPI to self
//! - ARM64: DAIF, generic timer, SGI
//! - RISC-V: `sstatus.SIE`, SBI timer, software interrupt

use alloc::sync::Arc;

use crate::error::KernelResult;
use crate::sched::Thread;
use crate::time::TimeSpan;

/// Saved machine context of a thread
///
/// Opaque to the core; the platform decides what the word means (usually
/// the address of the register frame pushed on the thread's stack).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Context(pub usize);

impl Context {
    /// Placeholder for a thread whose context has not been captured yet
    pub const NULL: Self = Self(0);

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Local interrupt mask captured before a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptState {
    /// Whether interrupts were enabled
    pub enabled: bool,
}

impl InterruptState {
    pub const ENABLED: Self = Self { enabled: true };
    pub const DISABLED: Self = Self { enabled: false };
}

/// Trait for the chip control layer
///
/// # Contract
///
/// - `disable_interrupt`/`enable_interrupt` return the state that was in
///   effect before the call, and `restore_interrupt` puts back exactly that
///   state, so critical sections nest.
/// - `start_schedule` and `restore_context` transfer control permanently.
/// - The context returned by `initialize_thread_context` resumes in a
///   platform trampoline that calls [`Thread::run`] and then idles until the
///   pending reschedule switches away.
pub trait ChipControl: Send + Sync {
    /// Bring up the interrupt controller and per-core state
    fn initialize(&self) -> KernelResult<()>;

    /// Enable local interrupts, returning the previous state
    fn enable_interrupt(&self) -> InterruptState;

    /// Disable local interrupts, returning the previous state
    fn disable_interrupt(&self) -> InterruptState;

    /// Restore a state captured by `enable_interrupt`/`disable_interrupt`
    fn restore_interrupt(&self, state: InterruptState);

    /// Build the initial context for a freshly created thread
    fn initialize_thread_context(&self, thread: &Arc<Thread>) -> Context;

    /// Enter the first thread on this core
    fn start_schedule(&self, context: Context) -> !;

    /// Resume `context` from interrupt-return
    fn restore_context(&self, context: Context) -> !;

    /// Arm the periodic tick for this core
    fn setup_system_timer(&self, slice: TimeSpan);

    /// Post the core-notification soft interrupt to this core
    fn raise_core_notification(&self);

    /// Tick period used when the kernel configuration does not override it
    fn default_time_slice(&self) -> TimeSpan;

    /// Number of logical processors
    fn processors_count(&self) -> usize;

    /// Logical id of the executing processor, `0..processors_count()`
    fn current_processor_id(&self) -> usize;
}
