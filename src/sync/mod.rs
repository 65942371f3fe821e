// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Synchronization Primitives
//!
//! This module provides the kernel's locking and signaling primitives.
//!
//! # Modules
//!
//! - [`critical`] - Interrupt-masking and spinning critical sections
//! - [`spinlock`] - Spin mutex guarded by a critical section
//! - [`wait_queue`] - FIFO of blocked threads
//! - [`event`] - Auto-reset and manual-reset events

pub mod critical;
pub mod event;
pub mod spinlock;
pub mod wait_queue;

// Re-exports
pub use critical::{ProcessorCriticalSection, SpinCriticalSection};
pub use event::Event;
pub use spinlock::{SpinMutex, SpinMutexGuard};
pub use wait_queue::{ThreadWaitEntry, WaitQueue};
