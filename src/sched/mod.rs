// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler and thread management
//!
//! This module provides the per-core preemptive scheduler and the thread
//! lifecycle.
//!
//! # Example
//! ```ignore
//! use rustux_core::sched::ThreadState;
//!
//! let thread = kernel.create_thread(worker_main, "worker");
//! kernel.start_thread(&thread, 0);
//! kernel.start();
//! ```

pub mod scheduler;
pub mod state;
pub mod thread;

pub use scheduler::Scheduler;
pub use state::{DelayedQueue, ThreadScheduleEntry, ThreadState, WaitKind};
pub use thread::{Thread, ThreadEntry, ThreadId};
