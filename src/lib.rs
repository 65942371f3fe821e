// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! # Rustux Core - Portable Kernel Core
//!
//! The architecture-independent heart of the Rustux kernel:
//!
//! - **Preemptive scheduling**: one round-robin scheduler per logical
//!   processor, driven by a periodic tick
//! - **Interrupt dispatch**: system IRQ handlers and deferred procedure calls
//! - **Synchronization**: critical sections, spin mutexes and events
//! - **Object namespace**: named kernel objects reached through rights-checked
//!   accessors
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── traits.rs          # ChipControl: what the platform provides
//! ├── kernel.rs          # Kernel and the per-core array
//! ├── interrupt/         # IRQ dispatch and DPC queue
//! ├── sched/             # Scheduler, threads, thread state
//! ├── sync/              # Critical sections, spin mutex, events
//! ├── object/            # Kernel objects, directories, accessors
//! └── lib.rs             # This file
//! ```
//!
//! ## Platform Abstraction
//!
//! Everything hardware-specific sits behind [`ChipControl`]: interrupt
//! masking, the periodic timer, the core-notification soft interrupt and
//! the context switch itself. The core only ever passes opaque
//! [`Context`] tokens around.
//!
//! ## Booting
//!
//! ```ignore
//! use rustux_core::{Kernel, KernelConfig};
//!
//! let kernel = Kernel::new(chip, KernelConfig::default())?;
//! let init = kernel.create_thread(init_main, "init");
//! kernel.start_thread(&init, 0);
//! kernel.start();
//! ```

#![no_std]

// Alloc crate for heap allocations
extern crate alloc;

#[cfg(test)]
extern crate std;

// Core traits and types
pub mod traits;

pub mod config;
pub mod error;
pub mod time;

// Kernel instance and per-core state
pub mod kernel;

// Generic interrupt handling
pub mod interrupt;

// Scheduler
pub mod sched;

// Synchronization primitives
pub mod sync;

// Kernel objects and namespace
pub mod object;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;

// Re-exports
pub use config::KernelConfig;
pub use error::{KernelError, KernelResult};
pub use kernel::{Kernel, Processor};
pub use time::TimeSpan;
pub use traits::{ChipControl, Context, InterruptState};
