// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel configuration
//!
//! Boot-time knobs. Anything left unset falls back to what the platform
//! reports through [`ChipControl`](crate::traits::ChipControl).

use crate::time::TimeSpan;

/// Upper bound on the per-core array
pub const DEFAULT_MAX_PROCESSORS: usize = 8;

/// Kernel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    /// Scheduler tick period; `None` uses the chip default
    pub time_slice: Option<TimeSpan>,
    /// Processors beyond this count are left unmanaged
    pub max_processors: usize,
    /// Description given to each core's idle thread
    pub idle_description: &'static str,
}

impl KernelConfig {
    pub const fn new() -> Self {
        Self {
            time_slice: None,
            max_processors: DEFAULT_MAX_PROCESSORS,
            idle_description: "idle",
        }
    }

    pub const fn with_time_slice(mut self, slice: TimeSpan) -> Self {
        self.time_slice = Some(slice);
        self
    }

    pub const fn with_max_processors(mut self, count: usize) -> Self {
        self.max_processors = count;
        self
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}
