// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Access Masks
//!
//! Rights are permissions that control what operations can be performed
//! on a kernel object through an [`Accessor`](super::Accessor).
//!
//! Path resolution negotiates rights with [`AccessState`], a value folded
//! once per path segment: each object along the path may grant only what it
//! declares valid, and the last object's grant is what the caller receives.

use bitflags::bitflags;

use crate::error::{KernelError, KernelResult};

bitflags! {
    /// Capability bitmask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessMask: u32 {
        /// Read state / wait
        const READ = 1 << 0;
        /// Modify state / signal / create children
        const WRITE = 1 << 1;
        /// Execute
        const EXECUTE = 1 << 2;
        /// Every right
        const ALL = Self::READ.bits() | Self::WRITE.bits() | Self::EXECUTE.bits();
    }
}

impl AccessMask {
    /// Fail unless every bit of `required` is present
    pub fn check_access(self, required: AccessMask) -> KernelResult<()> {
        if (self & required) == required {
            Ok(())
        } else {
            Err(KernelError::UnauthorizedAccess)
        }
    }
}

/// Access negotiation accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessState {
    /// Rights requested but not granted by any object so far
    pub remaining_desired: AccessMask,
    /// Rights granted by the most recently visited object
    pub previously_granted: AccessMask,
    /// Rights the caller asked for
    pub original_desired: AccessMask,
}

impl AccessState {
    pub const fn new(desired: AccessMask) -> Self {
        Self {
            remaining_desired: desired,
            previously_granted: AccessMask::empty(),
            original_desired: desired,
        }
    }

    /// Visit one object whose valid rights are `valid`
    #[must_use]
    pub fn step(self, valid: AccessMask) -> Self {
        let granted = (self.remaining_desired | self.previously_granted) & valid;
        Self {
            remaining_desired: self.remaining_desired & !granted,
            previously_granted: granted,
            original_desired: self.original_desired,
        }
    }

    /// Rights granted by the last visited object
    pub const fn granted(self) -> AccessMask {
        self.previously_granted
    }
}
