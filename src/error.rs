// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel error types
//!
//! Recoverable failures surfaced synchronously to callers. Violated
//! invariants (unhandled IRQ, no running thread, empty ready list) are not
//! represented here: they are kernel panics.

use core::fmt;

/// Kernel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// Malformed path or object name
    InvalidPath,
    /// Missing namespace entry, or an entry of the wrong type
    NotFound,
    /// A sibling with the same name already exists
    AlreadyExists,
    /// Access mask check failed
    UnauthorizedAccess,
    /// Accessor cast to an unrelated object type
    InvalidCast,
    /// Wait expired before the object was signaled
    Timeout,
    /// Operation on a thread that no scheduler owns, or out of sequence
    InvalidOperation,
    /// Argument outside the accepted range (negative delay, zero time slice)
    ArgumentOutOfRange,
}

impl KernelError {
    pub fn as_str(self) -> &'static str {
        match self {
            KernelError::InvalidPath => "invalid object path",
            KernelError::NotFound => "object not found",
            KernelError::AlreadyExists => "object already exists",
            KernelError::UnauthorizedAccess => "access denied",
            KernelError::InvalidCast => "object is not of the requested type",
            KernelError::Timeout => "wait timed out",
            KernelError::InvalidOperation => "invalid operation",
            KernelError::ArgumentOutOfRange => "argument out of range",
        }
    }

    /// Stable negative status code, used as a thread's exit code when its
    /// entry point fails.
    pub const fn code(self) -> i32 {
        match self {
            KernelError::InvalidPath => -1,
            KernelError::NotFound => -2,
            KernelError::AlreadyExists => -3,
            KernelError::UnauthorizedAccess => -4,
            KernelError::InvalidCast => -5,
            KernelError::Timeout => -6,
            KernelError::InvalidOperation => -7,
            KernelError::ArgumentOutOfRange => -8,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type KernelResult<T> = Result<T, KernelError>;
