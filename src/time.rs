// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Time spans
//!
//! Delays and timeouts are signed so that a negative request can be
//! rejected instead of silently wrapping. `TimeSpan::INFINITE` is a
//! sentinel distinct from every finite span, negative ones included.

/// Signed span of time with nanosecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSpan {
    nanos: i64,
}

impl TimeSpan {
    /// Zero-length span (a pure yield when used as a delay)
    pub const ZERO: Self = Self { nanos: 0 };

    /// Wait forever
    pub const INFINITE: Self = Self { nanos: i64::MAX };

    pub const fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    pub const fn from_micros(micros: i64) -> Self {
        Self { nanos: micros.saturating_mul(1_000) }
    }

    pub const fn from_millis(millis: i64) -> Self {
        Self { nanos: millis.saturating_mul(1_000_000) }
    }

    pub const fn as_nanos(self) -> i64 {
        self.nanos
    }

    pub const fn is_infinite(self) -> bool {
        self.nanos == i64::MAX
    }

    pub const fn is_negative(self) -> bool {
        self.nanos < 0
    }

    pub const fn is_zero(self) -> bool {
        self.nanos == 0
    }

    /// Number of whole `slice` periods needed to cover this span, rounded up.
    ///
    /// Returns `None` for negative or infinite spans and for a non-positive
    /// slice.
    pub fn ticks_ceil(self, slice: TimeSpan) -> Option<u64> {
        if self.is_negative() || self.is_infinite() || slice.nanos <= 0 {
            return None;
        }
        Some((self.nanos as u64).div_ceil(slice.nanos as u64))
    }
}
