// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Integration Tests
//!
//! This module contains integration tests for the kernel core.
//! These tests boot a kernel on the simulated chip and verify that the
//! scheduler, interrupt dispatch, events and the namespace work together.

mod namespace_tests;
