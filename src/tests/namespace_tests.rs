// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Namespace Integration Tests

use alloc::sync::Arc;

use crate::error::KernelError;
use crate::object::{AccessMask, Directory, KernelObject};
use crate::sched::{Thread, ThreadState};
use crate::sync::Event;
use crate::testing::{noop_entry, Harness};

/// Test the documented create/open walk through two levels
#[test]
fn test_create_then_open_by_path() {
    let harness = Harness::new(1);
    let objects = harness.kernel.objects();

    let a = objects.create_directory("a", None).unwrap();
    let x = objects
        .create_object(Arc::new(Event::new(false)), "b", Some(&a))
        .unwrap();

    for requested in [AccessMask::READ, AccessMask::WRITE, AccessMask::ALL] {
        let opened = objects.open_object::<Event>("/a/b", requested, None).unwrap();
        assert!(Arc::ptr_eq(opened.object(), x.object()));
        assert_eq!(opened.granted(), requested & x.object().valid_access_mask());
    }

    assert_eq!(
        objects.open_object::<Event>("/a/b/c", AccessMask::READ, None).unwrap_err(),
        KernelError::NotFound
    );
    assert_eq!(
        objects.create_directory("c/d", Some(&a)).unwrap_err(),
        KernelError::InvalidPath
    );
}

/// Test that threads can be published and started by name
#[test]
fn test_thread_published_in_namespace() {
    let harness = Harness::new(1);
    let objects = harness.kernel.objects();

    let threads = objects.create_directory("threads", None).unwrap();
    let worker = harness.kernel.create_thread(noop_entry, "worker");
    objects.create_object(worker.clone(), "worker", Some(&threads)).unwrap();

    let opened = objects
        .open_object::<Thread>("threads/worker", AccessMask::EXECUTE, None)
        .unwrap();
    opened.check_access(AccessMask::EXECUTE).unwrap();
    assert!(harness.kernel.start_thread(opened.object(), 9));

    assert_eq!(worker.state(), ThreadState::Ready);
    assert_eq!(worker.argument(), 9);
    assert_eq!(objects.full_path(&*worker), "/threads/worker");
}

/// Test that the granted rights depend only on the target object
#[test]
fn test_rights_come_from_target() {
    let harness = Harness::new(1);
    let objects = harness.kernel.objects();

    let outer = objects.create_directory("outer", None).unwrap();
    let inner = objects.create_directory("inner", Some(&outer)).unwrap();
    let worker = harness.kernel.create_thread(noop_entry, "w");
    objects.create_object(worker, "w", Some(&inner)).unwrap();

    // Directories cannot grant EXECUTE, the thread can
    let opened = objects
        .open_object::<Thread>("/outer/inner/w", AccessMask::ALL, None)
        .unwrap();
    assert_eq!(opened.granted(), AccessMask::ALL);

    let dir = objects
        .open_directory("/outer/inner", AccessMask::ALL, None)
        .unwrap();
    assert_eq!(dir.granted(), Directory::VALID_ACCESS);
}

/// Test that an accessor survives erasure and recovery of its type
#[test]
fn test_accessor_cast_round_trip() {
    let harness = Harness::new(1);
    let objects = harness.kernel.objects();
    objects
        .create_object(Arc::new(Event::new(true)), "e", None)
        .unwrap();

    let event = objects.open_object::<Event>("/e", AccessMask::READ, None).unwrap();
    let back = event.clone().cast::<Event>().unwrap().cast::<Event>().unwrap();

    assert!(Arc::ptr_eq(back.object(), event.object()));
    assert_eq!(back.granted(), event.granted());
    assert_eq!(
        event.cast::<Directory>().unwrap_err(),
        KernelError::InvalidCast
    );
}

/// Test that names are case-sensitive and siblings unique
#[test]
fn test_names_case_sensitive() {
    let harness = Harness::new(1);
    let objects = harness.kernel.objects();

    objects.create_directory("Dev", None).unwrap();
    objects.create_directory("dev", None).unwrap();
    assert_eq!(
        objects.create_directory("dev", None).unwrap_err(),
        KernelError::AlreadyExists
    );
    assert_eq!(objects.root().object().names(), ["Dev", "dev"]);
    assert!(objects
        .try_open_object::<Directory>("/DEV", AccessMask::READ, None)
        .unwrap()
        .is_none());
}
