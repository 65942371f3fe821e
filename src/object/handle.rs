// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Accessors
//!
//! An accessor pairs a reference to a kernel object with the rights that
//! were actually granted when it was opened. It is a plain value: cloning
//! it copies the grant, and concurrent use of the object is the object's
//! own business.
//!
//! # Usage
//!
//! ```ignore
//! let event = objects.open_object::<Event>("/sync/ready", AccessMask::WRITE, None)?;
//! event.check_access(AccessMask::WRITE)?;
//! event.object().set(&kernel)?;
//! ```

use alloc::sync::Arc;
use core::fmt;

use super::access::AccessMask;
use super::KernelObject;
use crate::error::{KernelError, KernelResult};

/// Capability-checked handle
pub struct Accessor<T: ?Sized> {
    object: Arc<T>,
    granted: AccessMask,
}

impl<T: ?Sized> Accessor<T> {
    pub(crate) fn new(object: Arc<T>, granted: AccessMask) -> Self {
        Self { object, granted }
    }

    pub fn object(&self) -> &Arc<T> {
        &self.object
    }

    pub fn into_object(self) -> Arc<T> {
        self.object
    }

    pub fn granted(&self) -> AccessMask {
        self.granted
    }

    /// Fail with `UnauthorizedAccess` unless `required` was granted
    pub fn check_access(&self, required: AccessMask) -> KernelResult<()> {
        self.granted.check_access(required)
    }

    /// Same object, rights reduced to `mask`
    #[must_use]
    pub fn narrow(&self, mask: AccessMask) -> Self {
        Self {
            object: self.object.clone(),
            granted: self.granted & mask,
        }
    }
}

impl<T: KernelObject> Accessor<T> {
    /// Forget the concrete type
    pub fn upcast(self) -> Accessor<dyn KernelObject> {
        let object: Arc<dyn KernelObject> = self.object;
        Accessor {
            object,
            granted: self.granted,
        }
    }

    /// Reinterpret as another object type, keeping the grant
    pub fn cast<U: KernelObject>(self) -> KernelResult<Accessor<U>> {
        self.upcast().downcast()
    }
}

impl Accessor<dyn KernelObject> {
    /// Recover the concrete type
    pub fn downcast<U: KernelObject>(self) -> KernelResult<Accessor<U>> {
        let granted = self.granted;
        self.object
            .into_any_arc()
            .downcast::<U>()
            .map(|object| Accessor { object, granted })
            .map_err(|_| KernelError::InvalidCast)
    }
}

impl<T: ?Sized> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            granted: self.granted,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("object", &Arc::as_ptr(&self.object))
            .field("granted", &self.granted)
            .finish()
    }
}
