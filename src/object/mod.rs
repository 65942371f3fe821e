// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel Objects & Namespace
//!
//! Every kernel entity (directory, thread, event, device) is a
//! [`KernelObject`] and may be named in a single tree rooted at an unnamed
//! [`Directory`]. Objects are reached through [`Accessor`]s that carry the
//! rights actually granted.
//!
//! # Design
//!
//! - **Attach once**: an object gets its name and parent exactly once and
//!   is never detached, so the tree stays acyclic.
//! - **Parse capability**: path segments are resolved by the object itself
//!   through [`Parseable`]; only directories implement it.
//! - **Rights**: each object declares a valid access mask; what an accessor
//!   carries never exceeds it.
//!
//! # Modules
//!
//! - [`access`] - Access masks and the resolution accumulator
//! - [`handle`] - Accessors
//! - [`directory`] - Named containers
//! - [`manager`] - Path-based create/open

pub mod access;
pub mod directory;
pub mod handle;
pub mod manager;

use alloc::string::String;
use alloc::sync::{Arc, Weak};
use core::any::Any;

use crate::error::{KernelError, KernelResult};

// Re-exports
pub use access::{AccessMask, AccessState};
pub use directory::Directory;
pub use handle::Accessor;
pub use manager::{ObjectManager, PATH_SEPARATOR};

/// Conversion to `Any` for checked downcasts of shared objects
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Base kernel entity
pub trait KernelObject: AsAnyArc + Send + Sync + 'static {
    /// Name and parent link
    fn header(&self) -> &ObjectHeader;

    /// Rights an accessor to this object may carry
    fn valid_access_mask(&self) -> AccessMask;

    /// Short type tag for diagnostics
    fn type_name(&self) -> &'static str;

    /// Path-resolution capability; `None` for leaf objects
    fn as_parseable(&self) -> Option<&dyn Parseable> {
        None
    }
}

/// Resolves the remainder of a path relative to an object
pub trait Parseable {
    /// Resolve `path` (no leading separator), folding `state` once per
    /// visited object
    fn parse(
        &self,
        path: &str,
        state: AccessState,
    ) -> KernelResult<(Arc<dyn KernelObject>, AccessState)>;
}

/// ============================================================================
/// Object Header
/// ============================================================================

struct ObjectLink {
    name: String,
    parent: Weak<dyn KernelObject>,
}

/// Naming state shared by every kernel object
pub struct ObjectHeader {
    link: spin::Once<ObjectLink>,
}

impl ObjectHeader {
    pub const fn new() -> Self {
        Self {
            link: spin::Once::new(),
        }
    }

    /// Name within the parent; empty for the root and for unnamed objects
    pub fn name(&self) -> &str {
        self.link.get().map_or("", |link| link.name.as_str())
    }

    /// Containing object, if attached and still alive
    pub fn parent(&self) -> Option<Arc<dyn KernelObject>> {
        self.link.get().and_then(|link| link.parent.upgrade())
    }

    pub fn is_attached(&self) -> bool {
        self.link.is_completed()
    }

    /// Record name and parent; only the first call takes effect
    pub(crate) fn attach(&self, name: &str, parent: Weak<dyn KernelObject>) -> KernelResult<()> {
        let mut fresh = false;
        self.link.call_once(|| {
            fresh = true;
            ObjectLink {
                name: String::from(name),
                parent,
            }
        });
        if fresh {
            Ok(())
        } else {
            Err(KernelError::InvalidOperation)
        }
    }
}

impl Default for ObjectHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ObjectHeader {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectHeader")
            .field("name", &self.name())
            .field("attached", &self.is_attached())
            .finish()
    }
}
