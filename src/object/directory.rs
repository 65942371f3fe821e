// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Directories
//!
//! A directory maps names to objects and is the only object type that can
//! resolve path segments. Entries are kept behind a spin lock because the
//! namespace is shared by every core.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;

use super::access::{AccessMask, AccessState};
use super::manager::PATH_SEPARATOR;
use super::{KernelObject, ObjectHeader, Parseable};
use crate::error::{KernelError, KernelResult};

/// Named container
pub struct Directory {
    header: ObjectHeader,
    this: Weak<Directory>,
    entries: spin::Mutex<BTreeMap<String, Arc<dyn KernelObject>>>,
}

impl Directory {
    /// Rights a directory accessor may carry: list (READ) and insert (WRITE)
    pub const VALID_ACCESS: AccessMask = AccessMask::READ.union(AccessMask::WRITE);

    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            header: ObjectHeader::new(),
            this: this.clone(),
            entries: spin::Mutex::new(BTreeMap::new()),
        })
    }

    /// Child named `name`
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn KernelObject>> {
        self.entries.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Names of the children, sorted
    pub fn names(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Attach `object` under `name`
    ///
    /// The caller has already validated `name`. The sibling check, the
    /// one-time parent link and the insertion happen under one lock hold.
    pub(crate) fn insert(&self, name: &str, object: Arc<dyn KernelObject>) -> KernelResult<()> {
        let mut entries = self.entries.lock();
        if entries.contains_key(name) {
            return Err(KernelError::AlreadyExists);
        }
        let parent: Weak<dyn KernelObject> = self.this.clone();
        object.header().attach(name, parent)?;
        entries.insert(String::from(name), object);
        Ok(())
    }
}

impl KernelObject for Directory {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn valid_access_mask(&self) -> AccessMask {
        Self::VALID_ACCESS
    }

    fn type_name(&self) -> &'static str {
        "directory"
    }

    fn as_parseable(&self) -> Option<&dyn Parseable> {
        Some(self)
    }
}

impl Parseable for Directory {
    fn parse(
        &self,
        path: &str,
        state: AccessState,
    ) -> KernelResult<(Arc<dyn KernelObject>, AccessState)> {
        let (segment, rest) = match path.split_once(PATH_SEPARATOR) {
            Some((segment, rest)) => (segment, Some(rest)),
            None => (path, None),
        };
        if segment.is_empty() {
            return Err(KernelError::InvalidPath);
        }

        let child = self.lookup(segment).ok_or(KernelError::NotFound)?;
        let state = state.step(child.valid_access_mask());

        match rest {
            None => Ok((child, state)),
            Some(rest) => match child.as_parseable() {
                Some(parser) => parser.parse(rest, state),
                None => Err(KernelError::NotFound),
            },
        }
    }
}
