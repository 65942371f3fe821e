// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Object Manager
//!
//! Path-based creation and lookup over the namespace tree. Paths are
//! `/`-separated and case-sensitive; at most one leading separator is
//! stripped and no other normalization happens.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use super::access::{AccessMask, AccessState};
use super::directory::Directory;
use super::handle::Accessor;
use super::KernelObject;
use crate::error::{KernelError, KernelResult};

/// Path separator
pub const PATH_SEPARATOR: char = '/';

/// Namespace root and factory
pub struct ObjectManager {
    root: Arc<Directory>,
}

impl ObjectManager {
    pub fn new() -> Self {
        Self {
            root: Directory::new(),
        }
    }

    /// Accessor to the root directory with every right it allows
    pub fn root(&self) -> Accessor<Directory> {
        Accessor::new(self.root.clone(), Directory::VALID_ACCESS)
    }

    /// Create an empty directory under `parent` (default: root)
    pub fn create_directory(
        &self,
        name: &str,
        parent: Option<&Accessor<Directory>>,
    ) -> KernelResult<Accessor<Directory>> {
        self.create_object(Directory::new(), name, parent)
    }

    /// Attach `object` under `parent` (default: root) as `name`
    ///
    /// The parent accessor must carry `WRITE`. The returned accessor holds
    /// every right the object declares valid.
    pub fn create_object<T: KernelObject>(
        &self,
        object: Arc<T>,
        name: &str,
        parent: Option<&Accessor<Directory>>,
    ) -> KernelResult<Accessor<T>> {
        validate_name(name)?;

        let parent = match parent {
            Some(parent) => {
                parent.check_access(AccessMask::WRITE)?;
                parent.object().clone()
            }
            None => self.root.clone(),
        };

        let granted = object.valid_access_mask();
        parent.insert(name, object.clone())?;
        log::debug!("object: created {} '{}'", object.type_name(), name);

        Ok(Accessor::new(object, granted))
    }

    /// Open the directory at `path`
    pub fn open_directory(
        &self,
        path: &str,
        desired: AccessMask,
        parent: Option<&Accessor<Directory>>,
    ) -> KernelResult<Accessor<Directory>> {
        self.open_object(path, desired, parent)
    }

    /// Open the object of type `T` at `path` relative to `parent`
    /// (default: root)
    ///
    /// A missing entry and an entry of another type both yield `NotFound`.
    pub fn open_object<T: KernelObject>(
        &self,
        path: &str,
        desired: AccessMask,
        parent: Option<&Accessor<Directory>>,
    ) -> KernelResult<Accessor<T>> {
        let parent: Arc<dyn KernelObject> =
            parent.map_or_else(|| self.root.clone(), |parent| parent.object().clone());
        self.open_object_from(&parent, path, desired)
    }

    /// Like [`open_object`](Self::open_object), but a missing object is
    /// `Ok(None)` rather than an error
    pub fn try_open_object<T: KernelObject>(
        &self,
        path: &str,
        desired: AccessMask,
        parent: Option<&Accessor<Directory>>,
    ) -> KernelResult<Option<Accessor<T>>> {
        match self.open_object(path, desired, parent) {
            Ok(accessor) => Ok(Some(accessor)),
            Err(KernelError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolve `path` against an arbitrary object
    ///
    /// Fails with `InvalidPath` when `parent` cannot parse paths.
    pub fn open_object_from<T: KernelObject>(
        &self,
        parent: &Arc<dyn KernelObject>,
        path: &str,
        desired: AccessMask,
    ) -> KernelResult<Accessor<T>> {
        let (object, state) = resolve(parent, path, desired)?;
        Accessor::new(object, state.granted())
            .downcast::<T>()
            .map_err(|_| KernelError::NotFound)
    }

    /// Absolute path of `object`, `/` for the root
    ///
    /// Unattached objects also report `/`.
    pub fn full_path(&self, object: &dyn KernelObject) -> String {
        let mut names: Vec<String> = Vec::new();
        if object.header().is_attached() {
            names.push(String::from(object.header().name()));
        }

        let mut cursor = object.header().parent();
        while let Some(current) = cursor {
            if !current.header().is_attached() {
                break;
            }
            names.push(String::from(current.header().name()));
            cursor = current.header().parent();
        }

        if names.is_empty() {
            return String::from("/");
        }

        let mut path = String::new();
        for name in names.iter().rev() {
            path.push(PATH_SEPARATOR);
            path.push_str(name);
        }
        path
    }
}

impl Default for ObjectManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Names are non-empty and never contain the separator
fn validate_name(name: &str) -> KernelResult<()> {
    if name.is_empty() || name.contains(PATH_SEPARATOR) {
        Err(KernelError::InvalidPath)
    } else {
        Ok(())
    }
}

fn resolve(
    parent: &Arc<dyn KernelObject>,
    path: &str,
    desired: AccessMask,
) -> KernelResult<(Arc<dyn KernelObject>, AccessState)> {
    let path = path.strip_prefix(PATH_SEPARATOR).unwrap_or(path);
    let state = AccessState::new(desired);

    let parser = parent.as_parseable().ok_or(KernelError::InvalidPath)?;
    if path.is_empty() {
        return Ok((parent.clone(), state.step(parent.valid_access_mask())));
    }
    parser.parse(path, state)
}
