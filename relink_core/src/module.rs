// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module instances and their handles.
//!
//! A [ModuleRef] identifies one loaded module instance. The instance itself
//! is immutable: its id, creation specifier, and request list never change.
//! Only the object behind its [Exports] handle may be mutated, by module
//! code, through interior mutability; the handle itself is never replaced.

use std::{any::Any, fmt, rc::Rc};

use crate::specifier::Specifier;

/// Opaque module instance identifier.
///
/// Unique for the lifetime of the owning loader, allocated monotonically and
/// never reused, even after the instance is unlinked everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(u64);

impl ModuleId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The module type a dependency request asked for, from an import attribute
/// such as `with { type: "json" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestedModuleType {
    /// No attribute; a plain module request.
    #[default]
    None,
    Json,
    /// An attribute value this crate does not give meaning to. The evaluator
    /// may.
    Other(String),
}

/// One dependency request recorded at module creation.
///
/// The specifier is kept as written in the module source, pre-normalization.
/// The request list of an instance is fixed in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub specifier: String,
    pub requested_type: RequestedModuleType,
}

impl Request {
    pub fn new(specifier: impl Into<String>) -> Self {
        Self {
            specifier: specifier.into(),
            requested_type: RequestedModuleType::None,
        }
    }

    pub fn with_type(specifier: impl Into<String>, requested_type: RequestedModuleType) -> Self {
        Self {
            specifier: specifier.into(),
            requested_type,
        }
    }
}

/// Live handle to a module's export surface.
///
/// The loader core never interprets the exports object; it captures the
/// handle at load commit and hands out clones. Equality is handle identity:
/// two handles are equal iff they alias the same object, regardless of that
/// object's current contents.
#[derive(Clone)]
pub struct Exports(Rc<dyn Any>);

impl Exports {
    pub fn new<T: Any>(exports: T) -> Self {
        Self(Rc::new(exports))
    }

    /// Borrow the underlying exports object, if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Handle identity.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Exports {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Exports {}

impl fmt::Debug for Exports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Exports(..)")
    }
}

#[derive(Debug)]
struct ModuleInstance {
    id: ModuleId,
    specifier: Specifier,
    exports: Exports,
    requests: Box<[Request]>,
}

/// Reference to one loaded module instance.
///
/// Note that this is only a reference to the instance; the specifier it was
/// created under can be linked to another instance at any time. Equality is
/// instance identity: clones of one [ModuleRef] compare equal, two instances
/// with identical contents do not.
#[derive(Clone)]
pub struct ModuleRef(Rc<ModuleInstance>);

impl ModuleRef {
    pub(crate) fn new(
        id: ModuleId,
        specifier: Specifier,
        exports: Exports,
        requests: Vec<Request>,
    ) -> Self {
        Self(Rc::new(ModuleInstance {
            id,
            specifier,
            exports,
            requests: requests.into_boxed_slice(),
        }))
    }

    pub fn id(&self) -> ModuleId {
        self.0.id
    }

    /// The canonical specifier the instance was created under. Fixed at
    /// creation; rebinding the specifier does not change it.
    pub fn specifier(&self) -> &Specifier {
        &self.0.specifier
    }

    /// A clone of the live exports handle.
    pub fn exports(&self) -> Exports {
        self.0.exports.clone()
    }

    /// The dependency requests recorded at creation, in declaration order.
    pub fn requests(&self) -> &[Request] {
        &self.0.requests
    }
}

impl PartialEq for ModuleRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ModuleRef {}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRef")
            .field("id", &self.0.id)
            .field("specifier", &self.0.specifier.as_str())
            .finish()
    }
}
