// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of created module instances.
//!
//! Insertion order is the registration order and drives stable enumeration,
//! independent of how many specifiers currently bind to an instance.

use indexmap::IndexMap;

use crate::{
    module::{Exports, ModuleId, ModuleRef, Request},
    specifier::Specifier,
};

#[derive(Debug, Default)]
pub(crate) struct ModuleRegistry {
    next_id: u64,
    modules: IndexMap<ModuleId, ModuleRef>,
}

impl ModuleRegistry {
    /// Allocate the next [ModuleId] and register a fresh instance under it.
    ///
    /// Ids are only allocated here, at load commit, so a failed load burns
    /// no ids and leaves no entry behind.
    pub(crate) fn create(
        &mut self,
        specifier: Specifier,
        exports: Exports,
        requests: Vec<Request>,
    ) -> ModuleRef {
        let id = ModuleId::from_raw(self.next_id);
        self.next_id += 1;
        let module = ModuleRef::new(id, specifier, exports, requests);
        let previous = self.modules.insert(id, module.clone());
        debug_assert!(previous.is_none(), "module id allocated twice");
        module
    }

    pub(crate) fn get(&self, id: ModuleId) -> Option<ModuleRef> {
        self.modules.get(&id).cloned()
    }

    /// All registered instances, in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &ModuleRef> {
        self.modules.values()
    }
}
