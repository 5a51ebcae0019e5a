// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The link table: specifier → binding.
//!
//! A binding is either a direct reference to a module instance or an alias
//! to another specifier. Resolution follows alias bindings transitively
//! until a direct binding or an unbound specifier is reached. Chains are
//! walked iteratively with a step counter; [MAX_CHAIN_LEN] bounds
//! adversarial or accidental deep chains.

use ahash::AHashMap;

use crate::{
    error::{LoaderError, LoaderResult},
    module::ModuleRef,
    specifier::Specifier,
};

/// Hard ceiling on resolution chain length.
pub const MAX_CHAIN_LEN: usize = 1000;

/// The link table's record for one specifier.
#[derive(Debug, Clone)]
pub(crate) enum Binding {
    Direct(ModuleRef),
    Alias(Specifier),
}

/// A displaced binding, as returned by `set` and `unlink`: the old module
/// instance if the binding was direct, or the old alias target.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorBinding {
    Module(ModuleRef),
    Alias(Specifier),
}

impl From<Binding> for PriorBinding {
    fn from(binding: Binding) -> Self {
        match binding {
            Binding::Direct(module) => PriorBinding::Module(module),
            Binding::Alias(target) => PriorBinding::Alias(target),
        }
    }
}

/// Where a resolution chain ended: at a direct binding, or at the first
/// specifier with no binding at all. Either way the terminal canonical
/// specifier is reported.
#[derive(Debug, Clone)]
pub(crate) enum ChainEnd {
    Bound(Specifier, ModuleRef),
    Unbound(Specifier),
}

#[derive(Debug, Default)]
pub(crate) struct LinkTable {
    bindings: AHashMap<Specifier, Binding>,
}

impl LinkTable {
    /// Follow the alias chain from an already-canonical specifier.
    pub(crate) fn resolve_chain(&self, specifier: &Specifier) -> LoaderResult<ChainEnd> {
        let mut current = specifier;
        for _ in 0..MAX_CHAIN_LEN {
            match self.bindings.get(current) {
                Some(Binding::Direct(module)) => {
                    return Ok(ChainEnd::Bound(current.clone(), module.clone()));
                }
                Some(Binding::Alias(target)) => current = target,
                None => return Ok(ChainEnd::Unbound(current.clone())),
            }
        }
        Err(LoaderError::ChainTooLong {
            specifier: specifier.clone(),
        })
    }

    /// Install a direct binding, displacing whatever was there. A direct
    /// binding terminates chains, so overwriting cannot create a cycle.
    pub(crate) fn set(&mut self, specifier: Specifier, module: ModuleRef) -> Option<PriorBinding> {
        self.bindings
            .insert(specifier, Binding::Direct(module))
            .map(PriorBinding::from)
    }

    /// Remove the binding for a specifier. Idempotent.
    pub(crate) fn unlink(&mut self, specifier: &Specifier) -> Option<PriorBinding> {
        self.bindings.remove(specifier).map(PriorBinding::from)
    }

    /// Install `name -> Alias(target)`.
    ///
    /// The chain starting at `target` is walked first; if `name` already
    /// appears in it (including `target == name`), the alias would be
    /// circular and the table is left unchanged.
    pub(crate) fn alias(&mut self, target: Specifier, name: Specifier) -> LoaderResult<()> {
        let mut current = &target;
        let mut steps = 0;
        loop {
            if *current == name {
                return Err(LoaderError::Cycle {
                    target: target.clone(),
                    name,
                });
            }
            if steps == MAX_CHAIN_LEN {
                return Err(LoaderError::ChainTooLong {
                    specifier: target.clone(),
                });
            }
            match self.bindings.get(current) {
                Some(Binding::Alias(next)) => {
                    current = next;
                    steps += 1;
                }
                _ => break,
            }
        }
        self.bindings.insert(name, Binding::Alias(target));
        Ok(())
    }
}
