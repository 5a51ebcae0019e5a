// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The [Loader] façade: the unit of isolation.
//!
//! A loader owns its link table, module registry, id counter, and in-flight
//! load map; two loaders never share state. All operations are synchronous
//! and observe whole, non-interleaved table updates, except [Loader::import]
//! which suspends while the external evaluator runs or while an already
//! in-flight load for the same specifier completes.

use std::{cell::RefCell, rc::Rc};

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::{
    error::{LoaderError, LoaderResult},
    evaluator::{EvaluatedModule, EvaluatorError, ModuleEvaluator},
    link_table::{ChainEnd, LinkTable, PriorBinding},
    module::{ModuleId, ModuleRef},
    pending::PendingLoad,
    registry::ModuleRegistry,
    specifier::{self, Specifier},
};

/// Target of a `set` operation: a module instance handle, or the id of an
/// already-registered instance.
#[derive(Debug, Clone)]
pub enum ModuleTarget {
    Module(ModuleRef),
    Id(ModuleId),
}

impl From<ModuleRef> for ModuleTarget {
    fn from(module: ModuleRef) -> Self {
        ModuleTarget::Module(module)
    }
}

impl From<&ModuleRef> for ModuleTarget {
    fn from(module: &ModuleRef) -> Self {
        ModuleTarget::Module(module.clone())
    }
}

impl From<ModuleId> for ModuleTarget {
    fn from(id: ModuleId) -> Self {
        ModuleTarget::Id(id)
    }
}

/// Link table and registry behind one RefCell, so that every synchronous
/// operation is a single whole borrow and can never observe another
/// operation's update half-applied.
#[derive(Debug, Default)]
struct LoaderState {
    links: LinkTable,
    registry: ModuleRegistry,
}

pub struct Loader {
    name: String,
    evaluator: Rc<dyn ModuleEvaluator>,
    state: RefCell<LoaderState>,
    pending: RefCell<AHashMap<Specifier, Rc<PendingLoad>>>,
}

impl Loader {
    pub fn new(name: impl Into<String>, evaluator: Rc<dyn ModuleEvaluator>) -> Self {
        Self {
            name: name.into(),
            evaluator,
            state: RefCell::default(),
            pending: RefCell::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Import a module, reusing the cached instance when the specifier is
    /// already bound.
    ///
    /// The input must be an absolute specifier, mirroring dynamic import
    /// with no referrer. Alias bindings are followed to their terminal
    /// specifier; a load is started (or joined) for that terminal only. On
    /// success the instance is registered and directly bound in one step;
    /// a failed load leaves no trace, so retrying is safe.
    pub async fn import(&self, specifier: &str) -> LoaderResult<ModuleRef> {
        let canonical = specifier::resolve_specifier(specifier, None).ok_or_else(|| {
            LoaderError::InvalidSpecifier {
                specifier: specifier.to_string(),
            }
        })?;

        // Cached instance, or the terminal specifier to load.
        let terminal = {
            let state = self.state.borrow();
            match state.links.resolve_chain(&canonical)? {
                ChainEnd::Bound(_, module) => return Ok(module),
                ChainEnd::Unbound(terminal) => terminal,
            }
        };

        // Attach to an in-flight load instead of starting a second one.
        // This is also the path a reentrant import of the specifier being
        // loaded takes.
        let waiter = self.pending.borrow().get(&terminal).map(PendingLoad::wait);
        if let Some(waiter) = waiter {
            return waiter.await;
        }

        // Lead a fresh load. The pending entry is visible before the
        // evaluator runs so that reentrant importers attach to it. The
        // guard keeps the entry in sync with this future's lifetime: if
        // the leading future is dropped mid-evaluation, the entry is
        // removed and attached waiters are failed instead of left hanging.
        let load = PendingLoad::new();
        self.pending
            .borrow_mut()
            .insert(terminal.clone(), Rc::clone(&load));
        let guard = LoadGuard {
            loader: self,
            specifier: terminal.clone(),
            load: Rc::clone(&load),
        };
        debug!(loader = %self.name, specifier = %terminal, "loading module");
        let evaluator = Rc::clone(&self.evaluator);
        let evaluated = evaluator.evaluate(self, &terminal).await;

        let outcome = match evaluated {
            Ok(EvaluatedModule { exports, requests }) => {
                // Commit is one whole table update: allocate the id,
                // register the instance, and install the direct binding.
                // This deliberately overwrites any binding installed for
                // the terminal specifier while the load was in flight:
                // last writer wins at commit time.
                let mut state = self.state.borrow_mut();
                let module = state.registry.create(terminal.clone(), exports, requests);
                state.links.set(terminal.clone(), module.clone());
                debug!(loader = %self.name, specifier = %terminal, id = %module.id(), "module loaded");
                Ok(module)
            }
            Err(source) => {
                debug!(loader = %self.name, specifier = %terminal, error = %source, "module load failed");
                Err(LoaderError::ModuleLoad {
                    specifier: terminal,
                    source,
                })
            }
        };
        load.complete(outcome.clone());
        drop(guard);
        outcome
    }

    /// Canonicalize a specifier and report what it currently resolves to.
    ///
    /// Purely advisory: never raises, never creates bindings, never invokes
    /// the evaluator. Reports [None] unless the resolution chain reaches a
    /// direct binding.
    pub fn resolve(&self, specifier: &str, referrer: Option<&str>) -> Option<Specifier> {
        let referrer = referrer.and_then(|referrer| Specifier::parse(referrer).ok());
        let canonical = specifier::resolve_specifier(specifier, referrer.as_ref())?;
        let state = self.state.borrow();
        match state.links.resolve_chain(&canonical) {
            Ok(ChainEnd::Bound(terminal, _)) => Some(terminal),
            Ok(ChainEnd::Unbound(_)) | Err(_) => None,
        }
    }

    /// Get the module instance a canonical specifier resolves to.
    pub fn get(&self, specifier: &Specifier) -> LoaderResult<ModuleRef> {
        let state = self.state.borrow();
        match state.links.resolve_chain(specifier)? {
            ChainEnd::Bound(_, module) => Ok(module),
            ChainEnd::Unbound(_) => Err(LoaderError::UnboundSpecifier {
                specifier: specifier.clone(),
            }),
        }
    }

    /// Bind a specifier directly to a module instance, displacing whatever
    /// binding was there. Reports the displaced binding.
    pub fn set(
        &self,
        specifier: Specifier,
        target: impl Into<ModuleTarget>,
    ) -> LoaderResult<Option<PriorBinding>> {
        let module = match target.into() {
            ModuleTarget::Module(module) => module,
            ModuleTarget::Id(id) => self
                .state
                .borrow()
                .registry
                .get(id)
                .ok_or(LoaderError::UnknownModuleId { id })?,
        };
        debug!(loader = %self.name, specifier = %specifier, id = %module.id(), "rebinding specifier");
        Ok(self.state.borrow_mut().links.set(specifier, module))
    }

    /// Remove the binding for a specifier, reporting what was displaced.
    /// Idempotent: unlinking an unbound specifier reports [None].
    pub fn unlink(&self, specifier: &Specifier) -> Option<PriorBinding> {
        debug!(loader = %self.name, specifier = %specifier, "unlinking specifier");
        self.state.borrow_mut().links.unlink(specifier)
    }

    /// Alias `name` to `target`, so that importing `name` has the same
    /// effect as importing `target`. Fails without touching the table if
    /// the alias would make the resolution chain circular.
    pub fn alias(&self, target: Specifier, name: Specifier) -> LoaderResult<()> {
        debug!(loader = %self.name, target = %target, name = %name, "aliasing specifier");
        self.state.borrow_mut().links.alias(target, name)
    }

    /// The registration specifiers of loaded modules that are still bound,
    /// in registration order. Reserved internal schemes are excluded.
    pub fn specifiers(&self) -> Vec<Specifier> {
        self.enumerate(|specifier, _| specifier)
    }

    /// As [Loader::specifiers], paired with the module instance each
    /// specifier currently resolves to. After a `set`, that instance may
    /// differ from the one originally registered under the specifier.
    pub fn entries(&self) -> Vec<(Specifier, ModuleRef)> {
        self.enumerate(|specifier, module| (specifier, module))
    }

    fn enumerate<T>(&self, item: impl Fn(Specifier, ModuleRef) -> T) -> Vec<T> {
        let state = self.state.borrow();
        // Unlink followed by a reload leaves multiple registry instances
        // sharing one registration specifier; each specifier is reported
        // once, in first-registration order.
        let mut seen = AHashSet::new();
        state
            .registry
            .iter()
            .filter(|module| !specifier::is_reserved(module.specifier()))
            .filter_map(|module| {
                if !seen.insert(module.specifier().clone()) {
                    return None;
                }
                match state.links.resolve_chain(module.specifier()) {
                    Ok(ChainEnd::Bound(_, bound)) => {
                        Some(item(module.specifier().clone(), bound))
                    }
                    // Unlinked or unreachable registration specifiers are
                    // skipped, not faulted: enumeration is advisory.
                    Ok(ChainEnd::Unbound(_)) | Err(_) => None,
                }
            })
            .collect()
    }
}

/// Scopes an in-flight load map entry to the lifetime of the leading
/// import future. On the normal path the guard is dropped right after the
/// outcome is committed and the entry is simply removed; if the leading
/// future is dropped mid-evaluation instead, the guard also fails every
/// attached waiter so a later import of the specifier leads a fresh load.
struct LoadGuard<'a> {
    loader: &'a Loader,
    specifier: Specifier,
    load: Rc<PendingLoad>,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.loader.pending.borrow_mut().remove(&self.specifier);
        self.load.settle_if_pending(|| {
            debug!(loader = %self.loader.name, specifier = %self.specifier, "module load abandoned");
            Err(LoaderError::ModuleLoad {
                specifier: self.specifier.clone(),
                source: EvaluatorError::msg("module load abandoned before completion"),
            })
        });
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
