// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dynamic module resolution and link table.
//!
//! A [Loader] lets a program import modules by specifier, caches the
//! resulting instances, and can later redirect any specifier to a different
//! instance (including a fabricated one) without restarting the program or
//! re-evaluating modules that already hold a reference to the old target.
//! The point of the exercise is test isolation: a dependency of an
//! already-imported production module can be swapped for a fake at runtime.
//!
//! The crate owns specifier normalization, the alias/binding graph, module
//! instance identity, and per-module dependency bookkeeping. Fetching,
//! compiling, and executing module code stays with the host, behind the
//! [ModuleEvaluator] trait.
//!
//! The execution model is single-threaded cooperative: nothing here is
//! `Send`, [Loader::import] is the only suspending operation, and module
//! code running under the evaluator may reenter the loader freely.
//!
//! ```no_run
//! # use std::rc::Rc;
//! # use relink_core::{Loader, ModuleEvaluator};
//! # async fn demo(evaluator: Rc<dyn ModuleEvaluator>) -> relink_core::LoaderResult<()> {
//! let loader = Loader::new("isolated", evaluator);
//! let module = loader.import("file:///app/main.mod").await?;
//! let fake = loader.import("file:///test/fake_dep.mod").await?;
//!
//! // Every later resolution of the dependency sees the fake; `module`
//! // itself is untouched.
//! let dep = loader.resolve("file:///app/dep.mod", None).unwrap();
//! loader.set(dep, &fake)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod evaluator;
mod link_table;
mod loader;
mod module;
mod pending;
mod registry;
mod specifier;

pub use error::{LoaderError, LoaderResult};
pub use evaluator::{EvaluateFuture, EvaluatedModule, EvaluatorError, ModuleEvaluator};
pub use link_table::{MAX_CHAIN_LEN, PriorBinding};
pub use loader::{Loader, ModuleTarget};
pub use module::{Exports, ModuleId, ModuleRef, Request, RequestedModuleType};
pub use specifier::{RESERVED_SCHEMES, Specifier, is_reserved, resolve_specifier};

pub use url::Url;
