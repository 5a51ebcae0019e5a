// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::{
    evaluator::EvaluatorError, link_table::MAX_CHAIN_LEN, module::ModuleId, specifier::Specifier,
};

pub type LoaderResult<T> = Result<T, LoaderError>;

/// Faults raised by loader operations.
///
/// Every variant is cheaply cloneable so that one failed load can reject
/// every importer attached to it. `resolve()` never raises; it reports
/// absence as [None] instead.
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// The input to `import` (or to normalization with no usable referrer)
    /// is not an absolute specifier.
    #[error("invalid module specifier {specifier:?}")]
    InvalidSpecifier { specifier: String },

    /// `get` found no reachable Direct binding for the specifier.
    #[error("no module is bound for specifier {specifier}")]
    UnboundSpecifier { specifier: Specifier },

    /// The requested `alias` would make the resolution chain circular.
    #[error("aliasing {name} to {target} would create a specifier cycle")]
    Cycle { target: Specifier, name: Specifier },

    /// A resolution chain exceeded the hard ceiling.
    #[error("specifier chain starting at {specifier} exceeds {} links", MAX_CHAIN_LEN)]
    ChainTooLong { specifier: Specifier },

    /// `set` was handed a module id no instance is registered under.
    #[error("no module instance is registered under id {id}")]
    UnknownModuleId { id: ModuleId },

    /// The external evaluator failed; the attempted specifier is left with
    /// no binding and no registry entry.
    #[error("evaluation of module {specifier} failed")]
    ModuleLoad {
        specifier: Specifier,
        #[source]
        source: EvaluatorError,
    },
}
