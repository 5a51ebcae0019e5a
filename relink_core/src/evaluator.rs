// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The external module evaluator collaborator.
//!
//! The loader core owns identity, caching, and the link table. Fetching,
//! compiling, and executing module code belongs to the host and is reached
//! only through [ModuleEvaluator].

use std::{error::Error, fmt, sync::Arc};

use futures::future::LocalBoxFuture;

use crate::{
    loader::Loader,
    module::{Exports, Request},
    specifier::Specifier,
};

/// What the evaluator reports for a successfully evaluated module: the live
/// exports handle and the dependency specifiers encountered, in declaration
/// order.
#[derive(Debug)]
pub struct EvaluatedModule {
    pub exports: Exports,
    pub requests: Vec<Request>,
}

/// A fault reported by the evaluator.
///
/// Reference-counted so that one failure can be handed to every importer
/// attached to the failed load.
#[derive(Clone)]
pub struct EvaluatorError(Arc<dyn Error + Send + Sync>);

impl EvaluatorError {
    pub fn new(source: impl Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(source))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Self(Arc::new(Message(message.into())))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct Message(String);

impl fmt::Debug for EvaluatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for EvaluatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for EvaluatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

pub type EvaluateFuture<'a> = LocalBoxFuture<'a, Result<EvaluatedModule, EvaluatorError>>;

/// Fetches, compiles, and executes module code on behalf of the loader.
///
/// `evaluate` is handed the owning [Loader] because module top-level code
/// may call back into it before its own load completes (reentrancy). The
/// loader guarantees that during this window `get` of the specifier being
/// loaded fails and `import` of it attaches to the in-flight load.
///
/// An evaluator must report the same dependency requests for repeated
/// evaluations of one specifier; the loader does not re-check them.
pub trait ModuleEvaluator {
    fn evaluate<'a>(&'a self, loader: &'a Loader, specifier: &'a Specifier) -> EvaluateFuture<'a>;
}
