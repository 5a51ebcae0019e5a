// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-flight load handles.
//!
//! Concurrent imports of one specifier share a single underlying load: the
//! first importer leads it, late arrivals attach to the shared [PendingLoad]
//! and are all settled with the identical outcome when the leader commits.

use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use crate::{error::LoaderResult, module::ModuleRef};

#[derive(Debug, Default)]
pub(crate) struct PendingLoad {
    state: RefCell<PendingState>,
}

#[derive(Debug, Default)]
struct PendingState {
    outcome: Option<LoaderResult<ModuleRef>>,
    wakers: Vec<Waker>,
}

impl PendingLoad {
    pub(crate) fn new() -> Rc<Self> {
        Rc::default()
    }

    /// Attach a waiter to this load.
    pub(crate) fn wait(self: &Rc<Self>) -> LoadWaiter {
        LoadWaiter {
            load: Rc::clone(self),
        }
    }

    /// Settle the load and wake every attached waiter. Called exactly once,
    /// by the leading importer.
    pub(crate) fn complete(&self, outcome: LoaderResult<ModuleRef>) {
        let wakers = {
            let mut state = self.state.borrow_mut();
            debug_assert!(state.outcome.is_none(), "pending load settled twice");
            state.outcome = Some(outcome);
            std::mem::take(&mut state.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
    }

    /// Settle the load with `outcome` only if it is still unsettled. Used
    /// when the leading importer is dropped mid-evaluation: waiters observe
    /// the abandonment instead of hanging on a load nobody drives.
    pub(crate) fn settle_if_pending(&self, outcome: impl FnOnce() -> LoaderResult<ModuleRef>) {
        if self.state.borrow().outcome.is_some() {
            return;
        }
        self.complete(outcome());
    }
}

/// Future of an attached importer; yields the leader's outcome.
pub(crate) struct LoadWaiter {
    load: Rc<PendingLoad>,
}

impl Future for LoadWaiter {
    type Output = LoaderResult<ModuleRef>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.load.state.borrow_mut();
        if let Some(outcome) = &state.outcome {
            Poll::Ready(outcome.clone())
        } else {
            state.wakers.push(cx.waker().clone());
            Poll::Pending
        }
    }
}
