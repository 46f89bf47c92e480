//! Snapshot-and-apply state cell for optimistic mutations.
//!
//! A mutation captures the current state, applies its local change and
//! publishes it before the network call starts. If the call fails, or the
//! mutation is dropped before the call returns, the snapshot is published
//! again. Mutations on one cell are serialized.

use std::future::Future;

use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::debug;

use crate::error::FwResult;

pub struct OptimisticCell<S> {
    state: watch::Sender<S>,
    gate: Mutex<()>,
}

impl<S> OptimisticCell<S>
where
    S: Clone + Send + Sync,
{
    pub fn new(initial: S) -> Self {
        let (state, _rx) = watch::channel(initial);
        Self {
            state,
            gate: Mutex::new(()),
        }
    }

    pub fn get(&self) -> S {
        self.state.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.state.subscribe()
    }

    /// Overwrite the state once no mutation is in flight.
    pub async fn replace(&self, value: S) {
        let _gate = self.gate.lock().await;
        self.state.send_replace(value);
    }

    /// Immediate, non-optimistic edit. An in-flight mutation that rolls back
    /// will discard it.
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.state.send_modify(f);
    }

    /// Wait for exclusive access and capture the rollback snapshot.
    pub async fn begin(&self) -> Transaction<'_, S> {
        let gate = self.gate.lock().await;
        Transaction {
            state: &self.state,
            snapshot: Some(self.state.borrow().clone()),
            _gate: gate,
        }
    }

    /// Apply `apply` locally, run `call`, roll back if it fails.
    pub async fn mutate<R, Fut>(&self, apply: impl FnOnce(&mut S), call: Fut) -> FwResult<R>
    where
        Fut: Future<Output = FwResult<R>>,
    {
        self.mutate_confirmed(apply, call, |_, _| {}).await
    }

    /// Like [`OptimisticCell::mutate`], folding the server's answer in with `confirm` on success.
    pub async fn mutate_confirmed<R, Fut>(
        &self,
        apply: impl FnOnce(&mut S),
        call: Fut,
        confirm: impl FnOnce(&mut S, &R),
    ) -> FwResult<R>
    where
        Fut: Future<Output = FwResult<R>>,
    {
        let tx = self.begin().await;
        tx.apply(apply);
        match call.await {
            Ok(value) => {
                tx.apply(|s| confirm(s, &value));
                tx.commit();
                Ok(value)
            }
            Err(err) => {
                debug!(error_code = err.code(), "optimistic mutation failed, rolling back");
                tx.rollback();
                Err(err)
            }
        }
    }
}

/// Exclusive optimistic edit in progress; rolls back unless committed.
pub struct Transaction<'a, S> {
    state: &'a watch::Sender<S>,
    snapshot: Option<S>,
    _gate: MutexGuard<'a, ()>,
}

impl<S> Transaction<'_, S> {
    /// Apply and publish a local change.
    pub fn apply(&self, f: impl FnOnce(&mut S)) {
        self.state.send_modify(f);
    }

    pub fn current<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.borrow())
    }

    /// State as it was when the transaction began.
    pub fn snapshot(&self) -> Option<&S> {
        self.snapshot.as_ref()
    }

    pub fn commit(mut self) {
        self.snapshot = None;
    }

    pub fn rollback(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.state.send_replace(snapshot);
        }
    }
}

impl<S> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        self.restore();
    }
}
