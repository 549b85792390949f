// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-key in-flight tracking for loader invocations.
//!
//! Every loader call, whether it serves a synchronous miss or a background refresh, runs while
//! holding a [`RefreshTicket`] for its key. Claiming a ticket is a check-and-set under the
//! namespace's ticket lock, so at most one loader per key is ever in flight. Callers that find a
//! ticket already held receive a [`Waiter`] that resolves once the ticket is released.

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::watch;

type Tickets = Arc<Mutex<HashMap<String, watch::Receiver<()>>>>;

/// The in-flight table of one namespace.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    tickets: Tickets,
}

/// Outcome of [`InFlight::try_claim`].
#[derive(Debug)]
pub(crate) enum Claim {
    /// The caller now owns the only ticket for the key.
    Acquired(RefreshTicket),
    /// Another caller holds the ticket.
    Busy(Waiter),
}

impl InFlight {
    /// Claims the ticket for `key`, or returns a waiter for the current holder.
    pub(crate) fn try_claim(&self, namespace: &Arc<str>, key: &str) -> Claim {
        let mut tickets = self.tickets.lock();

        if let Some(receiver) = tickets.get(key) {
            return Claim::Busy(Waiter(receiver.clone()));
        }

        let (sender, receiver) = watch::channel(());
        tickets.insert(key.to_owned(), receiver);

        Claim::Acquired(RefreshTicket {
            namespace: Arc::clone(namespace),
            key: key.to_owned(),
            tickets: Arc::clone(&self.tickets),
            _released: sender,
        })
    }

    /// Returns `true` while a loader for `key` is running.
    pub(crate) fn is_in_flight(&self, key: &str) -> bool {
        self.tickets.lock().contains_key(key)
    }

    /// Returns the number of loaders currently running in this namespace.
    pub(crate) fn len(&self) -> usize {
        self.tickets.lock().len()
    }
}

/// Exclusive right to run the loader for one `(namespace, key)` pair.
///
/// Dropping the ticket releases the key and wakes every [`Waiter`]. This happens on success,
/// on failure, when the owning future is cancelled, and while unwinding from a loader panic.
pub(crate) struct RefreshTicket {
    namespace: Arc<str>,
    key: String,
    tickets: Tickets,
    // Receivers observe the channel closing when this sender is dropped.
    _released: watch::Sender<()>,
}

impl RefreshTicket {
    pub(crate) fn namespace(&self) -> &str {
        &self.namespace
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }
}

impl Debug for RefreshTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTicket")
            .field("namespace", &self.namespace)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl Drop for RefreshTicket {
    fn drop(&mut self) {
        self.tickets.lock().remove(&self.key);
    }
}

/// Resolves once the ticket it was created for has been released.
#[derive(Debug)]
pub(crate) struct Waiter(watch::Receiver<()>);

impl Waiter {
    pub(crate) async fn released(mut self) {
        // No value is ever sent, so this only returns once the sender is dropped.
        while self.0.changed().await.is_ok() {}
    }
}
