// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Runtime abstraction for background refresh tasks.

use std::{fmt::Debug, pin::Pin, sync::Arc};

/// A boxed future handed to a custom spawner.
pub type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs detached background work such as stale-entry refreshes.
///
/// Refreshes are fire-and-forget: the spawner receives a future and is expected to drive it to
/// completion without anyone awaiting the result.
///
/// # Examples
///
/// ```
/// use freshet::Spawner;
///
/// let tokio = Spawner::new_tokio();
///
/// let on_threads = Spawner::new_custom(|work| {
///     std::thread::spawn(move || futures::executor::block_on(work));
/// });
/// ```
#[derive(Clone, Default)]
pub struct Spawner(SpawnerKind);

#[derive(Clone, Default)]
enum SpawnerKind {
    #[default]
    Tokio,
    Custom(Arc<dyn Fn(BoxedFuture) + Send + Sync>),
}

impl Debug for Spawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            SpawnerKind::Tokio => f.write_str("Spawner::Tokio"),
            SpawnerKind::Custom(_) => f.write_str("Spawner::Custom"),
        }
    }
}

impl Spawner {
    /// Spawns on the ambient Tokio runtime.
    ///
    /// Work handed over while no Tokio runtime is running on the current thread is dropped, so a
    /// stale read outside a runtime skips its refresh.
    #[must_use]
    pub fn new_tokio() -> Self {
        Self(SpawnerKind::Tokio)
    }

    /// Spawns through a caller-provided closure.
    pub fn new_custom<F>(f: F) -> Self
    where
        F: Fn(BoxedFuture) + Send + Sync + 'static,
    {
        Self(SpawnerKind::Custom(Arc::new(f)))
    }

    /// Hands `work` to the runtime. Returns `false` if it was dropped instead.
    pub(crate) fn spawn<T>(&self, work: T) -> bool
    where
        T: Future<Output = ()> + Send + 'static,
    {
        match &self.0 {
            SpawnerKind::Tokio => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(work);
                    true
                }
                Err(_) => false,
            },
            SpawnerKind::Custom(spawn) => {
                spawn(Box::pin(work));
                true
            }
        }
    }
}
