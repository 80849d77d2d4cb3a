use std::{fmt, panic::AssertUnwindSafe, sync::Arc};

use futures::{future::BoxFuture, FutureExt};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, warn};

use crate::error::FetchError;

pub type FetchFuture<T> = BoxFuture<'static, Result<T, FetchError>>;

type FetchFn<K, T> = dyn Fn(K) -> FetchFuture<T> + Send + Sync;

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
    Idle,
    /// `previous` is the last ready payload, kept for display.
    Loading {
        previous: Option<T>,
    },
    Ready(T),
    Error(FetchError),
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        ResourceState::Idle
    }
}

impl<T> ResourceState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResourceState::Loading { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ResourceState::Ready(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ResourceState::Ready(data) => Some(data),
            ResourceState::Loading { previous } => previous.as_ref(),
            ResourceState::Idle | ResourceState::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            ResourceState::Error(err) => Some(err),
            _ => None,
        }
    }

    fn take_data(&mut self) -> Option<T> {
        match std::mem::take(self) {
            ResourceState::Ready(data) => Some(data),
            ResourceState::Loading { previous } => previous,
            ResourceState::Idle | ResourceState::Error(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderSnapshot<K, T> {
    /// 0 until the first fetch is issued.
    pub issued: u64,
    pub key: Option<K>,
    pub state: ResourceState<T>,
}

impl<K, T> Default for LoaderSnapshot<K, T> {
    fn default() -> Self {
        Self {
            issued: 0,
            key: None,
            state: ResourceState::Idle,
        }
    }
}

#[derive(Debug)]
pub struct PendingFetch {
    sequence: u64,
    handle: JoinHandle<bool>,
}

impl PendingFetch {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Whether the result was applied; `false` when a newer fetch
    /// superseded it.
    pub async fn settled(self) -> bool {
        let sequence = self.sequence;
        match self.handle.await {
            Ok(applied) => applied,
            Err(err) => {
                warn!(sequence, error = %err, "fetch task ended without a result");
                false
            }
        }
    }
}

struct LoaderShared<K, T> {
    fetch: Box<FetchFn<K, T>>,
    state: watch::Sender<LoaderSnapshot<K, T>>,
}

impl<K, T> LoaderShared<K, T> {
    fn settle(&self, sequence: u64, result: Result<T, FetchError>) -> bool {
        let applied = self.state.send_if_modified(|snapshot| {
            if snapshot.issued != sequence {
                return false;
            }
            snapshot.state = match result {
                Ok(data) => ResourceState::Ready(data),
                Err(err) => {
                    warn!(sequence, error = %err, "fetch failed");
                    ResourceState::Error(err)
                }
            };
            true
        });

        if !applied {
            debug!(sequence, "discarding superseded fetch result");
        }
        applied
    }
}

pub struct ResourceLoader<K, T> {
    shared: Arc<LoaderShared<K, T>>,
}

impl<K, T> Clone for ResourceLoader<K, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, T> ResourceLoader<K, T>
where
    K: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    pub fn new<F>(fetch: F) -> Self
    where
        F: Fn(K) -> FetchFuture<T> + Send + Sync + 'static,
    {
        let (state, _) = watch::channel(LoaderSnapshot::default());
        Self {
            shared: Arc::new(LoaderShared {
                fetch: Box::new(fetch),
                state,
            }),
        }
    }

    /// Must be called from within a Tokio runtime.
    pub fn observe(&self, key: K) -> Option<PendingFetch> {
        let mut sequence = None;
        self.shared.state.send_if_modified(|snapshot| {
            if snapshot.key.as_ref() == Some(&key) {
                return false;
            }
            sequence = Some(advance(snapshot, &key));
            true
        });
        sequence.map(|sequence| self.spawn(key, sequence))
    }

    pub fn load(&self, key: K) -> PendingFetch {
        let mut sequence = 0;
        self.shared
            .state
            .send_modify(|snapshot| sequence = advance(snapshot, &key));
        self.spawn(key, sequence)
    }

    pub fn refetch(&self) -> Option<PendingFetch> {
        let key = self.shared.state.borrow().key.clone()?;
        Some(self.load(key))
    }

    /// A fetch still in flight for the current key overwrites this value.
    pub fn mutate(&self, data: T) {
        self.shared.state.send_modify(|snapshot| {
            snapshot.state = ResourceState::Ready(data);
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot<K, T>> {
        self.shared.state.subscribe()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&ResourceState<T>) -> R) -> R {
        f(&self.shared.state.borrow().state)
    }

    pub fn state(&self) -> ResourceState<T>
    where
        T: Clone,
    {
        self.with_state(ResourceState::clone)
    }

    pub fn is_loading(&self) -> bool {
        self.with_state(ResourceState::is_loading)
    }

    pub fn issued(&self) -> u64 {
        self.shared.state.borrow().issued
    }

    pub fn key(&self) -> Option<K> {
        self.shared.state.borrow().key.clone()
    }

    fn spawn(&self, key: K, sequence: u64) -> PendingFetch {
        debug!(sequence, ?key, "issuing fetch");
        let fetch = (self.shared.fetch)(key);
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(fetch).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Panicked),
            };
            shared.settle(sequence, result)
        });
        PendingFetch { sequence, handle }
    }
}

fn advance<K: Clone, T>(snapshot: &mut LoaderSnapshot<K, T>, key: &K) -> u64 {
    snapshot.issued += 1;
    snapshot.key = Some(key.clone());
    let previous = snapshot.state.take_data();
    snapshot.state = ResourceState::Loading { previous };
    snapshot.issued
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
