use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures::{Stream, StreamExt};
use shared::{domain::PageToken, protocol::Page};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    error::{FetchError, ScrollError},
    loader::{FetchFuture, ResourceLoader, ResourceState},
};

pub const DEFAULT_SCROLL_EPSILON: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub viewport_height: f64,
    pub scroll_offset: f64,
    pub content_height: f64,
}

impl ScrollMetrics {
    pub fn distance_to_bottom(&self) -> f64 {
        self.content_height - (self.scroll_offset + self.viewport_height)
    }

    pub fn near_bottom(&self, epsilon: f64) -> bool {
        self.distance_to_bottom() <= epsilon
    }

    pub fn at_bottom(viewport_height: f64, content_height: f64) -> Self {
        Self {
            viewport_height,
            scroll_offset: (content_height - viewport_height).max(0.0),
            content_height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrollState<T> {
    pub items: Vec<T>,
    pub token: PageToken,
    pub busy: bool,
    pub started: bool,
    pub loaded: bool,
    pub last_error: Option<FetchError>,
}

impl<T> Default for ScrollState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            token: PageToken::first(),
            busy: false,
            started: false,
            loaded: false,
            last_error: None,
        }
    }
}

impl<T> ScrollState<T> {
    pub fn is_exhausted(&self) -> bool {
        self.loaded && self.token.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchMore {
    Appended { count: usize, exhausted: bool },
    Failed(FetchError),
    Abandoned,
}

struct ScrollInner<T> {
    loader: ResourceLoader<PageToken, Page<T>>,
    state: watch::Sender<ScrollState<T>>,
    epsilon: f64,
    attached: AtomicBool,
}

/// Holds the controller's `busy` flag for one page fetch. Dropping it
/// unreleased (the fetch task was aborted) clears the flag.
struct BusyFlag<T> {
    inner: Arc<ScrollInner<T>>,
    held: bool,
}

impl<T> BusyFlag<T> {
    fn release(mut self, apply: impl FnOnce(&mut ScrollState<T>)) {
        self.held = false;
        self.inner.state.send_modify(|state| {
            state.busy = false;
            apply(state);
        });
    }
}

impl<T> Drop for BusyFlag<T> {
    fn drop(&mut self) {
        if self.held {
            warn!("page fetch dropped before completing");
            self.inner.state.send_modify(|state| state.busy = false);
        }
    }
}

async fn fetch_page<T>(flag: BusyFlag<T>, token: PageToken) -> FetchMore
where
    T: Clone + Send + Sync + 'static,
{
    let loader = flag.inner.loader.clone();
    let applied = loader.load(token.clone()).settled().await;
    let settled = if applied {
        loader.with_state(|state| match state {
            ResourceState::Ready(page) => Some(Ok(page.clone())),
            ResourceState::Error(err) => Some(Err(err.clone())),
            _ => None,
        })
    } else {
        None
    };

    let mut outcome = FetchMore::Abandoned;
    flag.release(|state| match settled {
        Some(Ok(page)) => {
            let count = page.items.len();
            state.items.extend(page.items);
            state.token = page.next_token;
            state.loaded = true;
            state.last_error = None;
            outcome = FetchMore::Appended {
                count,
                exhausted: state.token.is_empty(),
            };
        }
        Some(Err(err)) => {
            state.last_error = Some(err.clone());
            outcome = FetchMore::Failed(err);
        }
        None => {}
    });

    match &outcome {
        FetchMore::Appended { count, exhausted } => {
            info!(%token, count, exhausted, "appended page");
        }
        FetchMore::Failed(err) => debug!(%token, error = %err, "page fetch failed"),
        FetchMore::Abandoned => debug!(%token, "page fetch abandoned"),
    }
    outcome
}

pub struct AccumulatingScrollController<T> {
    inner: Arc<ScrollInner<T>>,
}

impl<T> Clone for AccumulatingScrollController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> AccumulatingScrollController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F>(fetch: F, epsilon: f64) -> Self
    where
        F: Fn(PageToken) -> FetchFuture<Page<T>> + Send + Sync + 'static,
    {
        let (state, _) = watch::channel(ScrollState::default());
        Self {
            inner: Arc::new(ScrollInner {
                loader: ResourceLoader::new(fetch),
                state,
                epsilon,
                attached: AtomicBool::new(false),
            }),
        }
    }

    /// Only the first call per controller does anything.
    pub fn initial_fetch(&self) -> Option<JoinHandle<FetchMore>> {
        self.start_fetch(|state| !state.started)
    }

    pub fn fetch_more(&self) -> Option<JoinHandle<FetchMore>> {
        self.start_fetch(|state| state.loaded && !state.token.is_empty())
    }

    pub fn retry(&self) -> Option<JoinHandle<FetchMore>> {
        self.start_fetch(|state| state.last_error.is_some())
    }

    pub fn on_scroll(&self, metrics: ScrollMetrics) -> Option<JoinHandle<FetchMore>> {
        if !metrics.near_bottom(self.inner.epsilon) {
            return None;
        }
        self.fetch_more()
    }

    /// Routes scroll notifications into [`on_scroll`](Self::on_scroll) until
    /// the returned guard is dropped. Allowed once per controller.
    pub fn attach<N>(&self, notifications: N) -> Result<ScrollListener, ScrollError>
    where
        N: Stream<Item = ScrollMetrics> + Send + 'static,
    {
        if self.inner.attached.swap(true, Ordering::AcqRel) {
            return Err(ScrollError::AlreadyAttached);
        }

        let controller = self.clone();
        let task = tokio::spawn(async move {
            let mut notifications = std::pin::pin!(notifications);
            while let Some(metrics) = notifications.next().await {
                controller.on_scroll(metrics);
            }
            debug!("scroll notification source closed");
        });
        Ok(ScrollListener { task })
    }

    pub fn snapshot(&self) -> ScrollState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.inner.state.borrow().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn token(&self) -> PageToken {
        self.inner.state.borrow().token.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.state.borrow().busy
    }

    pub fn is_exhausted(&self) -> bool {
        self.inner.state.borrow().is_exhausted()
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.inner.state.borrow().last_error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScrollState<T>> {
        self.inner.state.subscribe()
    }

    fn start_fetch(
        &self,
        admit: impl FnOnce(&ScrollState<T>) -> bool,
    ) -> Option<JoinHandle<FetchMore>> {
        let mut token = None;
        self.inner.state.send_if_modified(|state| {
            if state.busy || !admit(state) {
                return false;
            }
            state.busy = true;
            state.started = true;
            token = Some(state.token.clone());
            true
        });

        let Some(token) = token else {
            debug!("page fetch not started");
            return None;
        };

        let flag = BusyFlag {
            inner: Arc::clone(&self.inner),
            held: true,
        };
        Some(tokio::spawn(fetch_page(flag, token)))
    }
}

#[derive(Debug)]
pub struct ScrollListener {
    task: JoinHandle<()>,
}

impl ScrollListener {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ScrollListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "tests/scroll_tests.rs"]
mod tests;
