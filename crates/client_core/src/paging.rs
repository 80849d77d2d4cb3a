use std::fmt;

use shared::{domain::PageToken, protocol::Page};
use tokio::sync::watch;
use tracing::debug;

use crate::loader::{FetchFuture, LoaderSnapshot, PendingFetch, ResourceLoader, ResourceState};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey<S> {
    pub token: PageToken,
    pub scope: S,
}

/// Going back refetches; pages are never cached.
pub struct PaginatedListController<T, S> {
    loader: ResourceLoader<PageKey<S>, Page<T>>,
    token_stack: Vec<PageToken>,
    current: PageToken,
    scope: S,
}

impl<T, S> PaginatedListController<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    pub fn new<F>(scope: S, fetch: F) -> Self
    where
        F: Fn(PageKey<S>) -> FetchFuture<Page<T>> + Send + Sync + 'static,
    {
        Self {
            loader: ResourceLoader::new(fetch),
            token_stack: Vec::new(),
            current: PageToken::first(),
            scope,
        }
    }

    pub fn dependency_key(&self) -> PageKey<S> {
        PageKey {
            token: self.current.clone(),
            scope: self.scope.clone(),
        }
    }

    pub fn observe(&self) -> Option<PendingFetch> {
        self.loader.observe(self.dependency_key())
    }

    pub fn set_scope(&mut self, scope: S) -> Option<PendingFetch> {
        self.scope = scope;
        self.observe()
    }

    pub fn go_next(&mut self) -> Option<PendingFetch> {
        let next = self.next_token();
        if next.is_empty() {
            debug!(current = %self.current, "no next page to move to");
            return None;
        }

        let left = std::mem::replace(&mut self.current, next);
        self.token_stack.push(left);
        debug!(current = %self.current, depth = self.token_stack.len(), "moved to next page");
        self.observe()
    }

    pub fn go_prev(&mut self) -> Option<PendingFetch> {
        let previous = self.token_stack.pop()?;
        self.current = previous;
        debug!(current = %self.current, depth = self.token_stack.len(), "moved to previous page");
        self.observe()
    }

    pub fn retry(&self) -> Option<PendingFetch> {
        self.loader.refetch()
    }

    pub fn next_token(&self) -> PageToken {
        self.loader.with_state(|state| match state {
            ResourceState::Ready(page) => page.next_token.clone(),
            _ => PageToken::first(),
        })
    }

    pub fn can_go_next(&self) -> bool {
        !self.loader.is_loading() && !self.next_token().is_empty()
    }

    pub fn can_go_prev(&self) -> bool {
        !self.loader.is_loading() && !self.token_stack.is_empty()
    }

    pub fn items(&self) -> Vec<T> {
        self.loader
            .with_state(|state| state.data().map(|page| page.items.clone()))
            .unwrap_or_default()
    }

    pub fn state(&self) -> ResourceState<Page<T>> {
        self.loader.state()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot<PageKey<S>, Page<T>>> {
        self.loader.subscribe()
    }

    pub fn token_stack(&self) -> &[PageToken] {
        &self.token_stack
    }

    pub fn current_token(&self) -> &PageToken {
        &self.current
    }

    pub fn scope(&self) -> &S {
        &self.scope
    }

    pub fn page_number(&self) -> usize {
        self.token_stack.len() + 1
    }
}

#[cfg(test)]
#[path = "tests/paging_tests.rs"]
mod tests;
