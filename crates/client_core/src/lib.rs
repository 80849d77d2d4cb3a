use std::sync::Arc;

use futures::FutureExt;
use shared::{
    domain::{FileSummary, PageToken, UserId, UserSummary},
    error::validate_name,
};
use tracing::info;

pub mod details;
pub mod error;
pub mod loader;
pub mod paging;
pub mod scroll;
pub mod transport;

pub use details::FileDetailController;
pub use error::{FetchError, ScrollError};
pub use loader::{FetchFuture, LoaderSnapshot, PendingFetch, ResourceLoader, ResourceState};
pub use paging::{PageKey, PaginatedListController};
pub use scroll::{
    AccumulatingScrollController, FetchMore, ScrollListener, ScrollMetrics, ScrollState,
    DEFAULT_SCROLL_EPSILON,
};
pub use transport::{ApiResponse, FileShareApi, HttpFileShareClient, StatusPolicy};

pub const DEFAULT_FILES_PAGE_SIZE: u32 = 3;

pub type FilesController = PaginatedListController<FileSummary, UserId>;
pub type UsersController = AccumulatingScrollController<UserSummary>;

pub fn files_controller(
    api: Arc<dyn FileShareApi>,
    user_id: UserId,
    page_size: u32,
) -> FilesController {
    PaginatedListController::new(user_id, move |key: PageKey<UserId>| {
        let api = Arc::clone(&api);
        async move { api.list_files(&key.scope, &key.token, page_size).await }.boxed()
    })
}

pub fn users_controller(api: Arc<dyn FileShareApi>, epsilon: f64) -> UsersController {
    AccumulatingScrollController::new(
        move |token: PageToken| {
            let api = Arc::clone(&api);
            async move { api.list_users(&token).await }.boxed()
        },
        epsilon,
    )
}

/// Registers a new user after the form checks pass.
pub async fn sign_up(api: &dyn FileShareApi, name: &str) -> Result<UserSummary, FetchError> {
    let name = validate_name("name", name)?;
    let user = api.create_user(name).await?;
    info!(user_id = %user.id, "signed up");
    Ok(user)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
