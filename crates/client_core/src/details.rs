use std::sync::Arc;

use futures::FutureExt;
use shared::{
    domain::{FileRoute, FileSummary, UserId},
    error::validate_name,
};
use tokio::sync::watch;
use tracing::info;

use crate::{
    error::FetchError,
    loader::{LoaderSnapshot, PendingFetch, ResourceLoader, ResourceState},
    transport::FileShareApi,
};

pub type FileKey = (FileRoute, UserId);

pub struct FileDetailController {
    api: Arc<dyn FileShareApi>,
    loader: ResourceLoader<FileKey, Option<FileSummary>>,
    route: FileRoute,
    user_id: UserId,
}

impl FileDetailController {
    pub fn new(api: Arc<dyn FileShareApi>, user_id: UserId, route: FileRoute) -> Self {
        let fetch_api = Arc::clone(&api);
        let loader = ResourceLoader::new(move |(route, user_id): FileKey| {
            let api = Arc::clone(&fetch_api);
            async move {
                match route {
                    FileRoute::New => Ok(None),
                    FileRoute::Existing(file_id) => {
                        api.get_file(&user_id, &file_id).await.map(Some)
                    }
                }
            }
            .boxed()
        });

        Self {
            api,
            loader,
            route,
            user_id,
        }
    }

    pub fn dependency_key(&self) -> FileKey {
        (self.route.clone(), self.user_id.clone())
    }

    pub fn observe(&self) -> Option<PendingFetch> {
        self.loader.observe(self.dependency_key())
    }

    pub fn navigate(&mut self, route: FileRoute) -> Option<PendingFetch> {
        self.route = route;
        self.observe()
    }

    pub fn set_user(&mut self, user_id: UserId) -> Option<PendingFetch> {
        self.user_id = user_id;
        self.observe()
    }

    pub fn retry(&self) -> Option<PendingFetch> {
        self.loader.refetch()
    }

    pub async fn create(&self, name: &str) -> Result<FileSummary, FetchError> {
        let name = validate_name("file name", name)?;
        let file = self.api.create_file(&self.user_id, name).await?;
        info!(file_id = %file.id, "created file");
        self.loader.mutate(Some(file.clone()));
        Ok(file)
    }

    pub fn file(&self) -> Option<FileSummary> {
        self.loader
            .with_state(|state| state.data().cloned().flatten())
    }

    pub fn shows_create_form(&self) -> bool {
        self.loader
            .with_state(|state| matches!(state, ResourceState::Ready(None)))
    }

    pub fn state(&self) -> ResourceState<Option<FileSummary>> {
        self.loader.state()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoaderSnapshot<FileKey, Option<FileSummary>>> {
        self.loader.subscribe()
    }

    pub fn route(&self) -> &FileRoute {
        &self.route
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

#[cfg(test)]
#[path = "tests/details_tests.rs"]
mod tests;
