use super::*;

use async_trait::async_trait;
use shared::{
    domain::{FileId, PageToken, UserSummary},
    error::ValidationError,
    protocol::Page,
};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    GetFile(UserId, FileId),
    CreateFile(UserId, String),
}

#[derive(Default)]
struct FakeApi {
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl FileShareApi for FakeApi {
    async fn list_files(
        &self,
        _user_id: &UserId,
        _token: &PageToken,
        _limit: u32,
    ) -> Result<Page<FileSummary>, FetchError> {
        Ok(Page::new(Vec::new(), PageToken::first()))
    }

    async fn get_file(
        &self,
        user_id: &UserId,
        file_id: &FileId,
    ) -> Result<FileSummary, FetchError> {
        self.calls
            .lock()
            .await
            .push(Call::GetFile(user_id.clone(), file_id.clone()));
        if file_id.as_str() == "missing" {
            return Err(FetchError::Status {
                status: 404,
                body: "not found".to_string(),
            });
        }
        Ok(FileSummary {
            id: file_id.clone(),
            name: format!("{file_id}.txt"),
            role: "owner".to_string(),
        })
    }

    async fn create_file(&self, user_id: &UserId, name: &str) -> Result<FileSummary, FetchError> {
        self.calls
            .lock()
            .await
            .push(Call::CreateFile(user_id.clone(), name.to_string()));
        Ok(FileSummary {
            id: FileId::new("created"),
            name: name.to_string(),
            role: "owner".to_string(),
        })
    }

    async fn list_users(&self, _token: &PageToken) -> Result<Page<UserSummary>, FetchError> {
        Ok(Page::new(Vec::new(), PageToken::first()))
    }

    async fn create_user(&self, name: &str) -> Result<UserSummary, FetchError> {
        Ok(UserSummary {
            id: UserId::new("u-new"),
            name: name.to_string(),
        })
    }
}

fn controller(api: &Arc<FakeApi>, route: FileRoute) -> FileDetailController {
    let api: Arc<dyn FileShareApi> = api.clone();
    FileDetailController::new(api, UserId::new("u1"), route)
}

#[tokio::test]
async fn new_route_shows_create_form_without_request() {
    let api = Arc::new(FakeApi::default());
    let controller = controller(&api, FileRoute::New);

    let pending = controller.observe().expect("first observe loads");
    assert!(pending.settled().await);

    assert!(controller.shows_create_form());
    assert_eq!(controller.file(), None);
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn existing_route_fetches_as_current_user() {
    let api = Arc::new(FakeApi::default());
    let controller = controller(&api, FileRoute::Existing(FileId::new("f1")));

    assert!(controller.observe().expect("load").settled().await);
    assert!(controller.observe().is_none(), "same key must not refetch");

    let file = controller.file().expect("file shown");
    assert_eq!(file.name, "f1.txt");
    assert!(!controller.shows_create_form());
    assert_eq!(
        api.calls().await,
        vec![Call::GetFile(UserId::new("u1"), FileId::new("f1"))]
    );
}

#[tokio::test]
async fn invalid_name_never_reaches_backend() {
    let api = Arc::new(FakeApi::default());
    let controller = controller(&api, FileRoute::New);

    let err = controller.create("a").await.expect_err("too short");
    assert_eq!(
        err,
        FetchError::Validation(ValidationError::TooShort {
            field: "file name".to_string(),
            min: 2,
            actual: 1,
        })
    );
    let err = controller.create("").await.expect_err("required");
    assert!(matches!(
        err,
        FetchError::Validation(ValidationError::Required { .. })
    ));
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn created_file_is_shown_without_refetch() {
    let api = Arc::new(FakeApi::default());
    let controller = controller(&api, FileRoute::New);
    assert!(controller.observe().expect("load").settled().await);

    let created = controller.create("notes.md").await.expect("create");

    assert_eq!(controller.file(), Some(created));
    assert!(!controller.shows_create_form());
    assert_eq!(
        api.calls().await,
        vec![Call::CreateFile(UserId::new("u1"), "notes.md".to_string())]
    );
}

#[tokio::test]
async fn navigation_and_user_switch_refetch() {
    let api = Arc::new(FakeApi::default());
    let mut controller = controller(&api, FileRoute::Existing(FileId::new("f1")));
    assert!(controller.observe().expect("load").settled().await);

    let pending = controller
        .navigate(FileRoute::parse("f2"))
        .expect("new route loads");
    assert!(pending.settled().await);
    let pending = controller
        .set_user(UserId::new("u2"))
        .expect("new user loads");
    assert!(pending.settled().await);

    assert_eq!(controller.route(), &FileRoute::Existing(FileId::new("f2")));
    assert_eq!(
        api.calls().await,
        vec![
            Call::GetFile(UserId::new("u1"), FileId::new("f1")),
            Call::GetFile(UserId::new("u1"), FileId::new("f2")),
            Call::GetFile(UserId::new("u2"), FileId::new("f2")),
        ]
    );
}

#[tokio::test]
async fn failed_fetch_can_be_retried() {
    let api = Arc::new(FakeApi::default());
    let controller = controller(&api, FileRoute::Existing(FileId::new("missing")));
    assert!(controller.observe().expect("load").settled().await);

    assert!(matches!(
        controller.state(),
        ResourceState::Error(FetchError::Status { status: 404, .. })
    ));
    assert!(controller.retry().expect("retry").settled().await);
    assert_eq!(api.calls().await.len(), 2);
}
