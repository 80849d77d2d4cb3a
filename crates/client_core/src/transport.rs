use std::{fmt, str::FromStr, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{FileId, FileSummary, PageToken, UserId, UserSummary},
    protocol::{
        CreateFileRequest, CreateUserRequest, ListFilesQuery, ListFilesResponse, ListUsersQuery,
        ListUsersResponse, Page,
    },
};
use tracing::debug;
use url::Url;

use crate::error::FetchError;

pub const USER_ID_HEADER: &str = "user-id";

#[async_trait]
pub trait FileShareApi: Send + Sync {
    async fn list_files(
        &self,
        user_id: &UserId,
        token: &PageToken,
        limit: u32,
    ) -> Result<Page<FileSummary>, FetchError>;
    async fn get_file(&self, user_id: &UserId, file_id: &FileId)
        -> Result<FileSummary, FetchError>;
    async fn create_file(&self, user_id: &UserId, name: &str) -> Result<FileSummary, FetchError>;
    async fn list_users(&self, token: &PageToken) -> Result<Page<UserSummary>, FetchError>;
    async fn create_user(&self, name: &str) -> Result<UserSummary, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    #[default]
    Strict,
    /// Decode non-2xx bodies as if they succeeded.
    Lenient,
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(StatusPolicy::Strict),
            "lenient" => Ok(StatusPolicy::Lenient),
            other => Err(format!(
                "unknown status policy '{other}' (expected strict or lenient)"
            )),
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPolicy::Strict => f.write_str("strict"),
            StatusPolicy::Lenient => f.write_str("lenient"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Ok(T),
    Err { status: u16, body: String },
}

impl<T: DeserializeOwned> ApiResponse<T> {
    pub async fn read(response: reqwest::Response) -> Result<Self, FetchError> {
        let status = response.status();
        let body = response.text().await.map_err(FetchError::network)?;
        if status.is_success() {
            serde_json::from_str(&body)
                .map(ApiResponse::Ok)
                .map_err(FetchError::decode)
        } else {
            Ok(ApiResponse::Err {
                status: status.as_u16(),
                body,
            })
        }
    }

    pub fn resolve(self, policy: StatusPolicy) -> Result<T, FetchError> {
        match (self, policy) {
            (ApiResponse::Ok(data), _) => Ok(data),
            (ApiResponse::Err { status, body }, StatusPolicy::Strict) => {
                Err(FetchError::Status { status, body })
            }
            (ApiResponse::Err { status, body }, StatusPolicy::Lenient) => {
                debug!(status, "decoding non-success response under lenient policy");
                serde_json::from_str(&body).map_err(FetchError::decode)
            }
        }
    }
}

#[derive(Clone)]
pub struct HttpFileShareClient {
    http: Client,
    server_url: String,
    status_policy: StatusPolicy,
}

impl HttpFileShareClient {
    pub fn new(server_url: impl Into<String>, status_policy: StatusPolicy) -> Self {
        Self::with_client(Client::new(), server_url, status_policy)
    }

    pub fn with_timeout(
        server_url: impl Into<String>,
        status_policy: StatusPolicy,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::network)?;
        Ok(Self::with_client(http, server_url, status_policy))
    }

    pub fn with_client(
        http: Client,
        server_url: impl Into<String>,
        status_policy: StatusPolicy,
    ) -> Self {
        Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            status_policy,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    /// `segments` are appended to the server path, percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.server_url).map_err(FetchError::network)?;
        url.path_segments_mut()
            .map_err(|()| {
                FetchError::network(format!("server url '{}' cannot carry a path", self.server_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, FetchError> {
        let response = request.send().await.map_err(FetchError::network)?;
        ApiResponse::read(response)
            .await?
            .resolve(self.status_policy)
    }
}

#[async_trait]
impl FileShareApi for HttpFileShareClient {
    async fn list_files(
        &self,
        user_id: &UserId,
        token: &PageToken,
        limit: u32,
    ) -> Result<Page<FileSummary>, FetchError> {
        let response: ListFilesResponse = self
            .execute(
                self.http
                    .get(self.endpoint(&["v1", "files"])?)
                    .header(USER_ID_HEADER, user_id.as_str())
                    .query(&ListFilesQuery {
                        pagination_limit: limit,
                        pagination_token: token.clone(),
                    }),
            )
            .await?;
        Ok(response.into())
    }

    async fn get_file(
        &self,
        user_id: &UserId,
        file_id: &FileId,
    ) -> Result<FileSummary, FetchError> {
        self.execute(
            self.http
                .get(self.endpoint(&["v1", "files", file_id.as_str()])?)
                .header(USER_ID_HEADER, user_id.as_str()),
        )
        .await
    }

    async fn create_file(&self, user_id: &UserId, name: &str) -> Result<FileSummary, FetchError> {
        self.execute(
            self.http
                .post(self.endpoint(&["v1", "files"])?)
                .header(USER_ID_HEADER, user_id.as_str())
                .json(&CreateFileRequest {
                    name: name.to_string(),
                }),
        )
        .await
    }

    async fn list_users(&self, token: &PageToken) -> Result<Page<UserSummary>, FetchError> {
        let response: ListUsersResponse = self
            .execute(
                self.http
                    .get(self.endpoint(&["v1", "users"])?)
                    .query(&ListUsersQuery {
                        pagination_token: token.clone(),
                    }),
            )
            .await?;
        Ok(response.into())
    }

    async fn create_user(&self, name: &str) -> Result<UserSummary, FetchError> {
        self.execute(
            self.http
                .post(self.endpoint(&["v1", "users"])?)
                .json(&CreateUserRequest {
                    name: name.to_string(),
                }),
        )
        .await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
