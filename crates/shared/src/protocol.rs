use serde::{Deserialize, Serialize};

use crate::domain::{FileSummary, PageToken, UserSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesQuery {
    pub pagination_limit: u32,
    pub pagination_token: PageToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersQuery {
    pub pagination_token: PageToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesResponse {
    #[serde(default)]
    pub files: Vec<FileSummary>,
    #[serde(default)]
    pub pagination_token: PageToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResponse {
    #[serde(default)]
    pub users: Vec<UserSummary>,
    #[serde(default)]
    pub pagination_token: PageToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: PageToken,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_token: impl Into<PageToken>) -> Self {
        Self {
            items,
            next_token: next_token.into(),
        }
    }

    /// True when the backend reported no further page.
    pub fn is_last(&self) -> bool {
        self.next_token.is_empty()
    }
}

impl From<ListFilesResponse> for Page<FileSummary> {
    fn from(value: ListFilesResponse) -> Self {
        Self {
            items: value.files,
            next_token: value.pagination_token,
        }
    }
}

impl From<ListUsersResponse> for Page<UserSummary> {
    fn from(value: ListUsersResponse) -> Self {
        Self {
            items: value.users,
            next_token: value.pagination_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;

    #[test]
    fn missing_pagination_token_means_last_page() {
        let response: ListUsersResponse =
            serde_json::from_str(r#"{"users":[{"id":"u1","name":"Jane"}]}"#).expect("decode");
        let page = Page::from(response);
        assert!(page.is_last());
        assert_eq!(page.items[0].id, UserId::new("u1"));
    }
}
