use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(FileId);

/// Opaque pagination cursor issued by the backend.
///
/// The empty token doubles as two sentinels: sent in a request it asks for
/// the first page, received in a response it means there is no further page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Request token for the first page.
    pub fn first() -> Self {
        Self::default()
    }

    /// True for the empty sentinel ("first page" or "no further page").
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<start>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for PageToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: FileId,
    pub name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
}

/// Route parameter of the file detail view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileRoute {
    New,
    Existing(FileId),
}

impl FileRoute {
    pub const NEW_SEGMENT: &'static str = ":new";

    pub fn parse(segment: &str) -> Self {
        if segment == Self::NEW_SEGMENT {
            FileRoute::New
        } else {
            FileRoute::Existing(FileId::new(segment))
        }
    }
}

impl fmt::Display for FileRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRoute::New => f.write_str(Self::NEW_SEGMENT),
            FileRoute::Existing(id) => write!(f, "{id}"),
        }
    }
}
