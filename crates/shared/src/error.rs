use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum length of names entered in the sign-up and new-file forms.
pub const MIN_NAME_LEN: usize = 2;

/// Client-side form check failure; raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },
    #[error("{field} must be at least {min} characters (got {actual})")]
    TooShort {
        field: String,
        min: usize,
        actual: usize,
    },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field } | ValidationError::TooShort { field, .. } => field,
        }
    }
}

/// Applies the `required` and `minLength` checks of a name input.
///
/// Length is counted in characters, not bytes. The value is not trimmed.
pub fn validate_name<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let actual = value.chars().count();
    if actual < MIN_NAME_LEN {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min: MIN_NAME_LEN,
            actual,
        });
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert_eq!(
            validate_name("name", ""),
            Err(ValidationError::Required {
                field: "name".into()
            })
        );
    }

    #[test]
    fn rejects_single_character_name() {
        let err = validate_name("file name", "a").expect_err("too short");
        assert_eq!(err.field(), "file name");
        assert_eq!(
            err.to_string(),
            "file name must be at least 2 characters (got 1)"
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert!(validate_name("name", "é").is_err());
        assert_eq!(validate_name("name", "éé"), Ok("éé"));
    }
}
