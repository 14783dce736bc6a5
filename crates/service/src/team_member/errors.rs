use std::fmt;

use thiserror::Error;

/// Field whose uniqueness a create or update would violate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

impl UniqueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Username => "username",
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Business errors returned by the team member service.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TeamMemberError {
    #[error("team member not found")]
    NotFound,
    #[error("{0} already exists")]
    Duplicate(UniqueField),
    #[error("validation failed: {0}")]
    Validation(String),
    /// Backend failure; the detail is logged where it happened.
    #[error("database error while {0}")]
    Store(&'static str),
}

impl TeamMemberError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            TeamMemberError::Validation(_) => 1001,
            TeamMemberError::Duplicate(_) => 1002,
            TeamMemberError::NotFound => 1003,
            TeamMemberError::Store(_) => 1200,
        }
    }
}

/// Opaque store failure as reported by a repository backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Cache failures. These never leave the cache gateway.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache encode error: {0}")]
    Encode(serde_json::Error),
    #[error("cache decode error: {0}")]
    Decode(serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_the_field() {
        assert_eq!(TeamMemberError::Duplicate(UniqueField::Username).to_string(), "username already exists");
        assert_eq!(TeamMemberError::Duplicate(UniqueField::Email).code(), 1002);
    }

    #[test]
    fn store_error_hides_backend_detail() {
        let err = TeamMemberError::Store("creating team member");
        assert_eq!(err.to_string(), "database error while creating team member");
        assert_eq!(err.code(), 1200);
    }
}
