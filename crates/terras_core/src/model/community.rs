//! Community (povo) model.

use serde::{Deserialize, Serialize};

/// Persisted row id of a community.
pub type CommunityId = i64;

/// Indigenous community shared across many lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    /// Unique display name.
    pub name: String,
    /// Unique, non-empty, URL-safe identifier.
    pub slug: String,
}

/// Insert model for communities.
///
/// When `slug` is `None` the repository derives one from `name` and makes it
/// unique with numeric suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommunity {
    pub name: String,
    pub slug: Option<String>,
}

impl NewCommunity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
        }
    }

    pub fn with_slug(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: Some(slug.into()),
        }
    }
}
