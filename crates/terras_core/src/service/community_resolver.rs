//! Community resolution from raw community names.
//!
//! # Responsibility
//! - Map a raw community name onto an existing or new community row.
//!
//! # Invariants
//! - Lookup by derived slug happens before any insert, so spelling variants
//!   that share a slug (`Kokama`, `KOKAMA `) resolve to one community.
//! - A uniqueness conflict on insert never fails the record: an existing
//!   community with the same name is reused, otherwise a suffixed slug is
//!   minted.
//! - Names that slugify to nothing are matched by exact name only, never by
//!   the shared fallback slug.

use crate::model::community::{Community, NewCommunity};
use crate::repo::community_repo::CommunityRepository;
use crate::repo::{RepoError, RepoResult};
use crate::slug::{base_slug, slugify, unique_slug};
use log::{debug, warn};

/// Resolves community names against the community repository.
pub struct CommunityResolver<'r, R: CommunityRepository> {
    repo: &'r R,
}

impl<'r, R: CommunityRepository> CommunityResolver<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Resolves one raw name.
    ///
    /// Returns the community and whether this call created it.
    ///
    /// # Errors
    /// - `RepoError::InvalidData` when the name is blank.
    /// - Any persistence failure other than a uniqueness conflict.
    pub fn resolve(&self, raw_name: &str) -> RepoResult<(Community, bool)> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(RepoError::InvalidData(
                "community name must not be blank".to_string(),
            ));
        }

        if slugify(name).is_empty() {
            return self.resolve_without_slug(name);
        }

        let slug = base_slug(name);
        if let Some(existing) = self.repo.find_by_slug(&slug)? {
            return Ok((existing, false));
        }

        match self
            .repo
            .create_community(&NewCommunity::with_slug(name, slug.as_str()))
        {
            Ok(created) => {
                debug!(
                    "event=community_create module=community status=ok slug={}",
                    created.slug
                );
                Ok((created, true))
            }
            Err(err) if err.is_unique_violation() => self.resolve_conflict(name, &slug),
            Err(err) => Err(err),
        }
    }

    /// Names with no slug characters share only the fallback slug, so they
    /// are matched by exact name and get a suffixed fallback when new.
    fn resolve_without_slug(&self, name: &str) -> RepoResult<(Community, bool)> {
        if let Some(existing) = self.repo.find_by_name(name)? {
            return Ok((existing, false));
        }

        let created = self.repo.create_community(&NewCommunity::new(name))?;
        debug!(
            "event=community_create module=community status=ok slug={} fallback=true",
            created.slug
        );
        Ok((created, true))
    }

    fn resolve_conflict(&self, name: &str, slug: &str) -> RepoResult<(Community, bool)> {
        if let Some(existing) = self.repo.find_by_name(name)? {
            return Ok((existing, false));
        }

        let unique = unique_slug(slug, |candidate| self.repo.slug_taken(candidate, None))?;
        warn!(
            "event=community_create module=community status=ok slug_conflict={} slug={}",
            slug, unique
        );
        let created = self
            .repo
            .create_community(&NewCommunity::with_slug(name, unique))?;
        Ok((created, true))
    }
}
