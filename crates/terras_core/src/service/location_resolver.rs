//! Location resolution from raw municipality fragments.
//!
//! # Responsibility
//! - Ensure the home country exists before a batch touches any record.
//! - Get-or-create the state and municipality a record points at.
//!
//! # Invariants
//! - A fragment missing its municipality name or state code resolves to no
//!   location and writes nothing.
//! - New states default their display name to their code and belong to the
//!   home country; new municipalities default their code to the state code.

use crate::model::geo::{Country, Municipality, HOME_COUNTRY_CODE, HOME_COUNTRY_NAME};
use crate::repo::geo_repo::GeoRepository;
use crate::repo::{RepoError, RepoResult};
use crate::source::record::LocationFragment;
use log::debug;

/// Get-or-creates the distinguished home country.
///
/// Returns the country and whether this call created it.
pub fn ensure_home_country<R: GeoRepository>(repo: &R) -> RepoResult<(Country, bool)> {
    repo.get_or_create_country(HOME_COUNTRY_CODE, HOME_COUNTRY_NAME)
}

/// Resolves location fragments against the geography repository.
pub struct LocationResolver<'r, R: GeoRepository> {
    repo: &'r R,
}

impl<'r, R: GeoRepository> LocationResolver<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Resolves one fragment to a municipality.
    ///
    /// Returns `(None, false)` when the fragment is incomplete, otherwise the
    /// municipality and whether it was created by this call.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when the home country has not been ensured.
    /// - Any persistence failure from the repository.
    pub fn resolve(
        &self,
        fragment: &LocationFragment,
    ) -> RepoResult<(Option<Municipality>, bool)> {
        let (Some(municipality_name), Some(state_code)) =
            (fragment.municipality_name(), fragment.state_code())
        else {
            return Ok((None, false));
        };

        let country = self
            .repo
            .find_country_by_code(HOME_COUNTRY_CODE)?
            .ok_or_else(|| RepoError::NotFound {
                entity: "country",
                key: HOME_COUNTRY_CODE.to_string(),
            })?;

        let (state, state_created) =
            self.repo
                .get_or_create_state(state_code, state_code, country.id)?;
        if state_created {
            debug!(
                "event=state_create module=location status=ok code={}",
                state.code
            );
        }

        let (municipality, created) =
            self.repo
                .get_or_create_municipality(municipality_name, state.id, state_code)?;
        if created {
            debug!(
                "event=municipality_create module=location status=ok name={} state={}",
                municipality.name, state.code
            );
        }

        Ok((Some(municipality), created))
    }
}
