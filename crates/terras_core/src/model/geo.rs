//! Administrative geography model.
//!
//! # Invariants
//! - `Country.code` and `State.code` are two-letter codes, unique per table.
//! - A municipality is unique per `(name, state_id)`.

use serde::{Deserialize, Serialize};

/// Persisted row id of a country.
pub type CountryId = i64;
/// Persisted row id of a state.
pub type StateId = i64;
/// Persisted row id of a municipality.
pub type MunicipalityId = i64;
/// Persisted row id of a biome.
pub type BiomeId = i64;

/// Code of the distinguished home country every imported state belongs to.
pub const HOME_COUNTRY_CODE: &str = "BR";
/// Display name used when the home country has to be created.
pub const HOME_COUNTRY_NAME: &str = "Brazil";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub name_local: Option<String>,
    pub code: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub id: StateId,
    pub name: String,
    pub name_local: Option<String>,
    /// Natural key used by the importer.
    pub code: String,
    pub country_id: CountryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    pub id: MunicipalityId,
    pub name: String,
    pub name_local: Option<String>,
    /// Falls back to the state code when the source carries no own code.
    pub code: String,
    pub state_id: StateId,
}

/// Biome reference data. Lands may point at one, the importer never writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub id: BiomeId,
    pub name: String,
    pub name_local: Option<String>,
    pub total_area: Option<f64>,
    pub preserved_area: Option<f64>,
    pub country_id: CountryId,
    pub description: Option<String>,
    pub description_local: Option<String>,
}
