//! Land parcel model.
//!
//! # Responsibility
//! - Define the canonical land record and its provenance fields.
//! - Own the fixed category enumeration and its storage codes.
//!
//! # Invariants
//! - `(source_name, source_id)` is unique when both are present.
//! - `source_raw_data` keeps the source record verbatim for audit.

use crate::model::geo::{BiomeId, MunicipalityId};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Persisted row id of a land.
pub type LandId = i64;

/// Source tag for records imported from Instituto Socioambiental.
pub const ISA_SOURCE_NAME: &str = "ISA";

const ISA_LAND_URL: &str = "https://terrasindigenas.org.br/en/terras-indigenas/";

/// Legal category of an indigenous land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LandCategory {
    /// Dominial Indígena.
    #[serde(rename = "DI")]
    DominialIndigena,
    /// Parque Indígena.
    #[serde(rename = "PI")]
    ParqueIndigena,
    /// Reserva Indígena.
    #[serde(rename = "RI")]
    ReservaIndigena,
    /// Terra Indígena. Baseline when the source omits a category.
    #[default]
    #[serde(rename = "TI")]
    TerraIndigena,
}

impl LandCategory {
    pub const ALL: [Self; 4] = [
        Self::DominialIndigena,
        Self::ParqueIndigena,
        Self::ReservaIndigena,
        Self::TerraIndigena,
    ];

    /// Two-letter storage and source code.
    pub fn code(self) -> &'static str {
        match self {
            Self::DominialIndigena => "DI",
            Self::ParqueIndigena => "PI",
            Self::ReservaIndigena => "RI",
            Self::TerraIndigena => "TI",
        }
    }
}

/// Category code outside the fixed enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl Display for UnknownCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown land category `{}`; expected DI|PI|RI|TI",
            self.0
        )
    }
}

impl Error for UnknownCategory {}

impl FromStr for LandCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.code().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

impl Display for LandCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Source record kept verbatim as an opaque JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPayload(String);

impl RawPayload {
    pub fn new(document: impl Into<String>) -> Self {
        Self(document.into())
    }

    /// Serializes a JSON value into an opaque payload.
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the payload back into a JSON tree for forensic replay.
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.0)
    }
}

/// Writable field set of a land, shared by create and full-overwrite update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandFields {
    pub name: String,
    pub category: LandCategory,
    pub municipality_id: Option<MunicipalityId>,
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub source_updated_at: Option<DateTime<FixedOffset>>,
    pub source_last_synced_at: Option<DateTime<FixedOffset>>,
    pub source_raw_data: Option<RawPayload>,
}

/// Canonical persisted land record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Land {
    pub id: LandId,
    pub name: String,
    pub category: LandCategory,
    pub municipality_id: Option<MunicipalityId>,
    pub biome_id: Option<BiomeId>,
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub source_updated_at: Option<DateTime<FixedOffset>>,
    pub source_last_synced_at: Option<DateTime<FixedOffset>>,
    pub source_raw_data: Option<RawPayload>,
}

impl Land {
    /// Public page of this land at its source, when the source is known.
    pub fn source_link(&self) -> Option<String> {
        match (self.source_name.as_deref(), self.source_id.as_deref()) {
            (Some(ISA_SOURCE_NAME), Some(source_id)) if !source_id.is_empty() => {
                Some(format!("{ISA_LAND_URL}{source_id}"))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Land, LandCategory, ISA_SOURCE_NAME};

    fn land(source_name: Option<&str>, source_id: Option<&str>) -> Land {
        Land {
            id: 1,
            name: "Acimã".to_string(),
            category: LandCategory::TerraIndigena,
            municipality_id: None,
            biome_id: None,
            source_id: source_id.map(str::to_string),
            source_name: source_name.map(str::to_string),
            source_updated_at: None,
            source_last_synced_at: None,
            source_raw_data: None,
        }
    }

    #[test]
    fn category_parses_codes_case_insensitively() {
        assert_eq!("ri".parse::<LandCategory>(), Ok(LandCategory::ReservaIndigena));
        assert_eq!(" TI ".parse::<LandCategory>(), Ok(LandCategory::TerraIndigena));
        assert!("XX".parse::<LandCategory>().is_err());
        assert_eq!(LandCategory::default(), LandCategory::TerraIndigena);
    }

    #[test]
    fn source_link_only_for_isa_records() {
        assert_eq!(
            land(Some(ISA_SOURCE_NAME), Some("3935")).source_link().as_deref(),
            Some("https://terrasindigenas.org.br/en/terras-indigenas/3935")
        );
        assert_eq!(land(Some("FUNAI"), Some("3935")).source_link(), None);
        assert_eq!(land(Some(ISA_SOURCE_NAME), None).source_link(), None);
    }
}
