//! Typed view over one raw ISA land record fragment.
//!
//! Field names follow the source document (`nome_ti`, `categoria`, ...);
//! the view only borrows what the reconciler needs and leaves the raw
//! fragment untouched for the audit payload.

use serde::Deserialize;
use serde_json::Value;

/// Label used in logs when a record carries no usable name.
pub const UNKNOWN_RECORD_LABEL: &str = "unknown";

/// One land record as published by the source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IsaRecord {
    /// External identifier, numeric in practice but accepted as text too.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, rename = "nome_ti")]
    pub name: Option<String>,
    #[serde(default, rename = "categoria")]
    pub category: Option<String>,
    #[serde(default, rename = "data_alteracao")]
    pub updated_at: Option<String>,
    #[serde(default, rename = "municipio")]
    pub locations: Option<Vec<LocationFragment>>,
    #[serde(default, rename = "povo")]
    pub communities: Option<CommunityBlock>,
}

/// Municipality reference attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LocationFragment {
    #[serde(default, rename = "nome_municipio")]
    pub municipality_name: Option<String>,
    #[serde(default, rename = "uf")]
    pub state_code: Option<String>,
}

/// Wrapper object the source uses around its community list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommunityBlock {
    #[serde(default)]
    pub data: Option<Vec<CommunityFragment>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommunityFragment {
    #[serde(default, rename = "povo")]
    pub name: Option<String>,
}

impl IsaRecord {
    /// Builds the typed view of a raw fragment.
    ///
    /// # Errors
    /// - Fails when the fragment is not an object or a field has the wrong
    ///   JSON type (for example `municipio` not being a list).
    pub fn from_value(value: &Value) -> serde_json::Result<Self> {
        Self::deserialize(value)
    }

    /// Stringified external identifier, `None` when absent or blank.
    pub fn source_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            // Numeric `0` is a valid identifier.
            Value::Number(number) => Some(number.to_string()),
            Value::String(text) => non_blank(text).map(str::to_string),
            _ => None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().and_then(non_blank)
    }

    pub fn category_code(&self) -> Option<&str> {
        self.category.as_deref().and_then(non_blank)
    }

    /// Only the first location is used; the rest are kept in the raw payload.
    pub fn first_location(&self) -> Option<&LocationFragment> {
        self.locations.as_ref().and_then(|locations| locations.first())
    }

    /// Non-blank community names in source order.
    pub fn community_names(&self) -> Vec<&str> {
        self.communities
            .as_ref()
            .and_then(|block| block.data.as_ref())
            .map(|fragments| {
                fragments
                    .iter()
                    .filter_map(|fragment| fragment.name.as_deref().and_then(non_blank))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl LocationFragment {
    pub fn municipality_name(&self) -> Option<&str> {
        self.municipality_name.as_deref().and_then(non_blank)
    }

    pub fn state_code(&self) -> Option<&str> {
        self.state_code.as_deref().and_then(non_blank)
    }
}

/// Human-readable label of a raw fragment for log and error lines.
pub fn record_label(value: &Value) -> &str {
    value
        .get("nome_ti")
        .and_then(Value::as_str)
        .and_then(non_blank)
        .unwrap_or(UNKNOWN_RECORD_LABEL)
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
