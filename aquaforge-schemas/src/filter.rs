use serde::{Deserialize, Serialize};

/// Canonical filter families, each with its own base efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Canister,
    Hob,
    Internal,
    Ugf,
    Sponge,
}

impl FilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Canister => "canister",
            FilterType::Hob => "hob",
            FilterType::Internal => "internal",
            FilterType::Ugf => "ugf",
            FilterType::Sponge => "sponge",
        }
    }
}

/// Where a filter definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSource {
    #[default]
    Product,
    Custom,
}

/// A filter as supplied by a caller. `kind` is free text ("HOB", "hang-on-back",
/// "canister", ...) and is resolved to a `FilterType` by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub rated_gph: f64,
    #[serde(default)]
    pub source: FilterSource,
}

impl FilterSpec {
    pub fn product(id: &str, kind: FilterType, rated_gph: f64) -> Self {
        Self {
            id: Some(id.to_string()),
            kind: Some(kind.as_str().to_string()),
            name: None,
            rated_gph,
            source: FilterSource::Product,
        }
    }

    pub fn custom(kind: FilterType, rated_gph: f64) -> Self {
        Self {
            id: None,
            kind: Some(kind.as_str().to_string()),
            name: None,
            rated_gph,
            source: FilterSource::Custom,
        }
    }

    /// A product known only by its display name; the type is inferred later.
    pub fn named(name: &str, rated_gph: f64) -> Self {
        Self {
            id: None,
            kind: None,
            name: Some(name.to_string()),
            rated_gph,
            source: FilterSource::Product,
        }
    }
}
