//! Defines the data structures for representing a species in the Aquaforge catalog.
//! Raw catalog rows arrive as `SpeciesDraft`s with every field optional so that a
//! malformed row can be rejected whole; validated rows become `SpeciesRecord`s.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a string does not name a known variant of a catalog enum.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// The broad animal group a species belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fish,
    Shrimp,
    Snail,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fish => "fish",
            Category::Shrimp => "shrimp",
            Category::Snail => "snail",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fish" => Ok(Category::Fish),
            "shrimp" => Ok(Category::Shrimp),
            "snail" => Ok(Category::Snail),
            _ => Err(UnknownVariant { kind: "category", value: s.to_string() }),
        }
    }
}

/// Water salinity, ordered along the fresh → marine hierarchy.
/// `Dual` marks species that tolerate both fresh and brackish-low water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Salinity {
    Fresh,
    BrackishLow,
    BrackishHigh,
    Dual,
    Marine,
}

impl Salinity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Salinity::Fresh => "fresh",
            Salinity::BrackishLow => "brackish-low",
            Salinity::BrackishHigh => "brackish-high",
            Salinity::Dual => "dual",
            Salinity::Marine => "marine",
        }
    }
}

impl fmt::Display for Salinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Salinity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fresh" | "freshwater" => Ok(Salinity::Fresh),
            "brackish-low" => Ok(Salinity::BrackishLow),
            "brackish-high" => Ok(Salinity::BrackishHigh),
            "dual" => Ok(Salinity::Dual),
            "marine" => Ok(Salinity::Marine),
            _ => Err(UnknownVariant { kind: "salinity", value: s.to_string() }),
        }
    }
}

/// Preferred water movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Low,
    Moderate,
    High,
}

impl Flow {
    /// Position on the low → moderate → high ladder.
    pub fn rank(&self) -> u8 {
        match self {
            Flow::Low => 0,
            Flow::Moderate => 1,
            Flow::High => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Low => "low",
            Flow::Moderate => "moderate",
            Flow::High => "high",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flow {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Flow::Low),
            "moderate" | "medium" => Ok(Flow::Moderate),
            "high" => Ok(Flow::High),
            _ => Err(UnknownVariant { kind: "flow", value: s.to_string() }),
        }
    }
}

/// How strongly a species depends on tannin-stained (blackwater) conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlackwaterNeed {
    Requires,
    Prefers,
    Neutral,
}

impl FromStr for BlackwaterNeed {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "requires" | "required" => Ok(BlackwaterNeed::Requires),
            "prefers" | "preferred" => Ok(BlackwaterNeed::Prefers),
            "neutral" | "none" | "off" => Ok(BlackwaterNeed::Neutral),
            _ => Err(UnknownVariant { kind: "blackwater", value: s.to_string() }),
        }
    }
}

/// A generic struct to define a minimum and maximum tolerance range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRange<T> {
    pub min: T,
    pub max: T,
}

impl ToleranceRange<f64> {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Distance from `value` to the nearest edge of the range, 0 when inside.
    pub fn distance_to(&self, value: f64) -> f64 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// Male-to-female proportion required by a harem-forming species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaremRatio {
    pub m: u32,
    pub f: u32,
}

impl Default for HaremRatio {
    fn default() -> Self {
        Self { m: 1, f: 2 }
    }
}

/// Social grouping requirement of a species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupRule {
    Shoal {
        min: u32,
    },
    Colony {
        min: u32,
    },
    Harem {
        min: u32,
        #[serde(default)]
        ratio: Option<HaremRatio>,
        /// Catalog id of the matching females; defaults to `<id>_female`.
        #[serde(default)]
        female_id: Option<String>,
    },
}

impl GroupRule {
    pub fn min(&self) -> u32 {
        match self {
            GroupRule::Shoal { min }
            | GroupRule::Colony { min }
            | GroupRule::Harem { min, .. } => *min,
        }
    }
}

/// A catalog row as it appears in a species file, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDraft {
    pub id: Option<String>,
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    pub category: Option<String>,
    pub temperature_f: Option<ToleranceRange<f64>>,
    pub ph: Option<ToleranceRange<f64>>,
    pub gh: Option<ToleranceRange<f64>>,
    pub kh: Option<ToleranceRange<f64>>,
    pub salinity: Option<String>,
    pub flow: Option<String>,
    pub blackwater: Option<String>,
    pub aggression: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Gallon-equivalents per adult individual. Derived from size when absent.
    pub bioload_unit: Option<f64>,
    pub adult_size_in: Option<f64>,
    /// Density constant used to derive `bioload_unit` from `adult_size_in`.
    pub density: Option<f64>,
    pub min_tank_length_in: Option<f64>,
    pub mouth_size_in: Option<f64>,
    pub invert_safe: Option<bool>,
    pub ph_sensitive: Option<bool>,
    pub group: Option<GroupRule>,
}

/// A validated, immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub id: String,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub category: Category,
    pub temperature_f: ToleranceRange<f64>,
    pub ph: ToleranceRange<f64>,
    pub gh: ToleranceRange<f64>,
    pub kh: ToleranceRange<f64>,
    pub salinity: Salinity,
    pub flow: Flow,
    pub blackwater: BlackwaterNeed,
    pub aggression: f64,
    pub tags: Vec<String>,
    pub bioload_unit: f64,
    pub min_tank_length_in: Option<f64>,
    pub mouth_size_in: Option<f64>,
    pub invert_safe: bool,
    pub ph_sensitive: bool,
    pub group: Option<GroupRule>,
}

impl SpeciesRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
