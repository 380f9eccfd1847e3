//! Name-based heuristic that drops fees aimed at a different project type.
//!
//! The rules are literal substring matches on the fee name. They are a
//! convenience default, not a classifier; callers may skip the filter.

use super::domain::Fee;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectType {
    SingleFamilyResidential,
    MultiFamilyResidential,
    Commercial,
    RestaurantFoodService,
    Industrial,
    Other(String),
}

const SINGLE_FAMILY_EXCLUDES: &[&str] = &[
    "multi family",
    "multifamily",
    "commercial",
    "industrial",
    "restaurant",
    "nonres",
];
const MULTI_FAMILY_EXCLUDES: &[&str] = &[
    "single family",
    "commercial",
    "industrial",
    "restaurant",
    "nonres",
];
const COMMERCIAL_EXCLUDES: &[&str] = &[
    "residential",
    "single family",
    "multi family",
    "multifamily",
    "industrial",
    "restaurant",
];
const RESTAURANT_EXCLUDES: &[&str] = &[
    "residential",
    "single family",
    "multi family",
    "multifamily",
    "industrial",
];
const INDUSTRIAL_EXCLUDES: &[&str] = &[
    "residential",
    "single family",
    "multi family",
    "multifamily",
    "commercial",
    "restaurant",
];

impl ProjectType {
    pub fn parse(raw: &str) -> Self {
        let normalized = normalize(raw);
        match normalized.as_str() {
            "single family residential" | "single family" | "sfr" => {
                Self::SingleFamilyResidential
            }
            "multi family residential" | "multifamily residential" | "multi family"
            | "multifamily" | "mfr" => Self::MultiFamilyResidential,
            "commercial" => Self::Commercial,
            "restaurant/food service" | "restaurant" | "food service" => {
                Self::RestaurantFoodService
            }
            "industrial" => Self::Industrial,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::SingleFamilyResidential => "Single Family Residential",
            Self::MultiFamilyResidential => "Multi-Family Residential",
            Self::Commercial => "Commercial",
            Self::RestaurantFoodService => "Restaurant/Food Service",
            Self::Industrial => "Industrial",
            Self::Other(label) => label,
        }
    }

    fn excluded_keywords(&self) -> &'static [&'static str] {
        match self {
            Self::SingleFamilyResidential => SINGLE_FAMILY_EXCLUDES,
            Self::MultiFamilyResidential => MULTI_FAMILY_EXCLUDES,
            Self::Commercial => COMMERCIAL_EXCLUDES,
            Self::RestaurantFoodService => RESTAURANT_EXCLUDES,
            Self::Industrial => INDUSTRIAL_EXCLUDES,
            Self::Other(_) => &[],
        }
    }

    /// Whether a fee with this name plausibly applies to the project type.
    pub fn is_relevant(&self, fee_name: &str) -> bool {
        let name = normalize(fee_name);
        !self
            .excluded_keywords()
            .iter()
            .any(|keyword| name.contains(keyword))
    }
}

impl From<String> for ProjectType {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ProjectType> for String {
    fn from(project_type: ProjectType) -> Self {
        project_type.label().to_string()
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace('-', " ")
        .replace("non residential", "nonres")
        .replace("nonresidential", "nonres")
}

/// Keeps the fees whose names fit `project_type`, preserving order.
pub fn filter_fees<'a>(fees: &'a [Fee], project_type: &ProjectType) -> Vec<&'a Fee> {
    fees.iter()
        .filter(|fee| project_type.is_relevant(&fee.name))
        .collect()
}
