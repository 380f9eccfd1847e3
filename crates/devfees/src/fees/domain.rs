use super::lenient;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Algorithm tag selecting how a fee's amount is derived from the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcMethod {
    Flat,
    PerSqft,
    PerUnit,
    PercentOfValuation,
    PerTrip,
    MeterSize,
    Custom,
}

impl CalcMethod {
    /// Reads a method tag; unrecognised tags yield `None` so the fee falls
    /// back to its legacy rate.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "flat" => Some(Self::Flat),
            "per_sqft" => Some(Self::PerSqft),
            "per_unit" => Some(Self::PerUnit),
            "percent_of_valuation" => Some(Self::PercentOfValuation),
            "per_trip" => Some(Self::PerTrip),
            "meter_size" => Some(Self::MeterSize),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::PerSqft => "per_sqft",
            Self::PerUnit => "per_unit",
            Self::PercentOfValuation => "percent_of_valuation",
            Self::PerTrip => "per_trip",
            Self::MeterSize => "meter_size",
            Self::Custom => "custom",
        }
    }

    fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Self>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(Self::parse))
    }
}

impl fmt::Display for CalcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `{when, expr}` arm of a switch formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub when: String,
    pub expr: String,
}

/// Structured formula payload attached to `meter_size` and `custom` fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeeFormula {
    Expression { expr: String },
    Switch { switch: Vec<SwitchCase> },
    MeterRates(BTreeMap<String, f64>),
}

impl FeeFormula {
    fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Self>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.and_then(|value| match value {
            serde_json::Value::String(text) => serde_json::from_str(&text).ok(),
            other => serde_json::from_value(other).ok(),
        }))
    }
}

/// Flat fallback amount recorded on older schedules, either numeric or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyRate {
    Amount(f64),
    Text(String),
}

impl LegacyRate {
    pub fn amount(&self) -> Option<f64> {
        match self {
            LegacyRate::Amount(value) if value.is_finite() => Some(*value),
            LegacyRate::Amount(_) => None,
            LegacyRate::Text(text) => lenient::parse_float_prefix(text),
        }
    }
}

pub const DEFAULT_CATEGORY: &str = "Other";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn deserialize_category<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = lenient::text(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(default_category())
    } else {
        Ok(trimmed.to_string())
    }
}

/// A single chargeable line item from a jurisdiction's fee schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default, alias = "feeId", alias = "fee_id", deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(
        default,
        alias = "feeName",
        alias = "fee_name",
        deserialize_with = "lenient::text"
    )]
    pub name: String,
    #[serde(default = "default_category", deserialize_with = "deserialize_category")]
    pub category: String,
    #[serde(
        default,
        alias = "calcMethod",
        deserialize_with = "CalcMethod::deserialize_lenient"
    )]
    pub calc_method: Option<CalcMethod>,
    #[serde(default, alias = "baseRate", deserialize_with = "lenient::optional_amount")]
    pub base_rate: Option<f64>,
    #[serde(default, alias = "minFee", deserialize_with = "lenient::optional_amount")]
    pub min_fee: Option<f64>,
    #[serde(default, alias = "maxFee", deserialize_with = "lenient::optional_amount")]
    pub max_fee: Option<f64>,
    #[serde(default, deserialize_with = "FeeFormula::deserialize_lenient")]
    pub formula: Option<FeeFormula>,
    #[serde(default, alias = "legacyRate")]
    pub legacy_rate: Option<LegacyRate>,
    #[serde(default, alias = "isRecurring", deserialize_with = "lenient::flag")]
    pub is_recurring: bool,
    #[serde(default, alias = "agencyName", deserialize_with = "lenient::text")]
    pub agency_name: String,
    #[serde(default, alias = "serviceArea", deserialize_with = "lenient::text")]
    pub service_area: String,
}

impl Fee {
    /// Convenience constructor for a priced fee with no clamps or formula.
    pub fn priced(
        id: impl Into<String>,
        name: impl Into<String>,
        method: CalcMethod,
        base_rate: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: default_category(),
            calc_method: Some(method),
            base_rate: Some(base_rate),
            min_fee: None,
            max_fee: None,
            formula: None,
            legacy_rate: None,
            is_recurring: false,
            agency_name: String::new(),
            service_area: String::new(),
        }
    }
}

/// Project quantities every fee in a jurisdiction is evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectParameters {
    #[serde(default, alias = "numUnits", deserialize_with = "lenient::count")]
    pub units: u32,
    #[serde(
        default,
        alias = "squareFootage",
        alias = "squareFeet",
        deserialize_with = "lenient::quantity"
    )]
    pub square_footage: f64,
    #[serde(default, alias = "projectValue", deserialize_with = "lenient::quantity")]
    pub project_value: f64,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub acreage: f64,
    #[serde(default, alias = "meterSize", deserialize_with = "lenient::text")]
    pub meter_size: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub trips: Option<u32>,
}

impl ProjectParameters {
    /// Trip count used by `per_trip` fees: the explicit value when supplied,
    /// otherwise `units * trips_per_unit`.
    pub fn trip_count(&self, trips_per_unit: f64) -> f64 {
        match self.trips {
            Some(trips) => f64::from(trips),
            None => f64::from(self.units) * trips_per_unit,
        }
    }
}

/// Why a calculation did not follow its declared method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fallback {
    /// No method/rate and no usable legacy rate; the fee contributes $0.
    MissingCalculationData,
    /// `meter_size` lookup key absent from the formula table.
    MeterRateMissing { key: String },
    /// `custom` formula failed to parse or evaluate.
    ExpressionFailed { message: String },
    /// No switch case matched.
    SwitchNoMatch,
    /// The declared method overflowed to a non-finite amount.
    NonFiniteAmount,
}

impl Fallback {
    pub fn summary(&self) -> String {
        match self {
            Fallback::MissingCalculationData => {
                "no calculation method, rate, or legacy rate; contributes $0".to_string()
            }
            Fallback::MeterRateMissing { key } => {
                format!("meter rate {key} not found; used base rate")
            }
            Fallback::ExpressionFailed { message } => {
                format!("formula could not be evaluated ({message}); used base rate")
            }
            Fallback::SwitchNoMatch => "no switch case matched; used base rate".to_string(),
            Fallback::NonFiniteAmount => {
                "calculated amount was out of range; used base rate".to_string()
            }
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Result of evaluating one fee against one set of project parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedFee {
    pub fee_id: String,
    pub fee_name: String,
    pub category: String,
    pub calculated_amount: f64,
    pub calculation: String,
    pub is_recurring: bool,
    pub agency_name: String,
    pub service_area: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Fallback>,
}
