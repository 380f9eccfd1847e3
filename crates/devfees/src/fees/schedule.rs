//! CSV-backed fee schedule covering one or more jurisdictions.

use super::domain::{CalcMethod, Fee, FeeFormula, LegacyRate, DEFAULT_CATEGORY};
use super::lenient::{parse_flag, parse_float_prefix};
use super::source::{resolve_service_areas, FeeRecordSource, JurisdictionSelection, SourceError};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum ScheduleImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ScheduleImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleImportError::Io(err) => write!(f, "failed to read fee schedule: {}", err),
            ScheduleImportError::Csv(err) => write!(f, "invalid fee schedule CSV: {}", err),
        }
    }
}

impl std::error::Error for ScheduleImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScheduleImportError::Io(err) => Some(err),
            ScheduleImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ScheduleImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ScheduleImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Clone, Default)]
struct JurisdictionFees {
    name: String,
    fees: Vec<Fee>,
}

/// In-memory fee schedule keyed by jurisdiction name (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct FeeSchedule {
    jurisdictions: BTreeMap<String, JurisdictionFees>,
}

impl FeeSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ScheduleImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScheduleImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut schedule = Self::new();
        let mut rows = 0usize;

        for (index, record) in csv_reader.deserialize::<ScheduleRow>().enumerate() {
            let row = record?;
            let jurisdiction = row.jurisdiction.clone();
            let fee = row.into_fee(index + 1);
            schedule.push(&jurisdiction, fee);
            rows += 1;
        }

        debug!(
            rows,
            jurisdictions = schedule.jurisdictions.len(),
            "loaded fee schedule"
        );
        Ok(schedule)
    }

    /// Adds `fees` under `jurisdiction`, appending to any fees already held.
    pub fn with_jurisdiction(mut self, jurisdiction: &str, fees: Vec<Fee>) -> Self {
        for fee in fees {
            self.push(jurisdiction, fee);
        }
        self
    }

    fn push(&mut self, jurisdiction: &str, fee: Fee) {
        let entry = self
            .jurisdictions
            .entry(jurisdiction_key(jurisdiction))
            .or_insert_with(|| JurisdictionFees {
                name: jurisdiction.trim().to_string(),
                fees: Vec::new(),
            });
        entry.fees.push(fee);
    }

    pub fn jurisdictions(&self) -> Vec<&str> {
        self.jurisdictions
            .values()
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Distinct non-citywide service areas defined for `jurisdiction`.
    pub fn service_areas(&self, jurisdiction: &str) -> Option<Vec<String>> {
        self.jurisdictions
            .get(&jurisdiction_key(jurisdiction))
            .map(|entry| {
                entry
                    .fees
                    .iter()
                    .map(|fee| fee.service_area.trim())
                    .filter(|area| {
                        !area.is_empty() && !area.eq_ignore_ascii_case(super::source::CITYWIDE)
                    })
                    .map(str::to_string)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            })
    }

    pub fn fee_count(&self) -> usize {
        self.jurisdictions.values().map(|entry| entry.fees.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.jurisdictions.is_empty()
    }
}

impl FeeRecordSource for FeeSchedule {
    fn fetch_fees(&self, selection: &JurisdictionSelection) -> Result<Vec<Fee>, SourceError> {
        let entry = self
            .jurisdictions
            .get(&jurisdiction_key(&selection.jurisdiction))
            .ok_or_else(|| SourceError::UnknownJurisdiction(selection.jurisdiction.clone()))?;

        let fees = resolve_service_areas(entry.fees.clone(), &selection.service_areas);
        if fees.is_empty() {
            return Err(SourceError::NoFees(entry.name.clone()));
        }
        Ok(fees)
    }
}

fn jurisdiction_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Deserialize)]
struct ScheduleRow {
    jurisdiction: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    service_area: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    agency: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    fee_id: Option<String>,
    fee_name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    calc_method: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    base_rate: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    min_fee: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    max_fee: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    formula: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    legacy_rate: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    is_recurring: Option<String>,
}

impl ScheduleRow {
    fn into_fee(self, line: usize) -> Fee {
        let formula = self.formula.as_deref().and_then(|raw| {
            match serde_json::from_str::<FeeFormula>(raw) {
                Ok(formula) => Some(formula),
                Err(err) => {
                    warn!(
                        fee_name = %self.fee_name,
                        line,
                        error = %err,
                        "ignoring malformed fee formula"
                    );
                    None
                }
            }
        });

        Fee {
            id: self
                .fee_id
                .unwrap_or_else(|| format!("{}-{line}", jurisdiction_key(&self.jurisdiction))),
            name: self.fee_name,
            category: self
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            calc_method: self.calc_method.as_deref().and_then(CalcMethod::parse),
            base_rate: self.base_rate.as_deref().and_then(parse_float_prefix),
            min_fee: self.min_fee.as_deref().and_then(parse_float_prefix),
            max_fee: self.max_fee.as_deref().and_then(parse_float_prefix),
            formula,
            legacy_rate: self.legacy_rate.map(LegacyRate::Text),
            is_recurring: self.is_recurring.as_deref().map(parse_flag).unwrap_or(false),
            agency_name: self.agency.unwrap_or_default(),
            service_area: self.service_area.unwrap_or_default(),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
