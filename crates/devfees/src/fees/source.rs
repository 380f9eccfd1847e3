use super::domain::Fee;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Service area name for fees that apply across the whole jurisdiction.
pub const CITYWIDE: &str = "Citywide";

/// Which jurisdiction to price, and which of its service areas the project
/// sits in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionSelection {
    pub jurisdiction: String,
    #[serde(default, alias = "serviceAreas")]
    pub service_areas: Vec<String>,
}

impl JurisdictionSelection {
    pub fn new(jurisdiction: impl Into<String>) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            service_areas: Vec::new(),
        }
    }

    pub fn with_service_area(mut self, area: impl Into<String>) -> Self {
        self.service_areas.push(area.into());
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("jurisdiction '{0}' not found")]
    UnknownJurisdiction(String),
    #[error("no fees found for jurisdiction '{0}'")]
    NoFees(String),
    #[error("fee source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies fee definitions for a jurisdiction and its selected areas.
pub trait FeeRecordSource: Send + Sync {
    fn fetch_fees(&self, selection: &JurisdictionSelection) -> Result<Vec<Fee>, SourceError>;
}

fn is_citywide(area: &str) -> bool {
    let area = area.trim();
    area.is_empty() || area.eq_ignore_ascii_case(CITYWIDE)
}

fn same_fee(a: &Fee, b: &Fee) -> bool {
    a.name.trim().eq_ignore_ascii_case(b.name.trim())
        && a.agency_name.trim().eq_ignore_ascii_case(b.agency_name.trim())
}

/// Narrows a jurisdiction's fees to citywide fees plus the selected areas.
///
/// When a selected area defines the same fee (name and agency) as the
/// citywide schedule, the area-specific fee takes the citywide fee's place.
pub fn resolve_service_areas(fees: Vec<Fee>, selected_areas: &[String]) -> Vec<Fee> {
    let selected = |area: &str| {
        selected_areas
            .iter()
            .any(|candidate| candidate.trim().eq_ignore_ascii_case(area.trim()))
    };

    let mut resolved: Vec<Fee> = Vec::new();
    for fee in fees {
        let citywide = is_citywide(&fee.service_area);
        if !citywide && !selected(&fee.service_area) {
            continue;
        }

        let counterpart = resolved.iter().position(|kept| {
            is_citywide(&kept.service_area) != citywide && same_fee(kept, &fee)
        });
        match counterpart {
            Some(index) if !citywide => resolved[index] = fee,
            Some(_) => {}
            None => resolved.push(fee),
        }
    }

    resolved
}
