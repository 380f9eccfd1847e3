use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::fees::domain::{CalcMethod, CalculatedFee, Fee, ProjectParameters};
use crate::fees::source::{FeeRecordSource, JurisdictionSelection, SourceError};

pub(super) fn fee(id: &str, name: &str, method: CalcMethod, rate: f64) -> Fee {
    let mut fee = Fee::priced(id, name, method, rate);
    fee.agency_name = "Development Services".to_string();
    fee.service_area = "Citywide".to_string();
    fee
}

pub(super) fn categorized(fee: Fee, category: &str, agency: &str) -> Fee {
    Fee {
        category: category.to_string(),
        agency_name: agency.to_string(),
        ..fee
    }
}

pub(super) fn recurring(fee: Fee) -> Fee {
    Fee {
        is_recurring: true,
        ..fee
    }
}

pub(super) fn calculated(name: &str, category: &str, amount: f64, is_recurring: bool) -> CalculatedFee {
    CalculatedFee {
        fee_id: name.to_lowercase().replace(' ', "-"),
        fee_name: name.to_string(),
        category: category.to_string(),
        calculated_amount: amount,
        calculation: format!("Flat fee: ${amount:.2}"),
        is_recurring,
        agency_name: "Utilities".to_string(),
        service_area: "Citywide".to_string(),
        fallback: None,
    }
}

pub(super) fn project() -> ProjectParameters {
    ProjectParameters {
        units: 40,
        square_footage: 36_000.0,
        project_value: 6_500_000.0,
        acreage: 1.5,
        meter_size: "2\"".to_string(),
        trips: None,
    }
}

/// Multi-family schedule: one-time permits and impact fees plus two
/// monthly utility charges.
pub(super) fn springfield_fees() -> Vec<Fee> {
    vec![
        categorized(
            fee("sp-permit", "Building Permit", CalcMethod::PercentOfValuation, 0.0065),
            "Permits",
            "Development Services",
        ),
        categorized(
            fee("sp-park", "Park Impact Fee", CalcMethod::PerUnit, 1_800.0),
            "Impact Fees",
            "Parks",
        ),
        categorized(
            fee("sp-water", "Water Capacity Charge", CalcMethod::PerUnit, 2_250.0),
            "Water/Sewer",
            "Utilities",
        ),
        recurring(categorized(
            fee("sp-storm", "Stormwater Utility", CalcMethod::Flat, 85.0),
            "Stormwater",
            "Utilities",
        )),
        recurring(categorized(
            fee("sp-trash", "Solid Waste Service", CalcMethod::PerUnit, 22.5),
            "Solid Waste",
            "Sanitation",
        )),
    ]
}

pub(super) fn shelbyville_fees() -> Vec<Fee> {
    vec![
        categorized(
            fee("sh-permit", "Building Permit", CalcMethod::PerSqft, 0.95),
            "Permits",
            "Development Services",
        ),
        categorized(
            fee("sh-transport", "Transportation Impact Fee", CalcMethod::PerTrip, 310.0),
            "Impact Fees",
            "Transportation",
        ),
        recurring(categorized(
            fee("sh-storm", "Stormwater Utility", CalcMethod::Flat, 120.0),
            "Stormwater",
            "Utilities",
        )),
    ]
}

/// In-memory source that records which jurisdictions were fetched.
#[derive(Default)]
pub(super) struct MemorySource {
    fees: BTreeMap<String, Vec<Fee>>,
    failures: BTreeMap<String, SourceError>,
    pub(super) fetched: Mutex<Vec<String>>,
}

impl MemorySource {
    pub(super) fn with(mut self, jurisdiction: &str, fees: Vec<Fee>) -> Self {
        self.fees.insert(jurisdiction.to_string(), fees);
        self
    }

    pub(super) fn failing(mut self, jurisdiction: &str, error: SourceError) -> Self {
        self.failures.insert(jurisdiction.to_string(), error);
        self
    }

    pub(super) fn fetch_count(&self) -> usize {
        self.fetched.lock().expect("fetch log poisoned").len()
    }
}

impl FeeRecordSource for MemorySource {
    fn fetch_fees(&self, selection: &JurisdictionSelection) -> Result<Vec<Fee>, SourceError> {
        self.fetched
            .lock()
            .expect("fetch log poisoned")
            .push(selection.jurisdiction.clone());

        if let Some(error) = self.failures.get(&selection.jurisdiction) {
            return Err(error.clone());
        }
        self.fees
            .get(&selection.jurisdiction)
            .cloned()
            .ok_or_else(|| SourceError::UnknownJurisdiction(selection.jurisdiction.clone()))
    }
}
