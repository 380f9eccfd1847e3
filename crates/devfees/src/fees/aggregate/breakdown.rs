use super::super::domain::{CalculatedFee, Fallback};
use super::super::money::{round_currency, serialize_cent_map, serialize_cents};
use super::views::{CostComposition, CostDriver, CostShare, PerUnitCosts, ProjectionYear};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A fee whose amount did not come from its declared calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeDiagnostic {
    pub fee_id: String,
    pub fee_name: String,
    pub fallback: Fallback,
}

/// Roll-up of every calculated fee for one jurisdiction.
///
/// `annual_operating_costs` is exactly `monthly_fees * 12` and
/// `first_year_total` is exactly `one_time_fees + annual_operating_costs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub fees: Vec<CalculatedFee>,
    #[serde(serialize_with = "serialize_cents")]
    pub one_time_fees: f64,
    #[serde(serialize_with = "serialize_cents")]
    pub monthly_fees: f64,
    #[serde(serialize_with = "serialize_cents")]
    pub annual_operating_costs: f64,
    #[serde(serialize_with = "serialize_cents")]
    pub first_year_total: f64,
    #[serde(serialize_with = "serialize_cent_map")]
    pub by_category: BTreeMap<String, f64>,
    #[serde(serialize_with = "serialize_cent_map")]
    pub by_agency: BTreeMap<String, f64>,
    #[serde(default)]
    pub diagnostics: Vec<FeeDiagnostic>,
}

/// Rolls calculated fees up into a breakdown.
///
/// Zero-amount fees stay in `fees` but do not contribute to any total.
pub fn aggregate(fees: Vec<CalculatedFee>) -> FeeBreakdown {
    let mut one_time = 0.0;
    let mut monthly = 0.0;
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    let mut by_agency: BTreeMap<String, f64> = BTreeMap::new();

    for fee in fees.iter().filter(|fee| fee.calculated_amount > 0.0) {
        if fee.is_recurring {
            monthly += fee.calculated_amount;
        } else {
            one_time += fee.calculated_amount;
        }
        *by_category.entry(fee.category.clone()).or_default() += fee.calculated_amount;
        *by_agency.entry(fee.agency_name.clone()).or_default() += fee.calculated_amount;
    }

    let diagnostics = fees
        .iter()
        .filter_map(|fee| {
            fee.fallback.as_ref().map(|fallback| FeeDiagnostic {
                fee_id: fee.fee_id.clone(),
                fee_name: fee.fee_name.clone(),
                fallback: fallback.clone(),
            })
        })
        .collect();

    let one_time_fees = round_currency(one_time);
    let monthly_fees = round_currency(monthly);
    let annual_operating_costs = monthly_fees * 12.0;

    FeeBreakdown {
        fees,
        one_time_fees,
        monthly_fees,
        annual_operating_costs,
        first_year_total: one_time_fees + annual_operating_costs,
        by_category,
        by_agency,
        diagnostics,
    }
}

impl FeeBreakdown {
    /// Fees that contribute to the totals.
    pub fn applicable_fees(&self) -> impl Iterator<Item = &CalculatedFee> {
        self.fees.iter().filter(|fee| fee.calculated_amount > 0.0)
    }

    pub fn one_time(&self) -> impl Iterator<Item = &CalculatedFee> {
        self.applicable_fees().filter(|fee| !fee.is_recurring)
    }

    pub fn recurring(&self) -> impl Iterator<Item = &CalculatedFee> {
        self.applicable_fees().filter(|fee| fee.is_recurring)
    }

    pub fn has_fallbacks(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// The `limit` largest categories, highest first; ties order by name.
    pub fn major_cost_drivers(&self, limit: usize) -> Vec<CostDriver> {
        let mut drivers: Vec<CostDriver> = self
            .by_category
            .iter()
            .map(|(category, amount)| CostDriver {
                category: category.clone(),
                amount: round_currency(*amount),
            })
            .collect();
        drivers.sort_by(|a, b| {
            b.amount
                .partial_cmp(&a.amount)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.category.cmp(&b.category))
        });
        drivers.truncate(limit);
        drivers
    }

    pub fn projections(&self, years: u32) -> Vec<ProjectionYear> {
        (1..=years)
            .map(|year| ProjectionYear {
                year,
                annual_operating: round_currency(self.annual_operating_costs),
                cumulative_total: round_currency(
                    self.one_time_fees + self.annual_operating_costs * f64::from(year),
                ),
            })
            .collect()
    }

    /// Per-unit figures; only meaningful for multi-unit projects.
    pub fn per_unit_costs(&self, units: u32) -> Option<PerUnitCosts> {
        if units <= 1 {
            return None;
        }
        let count = f64::from(units);
        Some(PerUnitCosts {
            units,
            development: round_currency(self.one_time_fees / count),
            monthly: round_currency(self.monthly_fees / count),
            first_year: round_currency(self.first_year_total / count),
        })
    }

    pub fn cost_composition(&self) -> CostComposition {
        let mut water_sewer = 0.0;
        let mut impact = 0.0;
        for fee in self.one_time() {
            let category = fee.category.to_lowercase();
            if category.contains("water") || category.contains("sewer") {
                water_sewer += fee.calculated_amount;
            } else if category.contains("impact") {
                impact += fee.calculated_amount;
            }
        }
        let other_one_time = (self.one_time_fees - water_sewer - impact).max(0.0);
        let total = self.one_time_fees + self.annual_operating_costs;

        let share = |amount: f64| CostShare {
            amount: round_currency(amount),
            share_pct: if total > 0.0 {
                round_currency(amount / total * 100.0)
            } else {
                0.0
            },
        };

        CostComposition {
            water_sewer: share(water_sewer),
            impact: share(impact),
            other_one_time: share(other_one_time),
            operating_year_one: share(self.annual_operating_costs),
            total: round_currency(total),
        }
    }
}
