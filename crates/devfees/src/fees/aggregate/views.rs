use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostDriver {
    pub category: String,
    pub amount: f64,
}

/// Cumulative cost at the end of `year`, without rate escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    pub annual_operating: f64,
    pub cumulative_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerUnitCosts {
    pub units: u32,
    pub development: f64,
    pub monthly: f64,
    pub first_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostShare {
    pub amount: f64,
    pub share_pct: f64,
}

/// How year-one spend divides between connection, impact, other one-time
/// and operating costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostComposition {
    pub water_sewer: CostShare,
    pub impact: CostShare,
    pub other_one_time: CostShare,
    pub operating_year_one: CostShare,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownInsights {
    pub major_cost_drivers: Vec<CostDriver>,
    pub projections: Vec<ProjectionYear>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_unit: Option<PerUnitCosts>,
    pub composition: CostComposition,
}
