use super::breakdown::FeeBreakdown;
use super::views::BreakdownInsights;

pub const DEFAULT_PROJECTION_YEARS: u32 = 10;
pub const DEFAULT_TOP_COST_DRIVERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsightSettings {
    pub projection_years: u32,
    pub top_cost_drivers: usize,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            projection_years: DEFAULT_PROJECTION_YEARS,
            top_cost_drivers: DEFAULT_TOP_COST_DRIVERS,
        }
    }
}

pub(crate) fn generate_insights(
    breakdown: &FeeBreakdown,
    settings: &InsightSettings,
    units: u32,
) -> BreakdownInsights {
    BreakdownInsights {
        major_cost_drivers: breakdown.major_cost_drivers(settings.top_cost_drivers),
        projections: breakdown.projections(settings.projection_years),
        per_unit: breakdown.per_unit_costs(units),
        composition: breakdown.cost_composition(),
    }
}

impl FeeBreakdown {
    pub fn insights(&self, settings: &InsightSettings, units: u32) -> BreakdownInsights {
        generate_insights(self, settings, units)
    }
}
