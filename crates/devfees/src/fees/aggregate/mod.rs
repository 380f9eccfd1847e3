mod breakdown;
mod insights;
pub mod views;

pub use breakdown::{aggregate, FeeBreakdown, FeeDiagnostic};
pub use insights::{InsightSettings, DEFAULT_PROJECTION_YEARS, DEFAULT_TOP_COST_DRIVERS};
