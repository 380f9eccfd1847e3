pub mod aggregate;
pub mod calculation;
pub mod calculator;
pub mod comparison;
pub mod constraints;
pub mod domain;
pub mod engine;
pub mod expression;
mod lenient;
pub mod money;
pub mod relevance;
pub mod schedule;
pub mod source;

pub use aggregate::{aggregate, FeeBreakdown, FeeDiagnostic, InsightSettings};
pub use calculation::{
    CalculationRequest, CalculationState, JurisdictionCalculation, RequestTicket,
};
pub use calculator::{CalculatorConfig, FeeAmount, FeeCalculator, DEFAULT_TRIPS_PER_UNIT};
pub use comparison::{
    compare, CheaperSide, ComparisonError, ComparisonReport, CostMetric, JurisdictionResult,
    MetricComparison, MetricRanking, PairwiseComparison,
};
pub use constraints::clamp;
pub use domain::{
    CalcMethod, CalculatedFee, Fallback, Fee, FeeFormula, LegacyRate, ProjectParameters,
    SwitchCase,
};
pub use engine::FeeEngine;
pub use expression::{evaluate_formula, ExpressionError, FormulaContext, FormulaOutcome};
pub use relevance::{filter_fees, ProjectType};
pub use schedule::{FeeSchedule, ScheduleImportError};
pub use source::{
    resolve_service_areas, FeeRecordSource, JurisdictionSelection, SourceError, CITYWIDE,
};

#[cfg(test)]
mod tests;
