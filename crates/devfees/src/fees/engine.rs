use super::aggregate::{aggregate, FeeBreakdown, InsightSettings};
use super::calculation::CalculationRequest;
use super::calculator::{CalculatorConfig, FeeCalculator};
use super::comparison::{compare, ComparisonError, ComparisonReport, JurisdictionResult};
use super::domain::{Fee, ProjectParameters};
use super::relevance::{filter_fees, ProjectType};
use super::source::{FeeRecordSource, SourceError};
use crate::config::EngineConfig;
use std::thread;
use tracing::{debug, info, info_span, warn};

/// Runs the fee pipeline: relevance filter, per-fee calculation and
/// aggregation. Holds no per-request state and is safe to share across
/// threads.
#[derive(Debug, Clone, Default)]
pub struct FeeEngine {
    calculator: FeeCalculator,
    insights: InsightSettings,
}

impl FeeEngine {
    pub fn new(calculator: FeeCalculator, insights: InsightSettings) -> Self {
        Self {
            calculator,
            insights,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            FeeCalculator::new(CalculatorConfig {
                trips_per_unit: config.trips_per_unit,
            }),
            InsightSettings {
                projection_years: config.projection_years,
                top_cost_drivers: config.top_cost_drivers,
            },
        )
    }

    pub fn calculator(&self) -> &FeeCalculator {
        &self.calculator
    }

    pub fn insight_settings(&self) -> &InsightSettings {
        &self.insights
    }

    /// Recomputes the breakdown for `fees` from scratch.
    pub fn recalculate(
        &self,
        fees: &[Fee],
        params: &ProjectParameters,
        project_type: Option<&ProjectType>,
    ) -> FeeBreakdown {
        let applicable: Vec<&Fee> = match project_type {
            Some(project_type) => filter_fees(fees, project_type),
            None => fees.iter().collect(),
        };

        let calculated = applicable
            .into_iter()
            .map(|fee| {
                let result = self.calculator.evaluate(fee, params);
                if let Some(fallback) = &result.fallback {
                    warn!(
                        fee_id = %fee.id,
                        fee_name = %fee.name,
                        reason = %fallback,
                        "fee calculation fell back"
                    );
                }
                result
            })
            .collect();

        let breakdown = aggregate(calculated);
        debug!(
            fees = breakdown.fees.len(),
            filtered_out = fees.len() - breakdown.fees.len(),
            one_time = breakdown.one_time_fees,
            monthly = breakdown.monthly_fees,
            first_year = breakdown.first_year_total,
            "fee breakdown computed"
        );
        breakdown
    }

    /// Fetches one jurisdiction's fees and prices them.
    pub fn calculate_jurisdiction(
        &self,
        source: &dyn FeeRecordSource,
        request: &CalculationRequest,
    ) -> Result<JurisdictionResult, SourceError> {
        let span = info_span!(
            "jurisdiction",
            jurisdiction = %request.selection.jurisdiction
        );
        let _entered = span.enter();

        let fees = source.fetch_fees(&request.selection).map_err(|err| {
            warn!(error = %err, "fee fetch failed");
            err
        })?;

        let breakdown = self.recalculate(&fees, &request.params, request.project_type.as_ref());
        info!(
            fees = breakdown.fees.len(),
            fallbacks = breakdown.diagnostics.len(),
            first_year = breakdown.first_year_total,
            "jurisdiction calculated"
        );

        Ok(JurisdictionResult {
            jurisdiction: request.selection.jurisdiction.clone(),
            breakdown,
        })
    }

    /// Calculates every requested jurisdiction on its own thread, then
    /// compares them. Any fetch failure fails the comparison.
    pub fn compare_jurisdictions(
        &self,
        source: &dyn FeeRecordSource,
        requests: &[CalculationRequest],
    ) -> Result<ComparisonReport, ComparisonError> {
        if requests.len() < 2 {
            return Err(ComparisonError::NotEnoughJurisdictions {
                found: requests.len(),
            });
        }

        let outcomes: Vec<Result<JurisdictionResult, SourceError>> = thread::scope(|scope| {
            let handles: Vec<_> = requests
                .iter()
                .map(|request| scope.spawn(move || self.calculate_jurisdiction(source, request)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        });

        let results = outcomes
            .into_iter()
            .zip(requests)
            .map(|(outcome, request)| {
                outcome.map_err(|source| ComparisonError::Fetch {
                    jurisdiction: request.selection.jurisdiction.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        compare(&results)
    }
}
