use super::constraints::{constrain, BoundApplied};
use super::domain::{CalcMethod, CalculatedFee, Fallback, Fee, FeeFormula, ProjectParameters};
use super::expression::{evaluate_formula, FormulaOutcome};
use super::money::{format_currency, format_rate};

/// Trips generated per dwelling unit when a project does not state its trips.
pub const DEFAULT_TRIPS_PER_UNIT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculatorConfig {
    pub trips_per_unit: f64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            trips_per_unit: DEFAULT_TRIPS_PER_UNIT,
        }
    }
}

/// Unclamped amount for one fee, with its trace and any fallback taken.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeAmount {
    pub amount: f64,
    pub calculation: String,
    pub fallback: Option<Fallback>,
}

impl FeeAmount {
    fn computed(amount: f64, calculation: String) -> Self {
        Self {
            amount,
            calculation,
            fallback: None,
        }
    }

    fn fell_back(amount: f64, calculation: String, fallback: Fallback) -> Self {
        Self {
            amount,
            calculation,
            fallback: Some(fallback),
        }
    }
}

/// Pure per-fee calculator. Never fails and never logs; fallbacks are
/// reported on the returned value for the pipeline to act on.
#[derive(Debug, Clone, Default)]
pub struct FeeCalculator {
    config: CalculatorConfig,
}

impl FeeCalculator {
    pub fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Raw amount before clamping and rounding.
    pub fn calculate(&self, fee: &Fee, params: &ProjectParameters) -> FeeAmount {
        match (fee.calc_method, fee.base_rate) {
            (Some(method), Some(rate)) if rate.is_finite() => {
                self.calculate_method(method, rate, fee, params)
            }
            _ => legacy_amount(fee),
        }
    }

    /// Full evaluation: raw amount, clamps, rounding and a non-negative floor.
    pub fn evaluate(&self, fee: &Fee, params: &ProjectParameters) -> CalculatedFee {
        let raw = self.calculate(fee, params);
        let constrained = constrain(raw.amount, fee.min_fee, fee.max_fee);
        let amount = constrained.amount.max(0.0);

        let mut calculation = raw.calculation;
        match constrained.bound {
            Some(BoundApplied::Minimum(min)) => {
                calculation.push_str(&format!(" (minimum: ${})", format_currency(min)));
            }
            Some(BoundApplied::Maximum(max)) => {
                calculation.push_str(&format!(" (maximum: ${})", format_currency(max)));
            }
            None => {}
        }
        if fee.is_recurring {
            calculation.push_str(" per month");
        }

        CalculatedFee {
            fee_id: fee.id.clone(),
            fee_name: fee.name.clone(),
            category: fee.category.clone(),
            calculated_amount: amount,
            calculation,
            is_recurring: fee.is_recurring,
            agency_name: fee.agency_name.clone(),
            service_area: fee.service_area.clone(),
            fallback: raw.fallback,
        }
    }

    fn calculate_method(
        &self,
        method: CalcMethod,
        rate: f64,
        fee: &Fee,
        params: &ProjectParameters,
    ) -> FeeAmount {
        let amount = self.method_amount(method, rate, fee, params);
        if amount.amount.is_finite() {
            return amount;
        }
        FeeAmount::fell_back(
            rate,
            format!(
                "Amount out of range; base rate ${}",
                format_currency(rate)
            ),
            Fallback::NonFiniteAmount,
        )
    }

    fn method_amount(
        &self,
        method: CalcMethod,
        rate: f64,
        fee: &Fee,
        params: &ProjectParameters,
    ) -> FeeAmount {
        match method {
            CalcMethod::Flat => {
                FeeAmount::computed(rate, format!("Flat fee: ${}", format_currency(rate)))
            }
            CalcMethod::PerSqft => {
                let amount = rate * params.square_footage;
                FeeAmount::computed(
                    amount,
                    format!(
                        "${} × {} sq ft = ${}",
                        format_rate(rate),
                        format_quantity(params.square_footage),
                        format_currency(amount)
                    ),
                )
            }
            CalcMethod::PerUnit => {
                let amount = rate * f64::from(params.units);
                FeeAmount::computed(
                    amount,
                    format!(
                        "${} × {} units = ${}",
                        format_rate(rate),
                        params.units,
                        format_currency(amount)
                    ),
                )
            }
            CalcMethod::PercentOfValuation => {
                let amount = rate * params.project_value;
                FeeAmount::computed(
                    amount,
                    format!(
                        "{}% of ${} = ${}",
                        format_rate(rate * 100.0),
                        format_currency(params.project_value),
                        format_currency(amount)
                    ),
                )
            }
            CalcMethod::PerTrip => {
                let trips = params.trip_count(self.config.trips_per_unit);
                let amount = rate * trips;
                FeeAmount::computed(
                    amount,
                    format!(
                        "${} × {} trips = ${}",
                        format_rate(rate),
                        format_quantity(trips),
                        format_currency(amount)
                    ),
                )
            }
            CalcMethod::MeterSize => meter_amount(rate, fee, params),
            CalcMethod::Custom => {
                match evaluate_formula(fee.formula.as_ref(), params, self.config.trips_per_unit) {
                    Ok(FormulaOutcome::Amount { value, description }) => {
                        FeeAmount::computed(value, description)
                    }
                    Ok(FormulaOutcome::NoMatch) => FeeAmount::fell_back(
                        rate,
                        format!("No formula case matched; base rate ${}", format_currency(rate)),
                        Fallback::SwitchNoMatch,
                    ),
                    Err(error) => FeeAmount::fell_back(
                        rate,
                        format!("Formula unavailable; base rate ${}", format_currency(rate)),
                        Fallback::ExpressionFailed {
                            message: error.to_string(),
                        },
                    ),
                }
            }
        }
    }
}

/// Lookup key for a meter size: `5/8"` becomes `METER_5/8IN`, `1.5` becomes
/// `METER_1_5IN`.
pub fn meter_key(meter_size: &str) -> String {
    let normalized = meter_size.trim().replace('"', "").replace('.', "_");
    format!("METER_{normalized}IN")
}

fn meter_amount(rate: f64, fee: &Fee, params: &ProjectParameters) -> FeeAmount {
    let key = meter_key(&params.meter_size);
    let table_rate = match &fee.formula {
        Some(FeeFormula::MeterRates(rates)) => rates.get(&key).copied(),
        _ => None,
    };

    match table_rate.filter(|value| value.is_finite()) {
        Some(amount) => FeeAmount::computed(
            amount,
            format!(
                "{} meter: ${}",
                params.meter_size.trim(),
                format_currency(amount)
            ),
        ),
        None => FeeAmount::fell_back(
            rate,
            format!(
                "No rate for {key}; base rate ${}",
                format_currency(rate)
            ),
            Fallback::MeterRateMissing { key },
        ),
    }
}

fn legacy_amount(fee: &Fee) -> FeeAmount {
    match fee.legacy_rate.as_ref().and_then(|rate| rate.amount()) {
        Some(amount) => {
            FeeAmount::computed(amount, format!("Legacy rate: ${}", format_currency(amount)))
        }
        None => FeeAmount::fell_back(
            0.0,
            "No calculation data".to_string(),
            Fallback::MissingCalculationData,
        ),
    }
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let whole = format_currency(value);
        whole.trim_end_matches(".00").to_string()
    } else {
        format!("{value}")
    }
}
