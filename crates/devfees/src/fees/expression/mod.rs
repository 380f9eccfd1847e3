//! Constrained formula language used by `custom` fees.
//!
//! Supports numbers, quoted strings, named project variables, arithmetic,
//! comparisons, `&&`/`||`/`!` and the `?:` ternary. There are no function
//! calls and no assignment.

mod eval;
mod lexer;
mod parser;

pub use eval::Value;

use super::domain::{FeeFormula, ProjectParameters};
use super::money::format_currency;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedCharacter { found: char, offset: usize },
    #[error("invalid number literal '{literal}' at offset {offset}")]
    InvalidNumber { literal: String, offset: usize },
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("unexpected token '{found}' at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },
    #[error("unexpected end of formula, expected {expected}")]
    UnexpectedEnd { expected: String },
    #[error("unknown variable '{name}'")]
    UnknownVariable { name: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("operator '{op}' cannot be applied to {found}")]
    TypeMismatch { op: &'static str, found: &'static str },
    #[error("result is not a finite number")]
    NonFinite,
    #[error("formula produced {found}, expected a number")]
    NotANumber { found: &'static str },
    #[error("custom fee has no usable formula")]
    MissingFormula,
    #[error("formula is empty")]
    Empty,
    #[error("formula nests deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error("formula uses more than {limit} operators")]
    TooLarge { limit: usize },
}

/// Named variables a formula can reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaContext {
    variables: BTreeMap<String, Value>,
}

impl FormulaContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.variables.insert(name.to_string(), value);
        self
    }

    /// Full variable set for single-expression formulas.
    pub fn for_project(params: &ProjectParameters, trips_per_unit: f64) -> Self {
        let units = f64::from(params.units);
        Self::new()
            .with("units", Value::Number(units))
            .with("squareFootage", Value::Number(params.square_footage))
            .with("projectValue", Value::Number(params.project_value))
            .with("valuation", Value::Number(params.project_value))
            .with("res_sqft", Value::Number(params.square_footage))
            .with("nonres_sqft", Value::Number(0.0))
            .with("total_sqft", Value::Number(params.square_footage))
            .with("trips", Value::Number(params.trip_count(trips_per_unit)))
            .with("meter_size", Value::Text(params.meter_size.clone()))
    }

    /// Narrower set visible to switch `when` conditions.
    pub fn switch_conditions(params: &ProjectParameters) -> Self {
        Self::new()
            .with("units", Value::Number(f64::from(params.units)))
            .with("valuation", Value::Number(params.project_value))
            .with("squareFootage", Value::Number(params.square_footage))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

/// Parses and evaluates `source` to any value.
pub fn evaluate(source: &str, context: &FormulaContext) -> Result<Value, ExpressionError> {
    let expr = parser::parse(source)?;
    eval::evaluate(&expr, &context.variables)
}

/// Parses and evaluates `source`, requiring a finite numeric result.
pub fn evaluate_number(source: &str, context: &FormulaContext) -> Result<f64, ExpressionError> {
    match evaluate(source, context)? {
        Value::Number(value) if value.is_finite() => Ok(value),
        Value::Number(_) => Err(ExpressionError::NonFinite),
        Value::Bool(flag) => Ok(if flag { 1.0 } else { 0.0 }),
        other => Err(ExpressionError::NotANumber {
            found: other.type_name(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormulaOutcome {
    Amount { value: f64, description: String },
    /// Every switch case evaluated falsy.
    NoMatch,
}

/// Evaluates a `custom` fee formula.
///
/// Switch cases are tried in order and the first truthy `when` decides the
/// amount. A failing condition or expression aborts the whole formula.
pub fn evaluate_formula(
    formula: Option<&FeeFormula>,
    params: &ProjectParameters,
    trips_per_unit: f64,
) -> Result<FormulaOutcome, ExpressionError> {
    match formula {
        Some(FeeFormula::Expression { expr }) => {
            let context = FormulaContext::for_project(params, trips_per_unit);
            let value = evaluate_number(expr, &context)?;
            Ok(FormulaOutcome::Amount {
                value,
                description: format!("Custom formula: {expr} = ${}", format_currency(value)),
            })
        }
        Some(FeeFormula::Switch { switch }) => {
            let conditions = FormulaContext::switch_conditions(params);
            let context = FormulaContext::for_project(params, trips_per_unit);
            for case in switch {
                if evaluate(&case.when, &conditions)?.is_truthy() {
                    let value = evaluate_number(&case.expr, &context)?;
                    return Ok(FormulaOutcome::Amount {
                        value,
                        description: format!(
                            "Custom formula (when {}): {} = ${}",
                            case.when,
                            case.expr,
                            format_currency(value)
                        ),
                    });
                }
            }
            Ok(FormulaOutcome::NoMatch)
        }
        Some(FeeFormula::MeterRates(_)) | None => Err(ExpressionError::MissingFormula),
    }
}
