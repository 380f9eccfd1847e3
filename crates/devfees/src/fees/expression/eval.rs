use super::parser::{BinaryOp, Expr, UnaryOp};
use super::ExpressionError;
use std::collections::BTreeMap;
use std::fmt;

/// Runtime value produced while evaluating a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(value) => *value != 0.0 && !value.is_nan(),
            Value::Bool(flag) => *flag,
            Value::Text(text) => !text.is_empty(),
        }
    }

    /// Numeric view used by arithmetic; booleans count as 0/1, text never coerces.
    fn as_number(&self, op: &'static str) -> Result<f64, ExpressionError> {
        match self {
            Value::Number(value) => Ok(*value),
            Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
            Value::Text(_) => Err(ExpressionError::TypeMismatch {
                op,
                found: self.type_name(),
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(value) => write!(f, "{value}"),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Text(text) => write!(f, "'{text}'"),
        }
    }
}

pub(crate) fn evaluate(expr: &Expr, scope: &BTreeMap<String, Value>) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Number(value) => Ok(Value::Number(*value)),
        Expr::Bool(flag) => Ok(Value::Bool(*flag)),
        Expr::Text(text) => Ok(Value::Text(text.clone())),
        Expr::Variable(name) => scope
            .get(name)
            .cloned()
            .ok_or_else(|| ExpressionError::UnknownVariable { name: name.clone() }),
        Expr::Unary(op, operand) => {
            let value = evaluate(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Negate => Ok(Value::Number(-value.as_number("-")?)),
                UnaryOp::Plus => Ok(Value::Number(value.as_number("+")?)),
            }
        }
        Expr::And(left, right) => {
            let left = evaluate(left, scope)?;
            if !left.is_truthy() {
                return Ok(left);
            }
            evaluate(right, scope)
        }
        Expr::Or(left, right) => {
            let left = evaluate(left, scope)?;
            if left.is_truthy() {
                return Ok(left);
            }
            evaluate(right, scope)
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if evaluate(condition, scope)?.is_truthy() {
                evaluate(then, scope)
            } else {
                evaluate(otherwise, scope)
            }
        }
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            binary(*op, &left, &right)
        }
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ExpressionError> {
    match op {
        BinaryOp::Equal => Ok(Value::Bool(loosely_equal(left, right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!loosely_equal(left, right))),
        BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
            let symbol = symbol(op);
            let ordering = match (left, right) {
                (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
                _ => left
                    .as_number(symbol)?
                    .partial_cmp(&right.as_number(symbol)?),
            };
            let result = match ordering {
                None => false,
                Some(ordering) => match op {
                    BinaryOp::Less => ordering.is_lt(),
                    BinaryOp::LessEq => ordering.is_le(),
                    BinaryOp::Greater => ordering.is_gt(),
                    _ => ordering.is_ge(),
                },
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add
        | BinaryOp::Subtract
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Remainder => {
            let symbol = symbol(op);
            let a = left.as_number(symbol)?;
            let b = right.as_number(symbol)?;
            let value = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                BinaryOp::Divide | BinaryOp::Remainder if b == 0.0 => {
                    return Err(ExpressionError::DivisionByZero)
                }
                BinaryOp::Divide => a / b,
                _ => a % b,
            };
            if !value.is_finite() {
                return Err(ExpressionError::NonFinite);
            }
            Ok(Value::Number(value))
        }
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Text(_), _) | (_, Value::Text(_)) => false,
        _ => match (left.as_number("=="), right.as_number("==")) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Subtract => "-",
        BinaryOp::Multiply => "*",
        BinaryOp::Divide => "/",
        BinaryOp::Remainder => "%",
        BinaryOp::Less => "<",
        BinaryOp::LessEq => "<=",
        BinaryOp::Greater => ">",
        BinaryOp::GreaterEq => ">=",
        BinaryOp::Equal => "==",
        BinaryOp::NotEqual => "!=",
    }
}
