//! Comparison operators used by ability, flag and relation checks.

use actor_rules::FlagValue;
use std::cmp::Ordering;
use std::fmt;

/// A comparison operator as written in a requirement's `op` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CompareOp {
    #[default]
    Gte,
    Lte,
    Gt,
    Lt,
    /// `==`, loose equality.
    Eq,
    /// `===`, same kind and value.
    StrictEq,
    Ne,
    /// Left side appears in a comma-separated list.
    In,
    /// Left side contains the right side.
    Has,
    /// Unrecognised operator; compares by truthiness of the left side.
    Other(String),
}

impl CompareOp {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            ">=" => CompareOp::Gte,
            "<=" => CompareOp::Lte,
            ">" => CompareOp::Gt,
            "<" => CompareOp::Lt,
            "==" => CompareOp::Eq,
            "===" => CompareOp::StrictEq,
            "!=" => CompareOp::Ne,
            "in" => CompareOp::In,
            "has" => CompareOp::Has,
            _ => CompareOp::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
            CompareOp::StrictEq => "===",
            CompareOp::Ne => "!=",
            CompareOp::In => "in",
            CompareOp::Has => "has",
            CompareOp::Other(raw) => raw,
        }
    }

    /// Compare `lhs` (the actor's value, possibly absent) against `rhs`.
    pub fn compare(&self, lhs: Option<&FlagValue>, rhs: &FlagValue) -> bool {
        let Some(lhs) = lhs else {
            return matches!(self, CompareOp::Ne);
        };
        match self {
            CompareOp::Gte => ordering(lhs, rhs).is_some_and(Ordering::is_ge),
            CompareOp::Lte => ordering(lhs, rhs).is_some_and(Ordering::is_le),
            CompareOp::Gt => ordering(lhs, rhs).is_some_and(Ordering::is_gt),
            CompareOp::Lt => ordering(lhs, rhs).is_some_and(Ordering::is_lt),
            CompareOp::Eq => lhs.loose_eq(rhs),
            CompareOp::StrictEq => lhs.strict_eq(rhs),
            CompareOp::Ne => !lhs.loose_eq(rhs),
            CompareOp::In => {
                let wanted = lhs.to_string();
                rhs.to_string().split(',').any(|entry| entry.trim() == wanted)
            }
            CompareOp::Has => match lhs {
                FlagValue::String(s) => s.contains(&rhs.to_string()),
                _ => false,
            },
            CompareOp::Other(_) => lhs.is_truthy(),
        }
    }

    /// Numeric comparison; an unknown operator passes when `lhs` is non-zero.
    pub fn compare_numbers(&self, lhs: f64, rhs: f64) -> bool {
        self.compare(Some(&number(lhs)), &number(rhs))
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn number(value: f64) -> FlagValue {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        FlagValue::Int(value as i64)
    } else {
        FlagValue::Float(value)
    }
}

/// Numeric when both sides read as numbers, lexical when both are text.
fn ordering(lhs: &FlagValue, rhs: &FlagValue) -> Option<Ordering> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (lhs, rhs) {
            (FlagValue::String(a), FlagValue::String(b)) => Some(a.cmp(b)),
            _ => None,
        },
    }
}
