use super::value::PropertyValue;
use std::fmt;
use std::sync::Arc;

/// A validation rule attached to a declared property.
///
/// Validators run both when a value is assigned and again collectively in
/// `PropertyManager::validate_all` before an algorithm executes.
#[derive(Clone)]
pub enum Validator {
    /// The property must be explicitly set before execution.
    Mandatory,
    /// Numeric values (and each element of numeric lists) must fall inside
    /// the inclusive bounds.
    Bounds {
        lower: Option<f64>,
        upper: Option<f64>,
    },
    /// Text values must be one of the listed alternatives.
    AllowedValues(Vec<String>),
    /// Arbitrary predicate over the value.
    Predicate(Arc<dyn Fn(&PropertyValue) -> Result<(), String> + Send + Sync>),
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Mandatory => f.write_str("Mandatory"),
            Validator::Bounds { lower, upper } => f
                .debug_struct("Bounds")
                .field("lower", lower)
                .field("upper", upper)
                .finish(),
            Validator::AllowedValues(values) => {
                f.debug_tuple("AllowedValues").field(values).finish()
            }
            Validator::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl Validator {
    /// Convenience constructor for a predicate validator.
    pub fn predicate(
        check: impl Fn(&PropertyValue) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        Validator::Predicate(Arc::new(check))
    }

    /// Checks `value` against this rule; `is_set` tells whether the value was
    /// ever explicitly assigned.
    pub fn check(&self, value: &PropertyValue, is_set: bool) -> Result<(), String> {
        match self {
            Validator::Mandatory => {
                if is_set {
                    Ok(())
                } else {
                    Err("a value must be supplied".to_string())
                }
            }
            Validator::Bounds { lower, upper } => match value {
                PropertyValue::Int(_) | PropertyValue::Float(_) => {
                    check_bounds(value.as_number().unwrap_or(f64::NAN), *lower, *upper)
                }
                PropertyValue::IntList(values) => values
                    .iter()
                    .try_for_each(|&v| check_bounds(v as f64, *lower, *upper)),
                PropertyValue::FloatList(values) => values
                    .iter()
                    .try_for_each(|&v| check_bounds(v, *lower, *upper)),
                _ => Ok(()),
            },
            Validator::AllowedValues(allowed) => match value {
                PropertyValue::Text(v) => check_allowed(v, allowed),
                PropertyValue::TextList(values) => {
                    values.iter().try_for_each(|v| check_allowed(v, allowed))
                }
                _ => Ok(()),
            },
            Validator::Predicate(check) => check(value),
        }
    }
}

fn check_bounds(v: f64, lower: Option<f64>, upper: Option<f64>) -> Result<(), String> {
    if let Some(lo) = lower {
        if v < lo {
            return Err(format!("{v} is below the lower bound {lo}"));
        }
    }
    if let Some(hi) = upper {
        if v > hi {
            return Err(format!("{v} is above the upper bound {hi}"));
        }
    }
    Ok(())
}

fn check_allowed(v: &str, allowed: &[String]) -> Result<(), String> {
    if allowed.iter().any(|a| a == v) {
        Ok(())
    } else {
        Err(format!(
            "'{}' is not one of the allowed values [{}]",
            v,
            allowed.join(", ")
        ))
    }
}
