use super::validators::Validator;
use super::value::{PropertyKind, PropertyValue};

/// Whether a property feeds data into an algorithm, carries a result out, or
/// both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
    InOut,
}

/// A single named, typed, validated configuration value on an algorithm.
#[derive(Debug, Clone)]
pub struct Property {
    pub(crate) name: String,
    pub(crate) kind: PropertyKind,
    pub(crate) direction: Direction,
    pub(crate) value: PropertyValue,
    pub(crate) default: PropertyValue,
    pub(crate) is_set: bool,
    pub(crate) validators: Vec<Validator>,
}

impl Property {
    pub fn new(name: &str, kind: PropertyKind, direction: Direction) -> Self {
        let default = PropertyValue::default_for(kind);
        Self {
            name: name.to_string(),
            kind,
            direction,
            value: default.clone(),
            default,
            is_set: false,
            validators: Vec::new(),
        }
    }

    /// Sets the default (and initial) value; panics in debug builds if the
    /// value's kind disagrees with the declared kind.
    pub fn with_default(mut self, default: impl Into<PropertyValue>) -> Self {
        let default = default.into();
        debug_assert_eq!(default.kind(), self.kind);
        self.value = default.clone();
        self.default = default;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    /// Whether the value was ever explicitly assigned.
    pub fn is_set(&self) -> bool {
        self.is_set
    }

    /// Whether the current value equals the declared default.
    pub fn is_default(&self) -> bool {
        self.value == self.default
    }

    /// Runs every validator against the current value.
    pub(crate) fn validate(&self) -> Result<(), String> {
        self.validators
            .iter()
            .try_for_each(|v| v.check(&self.value, self.is_set))
    }
}
