use super::property::{Direction, Property};
use super::value::{PropertyKind, PropertyValue};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("A property named '{name}' is already declared")]
    DuplicateName { name: String },

    #[error("Unknown property '{name}'")]
    NotFound { name: String },

    #[error("Invalid value for property '{name}': {message}")]
    InvalidValue { name: String, message: String },

    #[error("Property '{name}' is declared as {declared}, not {requested}")]
    TypeMismatch {
        name: String,
        declared: PropertyKind,
        requested: PropertyKind,
    },
}

/// Holds the declared properties of one algorithm instance.
///
/// Names are unique case-insensitively, lookups are case-insensitive, and
/// iteration preserves declaration order so front ends can list properties
/// the way the author declared them. The manager never touches the data
/// service or any workspace.
#[derive(Debug, Clone, Default)]
pub struct PropertyManager {
    properties: Vec<Property>,
    index: HashMap<String, usize>,
}

impl PropertyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a plain property with the kind's zero value as default.
    pub fn declare(
        &mut self,
        name: &str,
        kind: PropertyKind,
        direction: Direction,
    ) -> Result<(), PropertyError> {
        self.declare_property(Property::new(name, kind, direction))
    }

    /// Declares a fully configured property (defaults, validators).
    pub fn declare_property(&mut self, property: Property) -> Result<(), PropertyError> {
        let key = property.name().to_lowercase();
        if self.index.contains_key(&key) {
            return Err(PropertyError::DuplicateName {
                name: property.name().to_string(),
            });
        }
        self.index.insert(key, self.properties.len());
        self.properties.push(property);
        Ok(())
    }

    fn find(&self, name: &str) -> Result<&Property, PropertyError> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.properties[i])
            .ok_or_else(|| PropertyError::NotFound {
                name: name.to_string(),
            })
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut Property, PropertyError> {
        match self.index.get(&name.to_lowercase()) {
            Some(&i) => Ok(&mut self.properties[i]),
            None => Err(PropertyError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Assigns a property from its string form, converting to the declared
    /// kind and running the validators.
    pub fn set_value(&mut self, name: &str, input: &str) -> Result<(), PropertyError> {
        let property = self.find_mut(name)?;
        let value = PropertyValue::parse(property.kind(), input).map_err(|message| {
            PropertyError::InvalidValue {
                name: property.name().to_string(),
                message,
            }
        })?;
        Self::assign(property, value)
    }

    /// Assigns a typed value; the value's kind must match the declaration.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), PropertyError> {
        let value = value.into();
        let property = self.find_mut(name)?;
        if value.kind() != property.kind() {
            return Err(PropertyError::TypeMismatch {
                name: property.name().to_string(),
                declared: property.kind(),
                requested: value.kind(),
            });
        }
        Self::assign(property, value)
    }

    fn assign(property: &mut Property, value: PropertyValue) -> Result<(), PropertyError> {
        let previous = std::mem::replace(&mut property.value, value);
        let was_set = std::mem::replace(&mut property.is_set, true);
        if let Err(message) = property.validate() {
            property.value = previous;
            property.is_set = was_set;
            return Err(PropertyError::InvalidValue {
                name: property.name().to_string(),
                message,
            });
        }
        Ok(())
    }

    /// The string form of the current value.
    pub fn get_value(&self, name: &str) -> Result<String, PropertyError> {
        Ok(self.find(name)?.value().to_string())
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, PropertyError> {
        match self.find(name)?.value() {
            PropertyValue::Bool(v) => Ok(*v),
            other => Err(mismatch(name, other.kind(), PropertyKind::Bool)),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64, PropertyError> {
        match self.find(name)?.value() {
            PropertyValue::Int(v) => Ok(*v),
            other => Err(mismatch(name, other.kind(), PropertyKind::Int)),
        }
    }

    pub fn get_float(&self, name: &str) -> Result<f64, PropertyError> {
        match self.find(name)?.value() {
            PropertyValue::Float(v) => Ok(*v),
            other => Err(mismatch(name, other.kind(), PropertyKind::Float)),
        }
    }

    pub fn get_text(&self, name: &str) -> Result<String, PropertyError> {
        match self.find(name)?.value() {
            PropertyValue::Text(v) => Ok(v.clone()),
            other => Err(mismatch(name, other.kind(), PropertyKind::Text)),
        }
    }

    pub fn get_int_list(&self, name: &str) -> Result<Vec<i64>, PropertyError> {
        match self.find(name)?.value() {
            PropertyValue::IntList(v) => Ok(v.clone()),
            other => Err(mismatch(name, other.kind(), PropertyKind::IntList)),
        }
    }

    pub fn get_float_list(&self, name: &str) -> Result<Vec<f64>, PropertyError> {
        match self.find(name)?.value() {
            PropertyValue::FloatList(v) => Ok(v.clone()),
            other => Err(mismatch(name, other.kind(), PropertyKind::FloatList)),
        }
    }

    pub fn get_text_list(&self, name: &str) -> Result<Vec<String>, PropertyError> {
        match self.find(name)?.value() {
            PropertyValue::TextList(v) => Ok(v.clone()),
            other => Err(mismatch(name, other.kind(), PropertyKind::TextList)),
        }
    }

    pub fn is_set(&self, name: &str) -> Result<bool, PropertyError> {
        Ok(self.find(name)?.is_set())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    /// Runs every property's validators in declaration order and reports the
    /// first failure.
    pub fn validate_all(&self) -> Result<(), PropertyError> {
        for property in &self.properties {
            if let Err(message) = property.validate() {
                return Err(PropertyError::InvalidValue {
                    name: property.name().to_string(),
                    message,
                });
            }
        }
        Ok(())
    }

    /// Properties in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn mismatch(name: &str, declared: PropertyKind, requested: PropertyKind) -> PropertyError {
    PropertyError::TypeMismatch {
        name: name.to_string(),
        declared,
        requested,
    }
}
