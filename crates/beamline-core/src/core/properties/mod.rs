//! The validated property bag algorithms are configured through.
//!
//! Every property converts to and from a string form, which is the surface
//! GUIs and scripting front ends drive execution with; typed access is
//! checked against the declared kind.

mod manager;
mod property;
mod validators;
mod value;

pub use manager::{PropertyError, PropertyManager};
pub use property::{Direction, Property};
pub use validators::Validator;
pub use value::{PropertyKind, PropertyValue};
