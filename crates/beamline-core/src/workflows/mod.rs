//! High-level, string-driven entry points for scripted reduction.

pub mod run;

pub use run::run_algorithm;
