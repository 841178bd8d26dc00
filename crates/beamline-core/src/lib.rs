//! # Beamline Core Library
//!
//! The execution core of the Beamline scientific data-reduction framework:
//! named, versioned compute kernels ("algorithms") that operate on shared,
//! name-keyed datasets ("workspaces"), with validated string-configurable
//! properties, cooperative cancellation, progress reporting, and disk-backed
//! paging for histograms too large to hold in memory.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models
//!   (`MatrixWorkspace`, `Histogram1D`), the validated property bag
//!   (`PropertyManager`), and the out-of-core block paging primitives.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates
//!   execution. It includes the `Algorithm` trait and its host state machine,
//!   the `AlgorithmRegistry` and `AlgorithmManager`, the shared `DataService`
//!   object store, and the built-in structural algorithms.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing
//!   layer. It drives the engine purely through names and string property
//!   values, which is the same surface scripting front ends and GUIs use.

pub mod core;
pub mod engine;
pub mod workflows;
