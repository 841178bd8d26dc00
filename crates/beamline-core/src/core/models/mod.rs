//! In-memory representations of the datasets algorithms exchange: histograms,
//! spectrum metadata, and the workspace types stored in the data service.

pub mod histogram;
pub mod spectrum;
pub mod table;
pub mod workspace;
