//! # hourspot
//!
//! Answers "which cities currently have local time ≈ HH:00?" against a
//! world city gazetteer, relaxing the population floor when too few cities
//! qualify.
//!
//! ## Architecture
//!
//! - **args**: Command-line parsing into a `CliAction`
//! - **catalog**: City data model and bulk catalog build
//! - **config**: Configuration loading, validation, and default generation
//! - **constants**: Application-wide constants and defaults
//! - **gazetteer**: GeoNames dump import (the catalog's input rows)
//! - **logger**: Structured logging with visual formatting
//! - **round_robin**: Fairness-preserving interleaving by grouping key
//! - **resolver**: Population threshold relaxation over the winning zones
//! - **sampler**: Uniform random selection via count+offset
//! - **snapshot**: Which IANA zones are at a given local hour right now
//! - **store**: Per-timezone partitioned city store

pub mod args;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod gazetteer;
pub mod logger;
pub mod resolver;
pub mod round_robin;
pub mod sampler;
pub mod snapshot;
pub mod store;

// Re-export important types for easier access
pub use catalog::{Catalog, City, CityRecord, ResolvedCity, Timezone};
pub use config::Config;
pub use logger::{Log, LogLevel};
pub use store::{CityStore, StoreError};
