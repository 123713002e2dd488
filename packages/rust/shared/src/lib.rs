//! Shared types, error model, and configuration for chemfuse.
//!
//! This crate is the foundation depended on by all other chemfuse crates.
//! It provides:
//! - [`ChemFuseError`] — the unified error type
//! - Domain types ([`MaterialSummary`], [`AggregatedRecord`], [`ChemTable`],
//!   the decoded [`PropertyPayload`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LimitsConfig, PipelineConfig, ProvidersConfig, ServerConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{ChemFuseError, Result};
pub use types::{
    AggregatedRecord, ChemTable, CompoundEntry, CompoundProp, MaterialSummary, PropUrn,
    PropValue, PropertyPayload,
};
