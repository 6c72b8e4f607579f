//! Shared types, error model, and configuration for opsplit.
//!
//! This crate is the foundation depended on by all other opsplit crates.
//! It provides:
//! - [`OpsplitError`] — the unified error type
//! - Domain types ([`Step`], [`OperationRecord`], [`SplitRecord`])
//! - Configuration ([`AppConfig`], [`BackendConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BackendConfig, BackendKind, BackendSection, DefaultsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{OpsplitError, Result};
pub use types::{DefBlock, OperationRecord, PathInfo, ProductInfo, RecordMeta, SplitRecord, Step};
