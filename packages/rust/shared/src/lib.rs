//! Shared types, error model, and configuration for texforge.
//!
//! This crate is the foundation depended on by all other texforge crates.
//! It provides:
//! - [`TexforgeError`] — the unified error type
//! - Domain types ([`PaperMetadata`], [`Author`], paper-directory layout)
//! - Configuration ([`AppConfig`], [`ToolchainConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildPolicyConfig, ToolchainConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{Result, TexforgeError};
pub use types::{
    Author, BIBLIOGRAPHY_FILE, BUILD_BASENAME, BUILD_DIR, FRAGMENT_EXTENSION, METADATA_FILE,
    PaperMetadata,
};
