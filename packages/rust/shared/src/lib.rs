//! Shared types, error model, and configuration for ContentFlow.
//!
//! This crate is the foundation depended on by all other ContentFlow crates.
//! It provides:
//! - [`ContentFlowError`]: the unified error type
//! - Domain types ([`Prd`], [`ContentVersion`], [`Stage`], [`FactCheckReport`])
//! - Configuration ([`AppConfig`], config loading, secret resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuthConfig, ServerConfig, StoreBackend, StoreConfig, SupabaseConfig,
    SupabaseCredentials, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_api_key, resolve_api_key_with, resolve_supabase,
    resolve_supabase_with,
};
pub use error::{ContentFlowError, Result};
pub use types::{
    ContentVersion, FactCheckReport, FactCheckStatus, NewPrd, Prd, PrdId, Stage,
};
