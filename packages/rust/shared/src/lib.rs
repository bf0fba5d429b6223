//! Shared types, error model, and configuration for topicpress.
//!
//! This crate is the foundation depended on by all other topicpress crates.
//! It provides:
//! - [`TopicPressError`], the unified error type
//! - Domain types ([`TopicNode`], [`RunConfig`], [`SourceLayout`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, LayoutConfig, RenderConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, parse_ignore_list,
};
pub use error::{Result, TopicPressError};
pub use types::{DOCUMENT_EXTENSIONS, RunConfig, SourceLayout, TopicNode};
