//! Configuration module for Ripple-Parse
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to crawler defaults.
//!
//! # Example
//!
//! ```no_run
//! use ripple_parse::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Link cap: {}", config.parser.max_outgoing_links_to_follow);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DynamicConfig, ParserConfig, RenderEngine, DEFAULT_MAX_DOWNLOAD_SIZE,
    DEFAULT_MAX_OUTGOING_LINKS, DEFAULT_MAX_WAIT_SECONDS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, MAX_WAIT_SECONDS_LIMIT};
