//! Configuration module for Trawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Configuration is read-only once a scraper has been constructed from it.
//!
//! # Example
//!
//! ```no_run
//! use trawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("trawler.toml")).unwrap();
//! println!("Scraper will retry up to {} times", config.max_retries());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{HttpConfig, RequestConfig, ScraperConfig, StorageConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
