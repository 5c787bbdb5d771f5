//! Configuration management for the console.
//!
//! Settings come from built-in defaults, then `config.toml`, then command line
//! flags, and are read back through [`Config::get`].

mod config;

pub use config::*;
