//! Configuration management utilities
//!
//! Environment variable loading with typed parsing and defaults.

pub mod env;

pub use env::{get_env, get_env_bool, get_env_bool_or, get_env_or, get_env_parse, get_env_parse_or};
