//! CLI utilities for voxbridge.
//!
//! Context-based configuration and structured output shared by the
//! command-line tools.

pub mod config;
pub mod output;

pub use config::{Config, Context, load_config, save_config};
pub use output::{Output, OutputFormat};
