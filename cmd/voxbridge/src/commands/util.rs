//! Utility functions for CLI commands.

use voxbridge_cli::{Config, Context, Output, OutputFormat, load_config};

use crate::Cli;

pub const APP_NAME: &str = "voxbridge";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context to use, or the defaults if none is selected.
///
/// Naming a context that does not exist is an error.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;

    match cfg.resolve_context(cli.context.as_deref()) {
        Some(ctx) => Ok(ctx.clone()),
        None => match cli.context.as_deref() {
            Some(name) if !name.is_empty() => anyhow::bail!("context '{}' not found", name),
            _ => Ok(Context::default()),
        },
    }
}

/// Builds the output configured by the global flags.
pub fn output(cli: &Cli) -> Output {
    Output::new(OutputFormat::from_json_flag(cli.json), cli.output.clone())
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}

/// Formats bytes to human readable string.
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
