//! Configuration management commands.

use clap::{Args, Subcommand};
use voxbridge_cli::Context;
use voxbridge_cli::config::{DEFAULT_BIND, DEFAULT_TARGET};
use voxbridge_rtpstream::StreamConfig;

use super::{get_config, output, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Contexts name an RTP target and the stream parameters to use with it,
/// similar to kubectl's context management.
///
/// Configuration is stored in ~/.voxbridge/voxbridge/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add or replace a context
    #[command(name = "add-context")]
    AddContext {
        /// Context name
        name: String,
        /// RTP destination host:port
        #[arg(long, default_value = DEFAULT_TARGET)]
        target: String,
        /// Local bind address
        #[arg(long, default_value = DEFAULT_BIND)]
        bind: String,
        /// RTP synchronization source
        #[arg(long)]
        ssrc: Option<u32>,
        /// RTP payload type, 0-127
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
        payload_type: Option<u8>,
    },
    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },
    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },
    /// Display the current context
    #[command(name = "get-context")]
    GetContext,
    /// List all contexts
    #[command(name = "list-contexts", alias = "get-contexts")]
    ListContexts,
    /// View the current configuration
    View,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::AddContext {
                name,
                target,
                bind,
                ssrc,
                payload_type,
            } => {
                let mut cfg = get_config(cli)?;

                let stream = if ssrc.is_some() || payload_type.is_some() {
                    let mut stream = StreamConfig::default();
                    if let Some(ssrc) = ssrc {
                        stream.ssrc = *ssrc;
                    }
                    if let Some(pt) = payload_type {
                        stream.payload_type = *pt;
                    }
                    Some(stream)
                } else {
                    None
                };

                let ctx = Context {
                    target: target.clone(),
                    bind: bind.clone(),
                    stream,
                    ..Default::default()
                };

                cfg.add_context(name, ctx)?;
                print_success(&format!("Context \"{}\" added successfully", name));
                Ok(())
            }

            ConfigSubcommand::DeleteContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::GetContext => {
                let cfg = get_config(cli)?;
                if cfg.current_context.is_empty() {
                    println!("No current context set");
                } else {
                    println!("{}", cfg.current_context);
                }
                Ok(())
            }

            ConfigSubcommand::ListContexts => {
                let cfg = get_config(cli)?;

                if cfg.contexts.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<24} {}", "CURRENT", "NAME", "TARGET", "SSRC");
                for (name, ctx) in &cfg.contexts {
                    let current = if name == &cfg.current_context { "*" } else { "" };
                    println!(
                        "{:<8} {:<20} {:<24} {}",
                        current,
                        name,
                        ctx.target,
                        ctx.stream_config().ssrc
                    );
                }

                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;
                eprintln!("Config file: {}", cfg.path().display());
                output(cli).write(&cfg)
            }
        }
    }
}
