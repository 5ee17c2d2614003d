//! Config subcommand handlers.

use std::path::PathBuf;

use gatewatch_config::{Config, config_path, save_config, starter_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

fn target_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Plaintext passwords never leave the process.
fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.gateways.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(REDACTED.into());
        }
    }
    cfg
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = redacted(config::load(global)?);
            let out = match global.output {
                OutputFormat::Table => toml::to_string_pretty(&cfg)?,
                format => output::render_single(format, &cfg, |_| String::new())?,
            };
            output::print_output(out.trim_end());
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&target_path(global).display().to_string());
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = target_path(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            save_config(&starter_config(), &path)?;
            eprintln!("Wrote starter config to {}", path.display());
            eprintln!("Edit the [gateways.home] url, then run: gatewatch status");
            Ok(())
        }
    }
}
