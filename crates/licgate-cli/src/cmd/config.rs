use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use licgate_core::config::{GateConfig, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration, defaults included
    Show,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(config_path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let config = GateConfig::load(config_path).context("failed to load config")?;
    match subcmd {
        ConfigSubcommand::Show => show(&config, json),
        ConfigSubcommand::Validate => validate(&config, json),
    }
}

fn show(config: &GateConfig, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(config);
    }
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

fn validate(config: &GateConfig, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
