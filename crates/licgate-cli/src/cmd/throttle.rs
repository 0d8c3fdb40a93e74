use crate::output::print_json;
use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use licgate_core::config::GateConfig;
use licgate_core::throttle::read_state;
use std::path::Path;

#[derive(Subcommand)]
pub enum ThrottleSubcommand {
    /// Show the last successful license check and when the next may run
    Show,
}

pub fn run(config_path: &Path, subcmd: ThrottleSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ThrottleSubcommand::Show => show(config_path, json),
    }
}

fn show(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = GateConfig::load(config_path).context("failed to load config")?;
    let state = read_state(&config.throttle_state_path).with_context(|| {
        format!(
            "failed to read throttle state {}",
            config.throttle_state_path.display()
        )
    })?;
    let now = Utc::now();
    let next = state.next_allowed(now, config.interval());

    if json {
        let value = serde_json::json!({
            "path": config.throttle_state_path,
            "last_check": state.last_check,
            "next_allowed": next,
            "interval_seconds": config.interval_seconds,
        });
        return print_json(&value);
    }

    println!("State:      {}", config.throttle_state_path.display());
    match state.last_check {
        Some(ts) => println!("Last check: {}", ts.to_rfc3339()),
        None => println!("Last check: never"),
    }
    match next {
        Some(ts) => println!("Next check: {}", ts.to_rfc3339()),
        None => println!("Next check: now"),
    }
    Ok(())
}
