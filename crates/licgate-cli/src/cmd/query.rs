use crate::output::{print_json, print_table};
use anyhow::Context;
use licgate_core::config::GateConfig;
use licgate_core::lmstat::Lmstat;
use std::path::Path;

pub fn run(config_path: &Path, feature: &str, server: &str, json: bool) -> anyhow::Result<()> {
    let config = GateConfig::load(config_path).context("failed to load config")?;
    let lmstat = Lmstat::new(
        config.resolve_lmutil()?,
        config.vendor_daemon.clone(),
        config.query_timeout(),
    );

    let quote = lmstat.query(server, feature)?;
    let managed = config.managed().contains(feature);

    if json {
        let value = serde_json::json!({
            "feature": feature,
            "server": server,
            "issued": quote.issued,
            "used": quote.used,
            "free": quote.free(),
            "managed": managed,
        });
        return print_json(&value);
    }

    print_table(
        &["FEATURE", "ISSUED", "USED", "FREE", "MANAGED"],
        vec![vec![
            feature.to_string(),
            quote.issued.to_string(),
            quote.used.to_string(),
            quote.free().to_string(),
            if managed { "yes" } else { "no" }.to_string(),
        ]],
    );
    Ok(())
}
