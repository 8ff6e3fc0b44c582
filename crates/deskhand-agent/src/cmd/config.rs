use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use deskhand_core::config::{Config, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Validate the config file and check that configured tools exist
    Check,

    /// Print the resolved config, defaults included
    Show,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Check => check(path, json),
        ConfigSubcommand::Show => show(path, json),
    }
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn check(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    let mut warnings = config.validate();
    warnings.extend(super::missing_tools(&config));

    if json {
        let value = serde_json::json!({
            "path": path.display().to_string(),
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

    if !config.is_valid() {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(path: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(path)?;

    if json {
        print_json(&config)?;
    } else {
        let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
        print!("{yaml}");
    }

    Ok(())
}
