pub mod config;
pub mod exec;
pub mod keys;
pub mod run;
pub mod screenshot;

use anyhow::Context;
use deskhand_core::config::{CaptureConfig, Config, ConfigWarning, InputConfig, WarnLevel};
use deskhand_input::{ShellBackend, ShellCapture};
use std::path::Path;
use std::time::Duration;

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load_or_default(path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}

/// Warnings for configured external programs that cannot be found.
pub fn missing_tools(config: &Config) -> Vec<ConfigWarning> {
    let mut missing = Vec::new();

    if let InputConfig::Shell {
        hyprctl,
        ydotool,
        command_timeout_ms,
    } = &config.input
    {
        let backend = ShellBackend::new(
            hyprctl.clone(),
            ydotool.clone(),
            Duration::from_millis(*command_timeout_ms),
        );
        missing.extend(backend.missing_programs().into_iter().map(String::from));
    }

    if let CaptureConfig::Shell { grim, timeout_ms } = &config.capture {
        if !ShellCapture::new(grim.clone(), Duration::from_millis(*timeout_ms)).is_available() {
            missing.push(grim.clone());
        }
    }

    missing
        .into_iter()
        .map(|program| ConfigWarning {
            level: WarnLevel::Warning,
            message: format!("'{program}' was not found on PATH"),
        })
        .collect()
}
