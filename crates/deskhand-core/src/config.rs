use crate::error::{DeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "deskhand.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// InputConfig
// ---------------------------------------------------------------------------

/// Which input backend drives the host, chosen once at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputConfig {
    #[default]
    /// In-process virtual input through the platform library.
    Native,
    /// One external process per call: `hyprctl` for the pointer,
    /// `ydotool` for buttons, keys and text.
    Shell {
        #[serde(default = "default_hyprctl")]
        hyprctl: String,
        #[serde(default = "default_ydotool")]
        ydotool: String,
        #[serde(default = "default_command_timeout_ms")]
        command_timeout_ms: u64,
    },
}

fn default_hyprctl() -> String {
    "hyprctl".to_string()
}

fn default_ydotool() -> String {
    "ydotool".to_string()
}

fn default_command_timeout_ms() -> u64 {
    5_000
}

impl InputConfig {
    /// Shell backend with default program names.
    pub fn shell() -> Self {
        InputConfig::Shell {
            hyprctl: default_hyprctl(),
            ydotool: default_ydotool(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InputConfig::Native => "native",
            InputConfig::Shell { .. } => "shell",
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptureConfig {
    #[default]
    /// Capture the primary monitor in-process.
    Native,
    /// Run `grim` into a scratch file.
    Shell {
        #[serde(default = "default_grim")]
        grim: String,
        #[serde(default = "default_command_timeout_ms")]
        timeout_ms: u64,
    },
}

fn default_grim() -> String {
    "grim".to_string()
}

impl CaptureConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureConfig::Native => "native",
            CaptureConfig::Shell { .. } => "shell",
        }
    }
}

// ---------------------------------------------------------------------------
// ReconnectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    5_000
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Coordinator URL. `http(s)://` and `ws(s)://` are both accepted.
    #[serde(default, alias = "wssServer")]
    pub server_url: String,
    /// Identity announced with `identify` after each connect.
    #[serde(default, alias = "userId")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Config {
    /// Load a YAML (or JSON) config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DeskError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data)?;
        Ok(cfg)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(DeskError::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let url = self.server_url.trim();
        if url.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "server_url is not set".to_string(),
            });
        } else if !["ws://", "wss://", "http://", "https://"]
            .iter()
            .any(|scheme| url.starts_with(scheme))
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "server_url '{url}' must start with ws://, wss://, http:// or https://"
                ),
            });
        }

        if self.agent_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "agent_id is empty; identify will not be sent".to_string(),
            });
        }

        if let InputConfig::Shell {
            hyprctl,
            ydotool,
            command_timeout_ms,
        } = &self.input
        {
            if *command_timeout_ms == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "input.command_timeout_ms must be greater than 0".to_string(),
                });
            }
            for (field, value) in [("hyprctl", hyprctl), ("ydotool", ydotool)] {
                if value.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Error,
                        message: format!("input.{field} must not be empty"),
                    });
                }
            }
        }

        if let CaptureConfig::Shell { grim, timeout_ms } = &self.capture {
            if *timeout_ms == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "capture.timeout_ms must be greater than 0".to_string(),
                });
            }
            if grim.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "capture.grim must not be empty".to_string(),
                });
            }
        }

        if self.reconnect.initial_delay_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "reconnect.initial_delay_ms is 0; reconnects will spin".to_string(),
            });
        }
        if self.reconnect.max_delay_ms < self.reconnect.initial_delay_ms {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "reconnect.max_delay_ms ({}) is below initial_delay_ms ({}); using initial_delay_ms",
                    self.reconnect.max_delay_ms, self.reconnect.initial_delay_ms
                ),
            });
        }

        warnings
    }

    /// `true` when [`validate`](Self::validate) reports no errors.
    pub fn is_valid(&self) -> bool {
        !self
            .validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn minimal_yaml_uses_defaults() {
        let cfg = Config::parse("server_url: wss://coord.example.com\n").unwrap();
        assert_eq!(cfg.server_url, "wss://coord.example.com");
        assert_eq!(cfg.agent_id, None);
        assert_eq!(cfg.input, InputConfig::Native);
        assert_eq!(cfg.capture, CaptureConfig::Native);
        assert_eq!(cfg.reconnect, ReconnectConfig::default());
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn legacy_json_config_loads() {
        let cfg = Config::parse(r#"{"wssServer": "https://coord.example.com"}"#).unwrap();
        assert_eq!(cfg.server_url, "https://coord.example.com");
        assert!(cfg.is_valid());
    }

    #[test]
    fn shell_backend_fields_default() {
        let yaml = "server_url: ws://localhost:3000\ninput:\n  type: shell\n  ydotool: /usr/local/bin/ydotool\n";
        let cfg = Config::parse(yaml).unwrap();
        let InputConfig::Shell {
            hyprctl,
            ydotool,
            command_timeout_ms,
        } = cfg.input
        else {
            panic!("expected shell input")
        };
        assert_eq!(hyprctl, "hyprctl");
        assert_eq!(ydotool, "/usr/local/bin/ydotool");
        assert_eq!(command_timeout_ms, 5_000);
    }

    #[test]
    fn shell_capture_parses() {
        let yaml = "server_url: ws://x\ncapture:\n  type: shell\n";
        let cfg = Config::parse(yaml).unwrap();
        assert_eq!(cfg.capture.kind(), "shell");
    }

    #[test]
    fn unknown_backend_type_is_an_error() {
        assert!(Config::parse("input:\n  type: xdotool\n").is_err());
    }

    #[test]
    fn missing_server_url_is_error() {
        let cfg = Config::default();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("server_url")));
        assert!(!cfg.is_valid());
    }

    #[test]
    fn bad_scheme_is_error() {
        let cfg = Config::parse("server_url: ftp://coord\n").unwrap();
        assert!(!cfg.is_valid());
    }

    #[test]
    fn zero_timeout_is_error() {
        let mut cfg = Config::parse("server_url: ws://coord\n").unwrap();
        cfg.input = InputConfig::Shell {
            hyprctl: "hyprctl".into(),
            ydotool: "ydotool".into(),
            command_timeout_ms: 0,
        };
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.message.contains("command_timeout_ms")));
    }

    #[test]
    fn inverted_reconnect_delays_warn() {
        let yaml = "server_url: ws://coord\nreconnect:\n  initial_delay_ms: 3000\n  max_delay_ms: 100\n";
        let cfg = Config::parse(yaml).unwrap();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Warning);
        assert!(cfg.is_valid());
    }

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deskhand.yaml");
        assert!(matches!(
            Config::load(&path),
            Err(DeskError::ConfigNotFound(_))
        ));
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deskhand.yaml");
        std::fs::write(&path, "server_url: wss://a.b\nagent_id: desk-7\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.agent_id.as_deref(), Some("desk-7"));
    }
}
