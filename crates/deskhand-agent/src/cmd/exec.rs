use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use clap::ValueEnum;
use deskhand_core::config::InputConfig;
use deskhand_core::protocol::ExecuteActions;
use deskhand_core::ActionBatch;
use deskhand_input::{build_backend, Interpreter};
use serde_json::Value;
use tracing::debug;

use crate::output::print_json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Native,
    Shell,
}

pub fn run(
    config_path: &Path,
    file: &Path,
    backend: Option<BackendKind>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    match backend {
        Some(BackendKind::Native) => config.input = InputConfig::Native,
        Some(BackendKind::Shell) if config.input == InputConfig::Native => {
            config.input = InputConfig::shell()
        }
        _ => {}
    }

    let (user_id, actions) = parse_batch(&read_input(file)?)?;
    let interpreter = Interpreter::new(build_backend(&config.input));
    let backend_name = interpreter.backend_name();
    let count = actions.len();

    debug!(user = %user_id, actions = count, backend = backend_name, "executing batch");

    // The failure is reported once, by the caller.
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt
        .block_on(interpreter.execute(&actions))
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if json {
        print_json(&serde_json::json!({
            "backend": backend_name,
            "executed": report.executed,
            "elapsed_ms": report.elapsed.as_millis() as u64,
        }))?;
    } else {
        println!(
            "Executed {count} action(s) in {}ms ({backend_name} backend).",
            report.elapsed.as_millis()
        );
    }
    Ok(())
}

fn read_input(file: &Path) -> anyhow::Result<String> {
    if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read batch from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

/// Accept either a bare action array or a full `execute_actions` payload.
/// Any action that fails to decode rejects the whole batch.
fn parse_batch(input: &str) -> anyhow::Result<(String, ActionBatch)> {
    let value: Value = serde_json::from_str(input).context("batch is not valid JSON")?;
    match value {
        Value::Array(_) => {
            let actions: ActionBatch =
                serde_json::from_value(value).context("invalid action batch")?;
            Ok(("local".to_string(), actions))
        }
        Value::Object(_) => {
            let request: ExecuteActions =
                serde_json::from_value(value).context("invalid execute_actions payload")?;
            let user_id = if request.user_id.is_empty() {
                "local".to_string()
            } else {
                request.user_id
            };
            Ok((user_id, request.actions))
        }
        _ => bail!("batch must be a JSON array of actions or an object with an 'actions' array"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskhand_core::Action;

    #[test]
    fn bare_array() {
        let (user, actions) = parse_batch(r#"[{"type": "wait", "ms": 5}]"#).unwrap();
        assert_eq!(user, "local");
        assert_eq!(actions, vec![Action::Wait { ms: 5 }]);
    }

    #[test]
    fn execute_actions_payload() {
        let (user, actions) =
            parse_batch(r#"{"userId": "u-4", "actions": [{"type": "key", "key": "enter"}]}"#)
                .unwrap();
        assert_eq!(user, "u-4");
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn one_bad_action_rejects_all() {
        let err = parse_batch(r#"[{"type": "wait", "ms": 5}, {"type": "jump"}]"#).unwrap_err();
        assert!(format!("{err:#}").contains("invalid action batch"));
    }

    #[test]
    fn scalar_is_rejected() {
        assert!(parse_batch("42").is_err());
        assert!(parse_batch("not json").is_err());
    }
}
