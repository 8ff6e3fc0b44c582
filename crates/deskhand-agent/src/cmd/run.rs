use std::path::Path;

use anyhow::Context;
use deskhand_core::config::WarnLevel;
use deskhand_core::DeskError;
use tracing::{error, info, warn};

use crate::channel;
use crate::context::AgentContext;

pub fn run(
    config_path: &Path,
    server: Option<String>,
    agent_id: Option<String>,
) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(server) = server {
        config.server_url = server;
    }
    if let Some(agent_id) = agent_id {
        config.agent_id = Some(agent_id);
    }

    let mut warnings = config.validate();
    warnings.extend(super::missing_tools(&config));
    for w in &warnings {
        match w.level {
            WarnLevel::Warning => warn!("{}", w.message),
            WarnLevel::Error => error!("{}", w.message),
        }
    }
    if let Some(first) = warnings.iter().find(|w| w.level == WarnLevel::Error) {
        return Err(DeskError::InvalidConfig(first.message.clone()).into());
    }

    // Picks ring for every TLS connection this process makes.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let ctx = AgentContext::from_config(config);
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        tokio::select! {
            res = channel::serve(ctx) => res,
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                info!("shutting down");
                Ok(())
            }
        }
    })
}
