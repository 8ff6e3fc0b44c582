use std::path::Path;

use anyhow::Context;
use deskhand_input::build_capture;

use crate::output::print_json;

pub fn run(config_path: &Path, out: &Path, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let capture = build_capture(&config.capture);

    let rt = tokio::runtime::Runtime::new()?;
    let shot = rt
        .block_on(capture.capture())
        .with_context(|| format!("{} capture failed", capture.name()))?;

    std::fs::write(out, &shot.png).with_context(|| format!("failed to write {}", out.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": out.display().to_string(),
            "width": shot.width,
            "height": shot.height,
            "bytes": shot.png.len(),
            "captured_at": shot.captured_at.to_rfc3339(),
        }))?;
    } else {
        println!(
            "Wrote {}x{} screenshot to {}",
            shot.width,
            shot.height,
            out.display()
        );
    }
    Ok(())
}
