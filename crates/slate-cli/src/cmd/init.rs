//! `slate init` — initialize a slate project.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use std::path::Path;

use crate::output::{OutputMode, render_json};
use crate::store::TaskStore;

const STARTER_CONFIG: &str = "\
# slate project configuration
#
# [github]
# repo = \"owner/name\"
# token = \"<personal access token>\"   # prefer SLATE_GITHUB_TOKEN instead
#
# [sync]
# direction = \"push\"   # push | pull | both
# pace_ms = 500
";

#[derive(Args, Debug)]
pub struct InitArgs {}

pub fn run_init(_args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let created = TaskStore::init(project_root)?;

    let config_path = project_root.join(".slate/config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, STARTER_CONFIG)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
    }

    if output.is_json() {
        render_json(&json!({
            "status": "ok",
            "created": created,
        }))?;
    } else if created {
        println!("Initialized slate project in .slate/");
    } else {
        println!("slate project already initialized");
    }

    Ok(())
}
