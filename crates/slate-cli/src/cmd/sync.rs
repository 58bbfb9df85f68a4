//! `slate sync` — reconcile the backlog against GitHub Issues.

use anyhow::{Context as _, Result};
use clap::Args;
use std::path::Path;
use std::time::Duration;

use slate_core::config::{load_project_config, load_user_config, resolve_token};
use slate_core::github::RepoSlug;
use slate_core::sync::{Direction, EngineConfig, SyncEngine, SyncResult};

use crate::output::{OutputMode, render_json};
use crate::store::TaskStore;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Repository in <owner>/<repo> form. Falls back to `[github] repo` in
    /// .slate/config.toml.
    #[arg(long, value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// Sync direction: push, pull, or both.
    #[arg(long)]
    pub direction: Option<Direction>,

    /// GitHub token. Environment and config-file tokens take precedence.
    #[arg(long)]
    pub token: Option<String>,

    /// Milliseconds to wait between consecutive API-bound iterations.
    #[arg(long, value_name = "MS")]
    pub pace_ms: Option<u64>,
}

pub fn run_sync(args: &SyncArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut store = TaskStore::load(project_root)?;
    let config = load_project_config(project_root)?;
    let user_config = load_user_config().unwrap_or_default();

    let repo_raw = args
        .repo
        .clone()
        .or_else(|| config.github.repo.clone())
        .context("no repository configured; pass --repo or set [github] repo in .slate/config.toml")?;
    let repo = RepoSlug::parse(&repo_raw)?;

    let token = resolve_token(&config, &user_config, args.token.as_deref()).context(
        "no GitHub token found; set SLATE_GITHUB_TOKEN, [github] token, or pass --token",
    )?;

    let direction = args.direction.unwrap_or(config.sync.direction);
    let pace_ms = args.pace_ms.unwrap_or(config.sync.pace_ms);

    let mut engine_config = EngineConfig::new(repo.clone(), token);
    engine_config.pacing = Duration::from_millis(pace_ms);

    tracing::info!(repo = %repo.full_name(), %direction, "starting sync run");
    let engine = SyncEngine::new(engine_config);
    let result = engine.run(store.tasks(), direction);

    let applied = store.apply_sync(&result);
    store.save()?;
    tracing::debug!(
        updated_refs = applied.updated_refs,
        upserted = applied.upserted,
        flagged = applied.flagged_conflicts,
        "applied sync mutations"
    );

    if output.is_json() {
        render_json(&result)?;
    } else {
        print_report(&repo.full_name(), direction, &result);
    }

    if !result.success {
        anyhow::bail!("sync completed with {} error(s)", result.summary.errors);
    }
    Ok(())
}

fn print_report(repo: &str, direction: Direction, result: &SyncResult) {
    println!("slate sync {repo} ({direction})");
    println!("  pushed:     {}", result.summary.pushed);
    println!("  pulled:     {}", result.summary.pulled);
    println!("  unchanged:  {}", result.summary.unchanged);
    println!("  conflicts:  {}", result.summary.conflicts);
    println!("  errors:     {}", result.summary.errors);

    if !result.conflicts.is_empty() {
        println!();
        println!("Conflicts (resolve locally, then sync again):");
        for conflict in &result.conflicts {
            println!(
                "  • {} ⇄ #{} ({})",
                conflict.task_id, conflict.issue_number, conflict.conflict_type
            );
        }
    }

    if !result.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &result.errors {
            let subject = error
                .task_id
                .as_deref()
                .map(|id| format!(" {id}"))
                .unwrap_or_default();
            println!("  • {}{subject}: {}", error.operation, error.message);
        }
    }
}
