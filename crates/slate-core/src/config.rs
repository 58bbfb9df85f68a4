use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::sync::Direction;

/// Project-level configuration, read from `.slate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Default repository in `<owner>/<repo>` form.
    #[serde(default)]
    pub repo: Option<String>,
    /// Token used when no environment variable supplies one.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            pace_ms: default_pace_ms(),
        }
    }
}

const fn default_pace_ms() -> u64 {
    500
}

/// User-level configuration under the platform config directory
/// (`~/.config/slate/config.toml` on Linux).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub github: GithubConfig,
}

/// Load the project config, falling back to defaults when the file is
/// missing.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".slate/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load the user config, falling back to defaults when the file is missing.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("slate/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the GitHub token through the fixed precedence chain:
/// environment, then config files (project before user), then the
/// caller-supplied flag.
#[must_use]
pub fn resolve_token(
    project: &ProjectConfig,
    user: &UserConfig,
    flag_token: Option<&str>,
) -> Option<String> {
    let env_token = env::var("SLATE_GITHUB_TOKEN")
        .or_else(|_| env::var("GITHUB_TOKEN"))
        .ok()
        .filter(|token| !token.trim().is_empty());

    resolve_token_inner(
        env_token,
        project
            .github
            .token
            .clone()
            .or_else(|| user.github.token.clone()),
        flag_token.map(ToOwned::to_owned),
    )
}

fn resolve_token_inner(
    env_token: Option<String>,
    config_token: Option<String>,
    flag_token: Option<String>,
) -> Option<String> {
    env_token.or(config_token).or(flag_token)
}
