use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::models::{host_platform, GithubConfig, DEFAULT_API_BASE_URL, DEFAULT_PER_PAGE};

const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_ORGANIZATION: &str = "PhysiBoSS-Models";

pub const ENV_ORGANIZATION: &str = "PHYSIBOSS_MODELS_ORG";
pub const ENV_PLATFORM: &str = "PHYSIBOSS_PLATFORM";
pub const ENV_MODELS_DIR: &str = "PHYSIBOSS_MODELS_DIR";
pub const ENV_TOKEN: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub organization: String,
    pub api_base_url: String,
    pub per_page: u32,
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub models_dir: Option<PathBuf>,
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            organization: DEFAULT_ORGANIZATION.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            per_page: DEFAULT_PER_PAGE,
            user_agent: None,
            platform: None,
            models_dir: None,
            token: None,
        }
    }
}

impl Settings {
    /// Reads `path` (or the per-user config file) and applies environment
    /// overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => resolve_config_path()?,
        };
        let mut settings = load_settings(&path)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(organization) = lookup(ENV_ORGANIZATION) {
            self.organization = organization;
        }
        if let Some(platform) = lookup(ENV_PLATFORM) {
            self.platform = Some(platform);
        }
        if let Some(dir) = lookup(ENV_MODELS_DIR) {
            self.models_dir = Some(PathBuf::from(dir));
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = Some(token);
        }
    }

    #[must_use]
    pub fn platform(&self) -> String {
        self.platform.clone().unwrap_or_else(host_platform)
    }

    #[must_use]
    pub fn github_config(&self) -> GithubConfig {
        let defaults = GithubConfig::default();
        GithubConfig {
            api_base_url: self.api_base_url.clone(),
            per_page: self.per_page.max(1),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            token: self.token.clone(),
        }
    }
}

fn resolve_config_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("org", "PhysiBoSS", "physiboss-models")
        .context("missing project directories")?;
    Ok(project_dirs.config_dir().join(CONFIG_FILE))
}

fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let bytes = fs::read(path).with_context(|| format!("failed reading {path:?}"))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("config json {path:?} could not be parsed"))
}
