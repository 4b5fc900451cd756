use crate::version::Version2;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILENAME: &str = "prehooks.yaml";

pub const DEFAULT_PYTHON_VERSION: &str = "3.12";
pub const MAX_PYTHON_VERSION: &str = "3.14";
pub const DEFAULT_HOOKS_URL: &str = "https://github.com/dycw/pre-commit-hooks";
pub const DEFAULT_THROTTLE_MINUTES: u32 = 720;

/// Settings as written in prehooks.yaml; every field optional
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub python_version: Option<String>,
    pub throttle_minutes: Option<u32>,
    pub max_workers: Option<usize>,
    pub hooks_url: Option<String>,
}

/// Resolved settings: built-in defaults, then the settings file, then flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub python_version: String,
    pub throttle_minutes: u32,
    pub max_workers: Option<usize>,
    pub hooks_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            python_version: DEFAULT_PYTHON_VERSION.to_string(),
            throttle_minutes: DEFAULT_THROTTLE_MINUTES,
            max_workers: None,
            hooks_url: DEFAULT_HOOKS_URL.to_string(),
        }
    }
}

impl Settings {
    /// Overlay every value present in `layer`
    pub fn merge(mut self, layer: SettingsFile) -> Self {
        if let Some(v) = layer.python_version {
            self.python_version = v;
        }
        if let Some(v) = layer.throttle_minutes {
            self.throttle_minutes = v;
        }
        if layer.max_workers.is_some() {
            self.max_workers = layer.max_workers;
        }
        if let Some(v) = layer.hooks_url {
            self.hooks_url = v;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.python_version.parse::<Version2>().is_err() {
            bail!(
                "python_version must look like '3.12'; got '{}'",
                self.python_version
            );
        }
        if self.max_workers == Some(0) {
            bail!("max_workers must be at least 1");
        }
        if self.hooks_url.trim().is_empty() {
            bail!("hooks_url must not be empty");
        }
        Ok(())
    }
}

/// Parsed settings file with its location
#[derive(Debug)]
pub struct LoadedSettings {
    pub file: SettingsFile,
    /// Directory containing the settings file
    pub settings_dir: PathBuf,
}

/// Loads and parses a prehooks.yaml settings file.
pub fn load_settings_file(path: &Path) -> Result<SettingsFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings: {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(SettingsFile::default());
    }

    let parsed: SettingsFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse settings: {}", path.display()))?;

    Settings::default()
        .merge(parsed.clone())
        .validate()
        .with_context(|| format!("Invalid settings at {}", path.display()))?;

    Ok(parsed)
}

/// Finds the nearest prehooks.yaml by walking up from a directory.
/// Stops at the repository root (does not leave the repo).
pub fn find_nearest_settings(start_dir: &Path, repo_root: &Path) -> Result<Option<LoadedSettings>> {
    let mut current = start_dir.to_path_buf();

    loop {
        let path = current.join(SETTINGS_FILENAME);

        if path.exists() {
            let file = load_settings_file(&path)?;
            return Ok(Some(LoadedSettings {
                file,
                settings_dir: current,
            }));
        }

        if current == repo_root {
            return Ok(None);
        }

        if !current.pop() {
            return Ok(None);
        }

        if !current.starts_with(repo_root) {
            return Ok(None);
        }
    }
}

/// Resolve settings for `cwd`: defaults, then the nearest settings file up
/// to `repo_root` (or just `cwd` outside a repository), then `overrides`.
pub fn resolve_settings(
    cwd: &Path,
    repo_root: Option<&Path>,
    overrides: SettingsFile,
) -> Result<Settings> {
    let root = repo_root.unwrap_or(cwd);
    let mut settings = Settings::default();
    if let Some(loaded) = find_nearest_settings(cwd, root)? {
        tracing::debug!(dir = %loaded.settings_dir.display(), "using settings file");
        settings = settings.merge(loaded.file);
    }
    let settings = settings.merge(overrides);
    settings.validate()?;
    Ok(settings)
}
