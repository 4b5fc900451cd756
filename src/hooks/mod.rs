//! The hooks. Each `run` returns `Ok(true)` when nothing needed changing.

pub mod add_hooks;
pub mod bump_my_version;
pub mod ci;
pub mod direnv;
pub mod format_pre_commit_config;
pub mod git;
pub mod prek;
pub mod pyproject;
pub mod pyright;
pub mod pytest;
pub mod python_source;
pub mod requirements;
pub mod ruff;
pub mod uv;

use crate::config::Settings;
use crate::error::Result;
use crate::throttle::{throttled, Clock, Throttle};
use chrono::Duration;
use std::path::PathBuf;

pub const BUMPVERSION_TOML: &str = ".bumpversion.toml";
pub const ENVRC: &str = ".envrc";
pub const GITATTRIBUTES: &str = ".gitattributes";
pub const GITIGNORE: &str = ".gitignore";
pub const PRE_COMMIT_CONFIG_YAML: &str = crate::runner::PRE_COMMIT_CONFIG_YAML;
pub const PYPROJECT_TOML: &str = "pyproject.toml";
pub const PYRIGHTCONFIG_JSON: &str = "pyrightconfig.json";
pub const PYTEST_TOML: &str = "pytest.toml";
pub const RUFF_TOML: &str = "ruff.toml";
pub const UV_LOCK: &str = "uv.lock";

/// State shared by every hook invocation
pub struct HookContext<'a> {
    pub settings: &'a Settings,
    pub clock: &'a dyn Clock,
    pub cache_dir: PathBuf,
    pub cwd: PathBuf,
    /// False when throttling is disabled for this run
    pub throttle: bool,
}

impl HookContext<'_> {
    /// Throttle for `hook` in the current directory, if enabled
    pub fn throttle_for(&self, hook: &str) -> Option<Throttle> {
        if !self.throttle || self.settings.throttle_minutes == 0 {
            return None;
        }
        Some(Throttle::new(
            &self.cache_dir,
            hook,
            &self.cwd,
            Duration::minutes(i64::from(self.settings.throttle_minutes)),
        ))
    }

    /// Run `f` unless `hook` already ran here within the throttle window
    pub fn throttled(&self, hook: &str, f: impl FnOnce() -> Result<bool>) -> Result<bool> {
        throttled(self.throttle_for(hook).as_ref(), self.clock, f)
    }
}
