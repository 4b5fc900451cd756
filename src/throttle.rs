use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub trait Clock: Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cooldown for an expensive hook, keyed by hook name and working directory
#[derive(Debug, Clone)]
pub struct Throttle {
    marker: PathBuf,
    duration: Duration,
}

impl Throttle {
    pub fn new(cache_dir: &Path, hook: &str, cwd: &Path, duration: Duration) -> Self {
        let digest = Sha256::digest(cwd.to_string_lossy().as_bytes());
        let key = hex::encode(digest);
        let marker = cache_dir
            .join("throttle")
            .join(format!("{hook}--{}", &key[..16]));
        Self { marker, duration }
    }

    pub fn marker(&self) -> &Path {
        &self.marker
    }

    /// Whether the cooldown has elapsed. A missing or unreadable marker
    /// counts as elapsed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let Ok(text) = fs::read_to_string(&self.marker) else {
            return true;
        };
        match DateTime::parse_from_rfc3339(text.trim()) {
            Ok(last) => now.signed_duration_since(last) >= self.duration,
            Err(e) => {
                tracing::debug!(marker = %self.marker.display(), error = %e, "ignoring bad throttle marker");
                true
            }
        }
    }

    pub fn record(&self, now: DateTime<Utc>) -> Result<()> {
        let write_err = |source| Error::Write {
            path: self.marker.clone(),
            source,
        };
        if let Some(parent) = self.marker.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.marker, now.to_rfc3339()).map_err(write_err)
    }

    /// Run `f` if due and record the run when it succeeds. A skipped run
    /// passes.
    pub fn run(&self, now: DateTime<Utc>, f: impl FnOnce() -> Result<bool>) -> Result<bool> {
        if !self.is_due(now) {
            tracing::info!(marker = %self.marker.display(), "throttled; skipping");
            return Ok(true);
        }
        let outcome = f()?;
        self.record(now)?;
        Ok(outcome)
    }
}

/// Run `f` through `throttle` when one is configured
pub fn throttled(
    throttle: Option<&Throttle>,
    clock: &dyn Clock,
    f: impl FnOnce() -> Result<bool>,
) -> Result<bool> {
    match throttle {
        Some(throttle) => throttle.run(clock.now(), f),
        None => f(),
    }
}

/// `$PREHOOKS_CACHE_DIR`, else `$XDG_CACHE_HOME/prehooks`, else the platform
/// cache directory
pub fn default_cache_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("PREHOOKS_CACHE_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(dir) = std::env::var_os("XDG_CACHE_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join("prehooks");
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("prehooks")
}
