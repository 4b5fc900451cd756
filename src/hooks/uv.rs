use super::requirements::pin_cli;
use super::UV_LOCK;
use crate::document::read_optional;
use crate::error::{Error, Result};
use crate::process::Tool;
use crate::version::VersionSet;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A package index given as `name=url`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub url: String,
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.url)
    }
}

impl FromStr for Index {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => Ok(Self {
                name: name.trim().to_string(),
                url: url.trim().to_string(),
            }),
            _ => Err(Error::Validation {
                field: "index".into(),
                expected: "name=url".into(),
                actual: s.to_string(),
            }),
        }
    }
}

/// How `uv` reaches package indexes
#[derive(Debug, Clone, Default)]
pub struct UvOptions {
    pub indexes: Vec<Index>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub native_tls: bool,
}

impl UvOptions {
    /// Arguments that forward these options to another of our hooks
    pub fn hook_args(&self) -> Vec<String> {
        let mut args = self.index_hook_args();
        if self.native_tls {
            args.push("--native-tls".to_string());
        }
        args
    }

    pub fn index_hook_args(&self) -> Vec<String> {
        self.indexes.iter().map(|i| format!("--index={i}")).collect()
    }

    /// `uv` command-line arguments
    pub fn uv_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for index in &self.indexes {
            args.push("--index".to_string());
            args.push(index.to_string());
        }
        if self.native_tls {
            args.push("--native-tls".to_string());
        }
        args
    }

    /// Credential variables `uv` reads for each named index
    pub fn credential_env(&self) -> Vec<(String, String)> {
        let mut env = Vec::new();
        for index in &self.indexes {
            let prefix = format!("UV_INDEX_{}", env_name(&index.name));
            if let Some(username) = &self.username {
                env.push((format!("{prefix}_USERNAME"), username.clone()));
            }
            if let Some(password) = &self.password {
                env.push((format!("{prefix}_PASSWORD"), password.clone()));
            }
        }
        env
    }

    fn uv(&self, dir: &Path) -> Tool {
        let mut tool = Tool::new("uv").current_dir(dir);
        for (key, value) in self.credential_env() {
            tool = tool.env(key, value);
        }
        tool
    }
}

fn env_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

#[derive(Debug, Deserialize)]
struct PipPackage {
    name: String,
    version: String,
    #[serde(default)]
    latest_version: Option<String>,
}

/// Latest versions from `uv pip list --format json` output; an outdated
/// listing's `latest_version` wins over `version`
pub fn parse_pip_list(json: &str) -> Result<VersionSet> {
    let packages: Vec<PipPackage> = serde_json::from_str(json).map_err(|e| Error::Tool {
        program: "uv".into(),
        message: format!("unexpected pip list output: {e}"),
    })?;
    let mut versions = VersionSet::new();
    for package in packages {
        let version = package.latest_version.as_deref().unwrap_or(&package.version);
        versions.insert(&package.name, version);
    }
    Ok(versions)
}

/// Installed and outdated package versions of the environment in `dir`
pub fn version_set(dir: &Path, options: &UvOptions) -> Result<VersionSet> {
    let installed = options
        .uv(dir)
        .args(["pip", "list", "--format", "json"])
        .args(options.uv_args())
        .run()?;
    let outdated = options
        .uv(dir)
        .args(["pip", "list", "--format", "json", "--outdated"])
        .args(options.uv_args())
        .run()?;
    let mut versions = parse_pip_list(&installed)?;
    versions.extend(parse_pip_list(&outdated)?);
    tracing::debug!(packages = versions.len(), "collected versions");
    Ok(versions)
}

const RESOLVE_ARGS: [&str; 6] = [
    "--upgrade",
    "--resolution",
    "highest",
    "--prerelease",
    "disallow",
    "--managed-python",
];

/// `uv lock` then `uv sync` in `dir`
pub fn lock_and_sync(dir: &Path, options: &UvOptions) -> Result<()> {
    options
        .uv(dir)
        .arg("lock")
        .args(RESOLVE_ARGS)
        .args(options.uv_args())
        .run()?;
    options
        .uv(dir)
        .args(["sync", "--all-extras", "--all-groups"])
        .args(RESOLVE_ARGS)
        .args(options.uv_args())
        .run()?;
    Ok(())
}

/// Re-pin the `cli` extra, then lock and sync. Passes when neither
/// `pyproject.toml` nor `uv.lock` changed.
pub fn run_uv_lock(path: &Path, options: &UvOptions) -> Result<bool> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let lock = dir.join(UV_LOCK);
    let before = (read_optional(path)?, read_optional(&lock)?);
    let versions = version_set(dir, options)?;
    pin_cli(path, &versions)?;
    lock_and_sync(dir, options)?;
    let after = (read_optional(path)?, read_optional(&lock)?);
    Ok(before == after)
}
