use crate::catalog::MANIFEST_YAML;
use crate::config::SettingsFile;
use crate::hooks::uv::{Index, UvOptions};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pre-commit hooks that keep Python repositories configured consistently
#[derive(Parser)]
#[command(name = "prehooks")]
#[command(version)]
#[command(about = "Pre-commit hooks for Python repositories")]
pub struct Cli {
    /// Enable verbose output (shows DEBUG level logs)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write debug logs to a file
    #[arg(long, global = true, env = "PREHOOKS_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that override prehooks.yaml
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Python version, e.g. 3.12
    #[arg(long, global = true, value_name = "VERSION")]
    pub python_version: Option<String>,

    /// Upper bound on concurrent jobs
    #[arg(long, global = true, env = "PREHOOKS_MAX_WORKERS", value_name = "N")]
    pub max_workers: Option<usize>,

    /// Repository URL of these hooks in .pre-commit-config.yaml
    #[arg(long, global = true, value_name = "URL")]
    pub hooks_url: Option<String>,

    /// Minutes between runs of slow hooks; 0 disables throttling
    #[arg(long, global = true, value_name = "MINUTES")]
    pub throttle_minutes: Option<u32>,

    /// Run slow hooks even if they ran recently
    #[arg(long, global = true, env = "PREHOOKS_NO_THROTTLE")]
    pub no_throttle: bool,
}

impl SettingsArgs {
    pub fn overrides(&self) -> SettingsFile {
        SettingsFile {
            python_version: self.python_version.clone(),
            throttle_minutes: self.throttle_minutes,
            max_workers: self.max_workers,
            hooks_url: self.hooks_url.clone(),
        }
    }
}

/// Package index access for uv
#[derive(Args, Debug, Clone, Default)]
pub struct UvArgs {
    /// Extra package index, as NAME=URL (repeatable)
    #[arg(long = "index", value_name = "NAME=URL")]
    pub indexes: Vec<Index>,

    /// Username for the extra indexes
    #[arg(long, env = "PREHOOKS_INDEX_USERNAME")]
    pub index_username: Option<String>,

    /// Password for the extra indexes
    #[arg(long, env = "PREHOOKS_INDEX_PASSWORD", hide_env_values = true)]
    pub index_password: Option<String>,

    /// Use the system's native TLS certificates
    #[arg(long)]
    pub native_tls: bool,
}

impl UvArgs {
    pub fn options(&self) -> UvOptions {
        UvOptions {
            indexes: self.indexes.clone(),
            username: self.index_username.clone(),
            password: self.index_password.clone(),
            native_tls: self.native_tls,
        }
    }
}

/// Files passed by pre-commit
#[derive(Args, Debug, Clone, Default)]
pub struct Paths {
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PackageArgs {
    /// Project description
    #[arg(long)]
    pub description: Option<String>,

    /// Distribution name on the package index
    #[arg(long)]
    pub python_package_name_external: Option<String>,

    /// Import name of the package
    #[arg(long)]
    pub python_package_name_internal: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add 'from __future__ import annotations' to Python files
    AddFutureImportAnnotations(Paths),

    /// Add hooks to .pre-commit-config.yaml
    AddHooks {
        #[command(flatten)]
        paths: Paths,
        #[arg(long)]
        ci: bool,
        #[arg(long)]
        direnv: bool,
        #[arg(long)]
        docker: bool,
        #[arg(long)]
        fish: bool,
        #[arg(long)]
        lua: bool,
        #[arg(long)]
        prettier: bool,
        #[arg(long)]
        python: bool,
        #[arg(long)]
        shell: bool,
        #[arg(long)]
        toml: bool,
        #[arg(long)]
        xml: bool,
        #[command(flatten)]
        package: PackageArgs,
        #[command(flatten)]
        uv: UvArgs,
    },

    /// Check the version differs from origin/master
    CheckVersionBumped(Paths),

    /// Check pyproject.toml and .bumpversion.toml agree on the version
    CheckVersionsConsistent(Paths),

    /// Sort and format .pre-commit-config.yaml
    FormatPreCommitConfig(Paths),

    /// Sort the [pytest] table of pytest.toml
    FormatPytest(Paths),

    /// Format and sort requirements in pyproject.toml
    FormatRequirements(Paths),

    /// Write the pre-commit manifest for these hooks
    Manifest {
        #[arg(default_value = MANIFEST_YAML)]
        path: PathBuf,
    },

    /// Pin the 'cli' extra to the latest dependency versions
    PinCliRequirements {
        #[command(flatten)]
        paths: Paths,
        #[command(flatten)]
        uv: UvArgs,
    },

    /// Replace 'Sequence[str]' with 'list[str]'
    ReplaceSequenceStr(Paths),

    /// Run 'prek autoupdate'
    RunPrekAutoupdate(Paths),

    /// Run 'uv lock' and 'uv sync'
    RunUvLock {
        #[command(flatten)]
        paths: Paths,
        #[command(flatten)]
        uv: UvArgs,
    },

    /// Bump the patch version unless already bumped
    RunVersionBump(Paths),

    /// Set up .bumpversion.toml
    SetupBumpMyVersion {
        #[command(flatten)]
        paths: Paths,
        #[arg(long)]
        python_package_name_internal: Option<String>,
    },

    /// Set up the pull request workflow
    SetupCiPullRequest {
        #[command(flatten)]
        paths: Paths,
        /// Write to .gitea instead of .github
        #[arg(long)]
        gitea: bool,
        #[arg(long)]
        native_tls: bool,
        /// Spreads the scheduled run over the day
        #[arg(long)]
        repo_name: Option<String>,
        /// Operating systems for the pytest matrix (repeatable)
        #[arg(long = "ci-pytest-os", value_name = "OS")]
        pytest_os: Vec<String>,
        /// Python versions for the pytest matrix (repeatable)
        #[arg(long = "ci-pytest-python-version", value_name = "VERSION")]
        pytest_python_versions: Vec<String>,
        /// Runners for the pytest job (repeatable)
        #[arg(long = "ci-pytest-runs-on", value_name = "RUNNER")]
        pytest_runs_on: Vec<String>,
    },

    /// Set up the push workflow
    SetupCiPush {
        #[command(flatten)]
        paths: Paths,
        /// Write to .gitea instead of .github
        #[arg(long)]
        gitea: bool,
        #[arg(long)]
        native_tls: bool,
    },

    /// Set up .envrc
    SetupDirenv {
        #[command(flatten)]
        paths: Paths,
        /// Add the uv virtual environment block
        #[arg(long)]
        python: bool,
        #[command(flatten)]
        uv: UvArgs,
    },

    /// Set up .gitattributes and .gitignore
    SetupGit(Paths),

    /// Set up pyproject.toml
    SetupPyproject {
        #[command(flatten)]
        paths: Paths,
        #[command(flatten)]
        package: PackageArgs,
        #[command(flatten)]
        uv: UvArgs,
    },

    /// Set up pyrightconfig.json
    SetupPyright(Paths),

    /// Set up ruff.toml
    SetupRuff(Paths),

    /// Rename workflow files from '.yml' to '.yaml'
    UpdateCiExtensions(Paths),

    /// Raise requirement bounds to the latest versions
    UpdateRequirements {
        #[command(flatten)]
        paths: Paths,
        #[command(flatten)]
        uv: UvArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::HOOKS;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_every_hook_has_a_subcommand() {
        let command = Cli::command();
        for hook in HOOKS.iter() {
            assert!(
                command.find_subcommand(hook.id).is_some(),
                "no subcommand for {}",
                hook.id
            );
        }
    }

    #[test]
    fn test_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "prehooks",
            "setup-pyproject",
            "--python-version=3.13",
            "--index=main=https://pypi.example.com/simple",
            "--python-package-name-internal=my_pkg",
            "pyproject.toml",
        ])
        .unwrap();
        assert_eq!(cli.settings.python_version.as_deref(), Some("3.13"));
        match cli.command {
            Commands::SetupPyproject { paths, package, uv } => {
                assert_eq!(paths.paths, vec![PathBuf::from("pyproject.toml")]);
                assert_eq!(package.python_package_name_internal.as_deref(), Some("my_pkg"));
                assert_eq!(uv.indexes[0].name, "main");
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_add_hooks_groups() {
        let cli = Cli::try_parse_from(["prehooks", "add-hooks", "--fish", "--xml"]).unwrap();
        match cli.command {
            Commands::AddHooks { fish, lua, xml, .. } => {
                assert!(fish && xml);
                assert!(!lua);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_bad_index_rejected() {
        assert!(Cli::try_parse_from(["prehooks", "run-uv-lock", "--index=nope"]).is_err());
    }
}
