use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use prehooks::cli::{self, Cli, Commands, PackageArgs, Paths};
use prehooks::hooks::add_hooks::AddHooksOptions;
use prehooks::hooks::ci::PullRequestOptions;
use prehooks::hooks::pyproject::PyprojectOptions;
use prehooks::hooks::{
    HookContext, BUMPVERSION_TOML, ENVRC, GITIGNORE, PRE_COMMIT_CONFIG_YAML, PYPROJECT_TOML,
    PYRIGHTCONFIG_JSON, PYTEST_TOML, RUFF_TOML,
};
use prehooks::runner::{resolve_targets, run_all};
use prehooks::{catalog, config, error, git, hooks, logging, throttle};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    let passed = match run(cli) {
        Ok(passed) => passed,
        Err(e) => {
            tracing::error!("{e:#}");
            false
        }
    };
    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run(cli: Cli) -> Result<bool> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let root = git::git_root(&cwd);
    let settings = config::resolve_settings(&cwd, root.as_deref(), cli.settings.overrides())?;
    tracing::debug!(?settings, "resolved settings");

    let ctx = HookContext {
        settings: &settings,
        clock: &throttle::SystemClock,
        cache_dir: throttle::default_cache_dir(),
        cwd,
        throttle: !cli.settings.no_throttle,
    };
    dispatch(cli.command, &ctx)
}

/// Run `job` on every file `paths` resolves to
fn each<F>(
    ctx: &HookContext,
    paths: &Paths,
    target: &str,
    also_ok: Option<&str>,
    job: F,
) -> error::Result<bool>
where
    F: Fn(&Path) -> error::Result<bool> + Sync,
{
    let targets = resolve_targets(&paths.paths, target, also_ok)?;
    Ok(run_all(&targets, ctx.settings.max_workers, job))
}

fn python_files(paths: &Paths) -> Vec<PathBuf> {
    paths
        .paths
        .iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "py"))
        .cloned()
        .collect()
}

fn dir_of(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn pyproject_options(
    ctx: &HookContext,
    package: &PackageArgs,
    uv: &cli::UvArgs,
) -> PyprojectOptions {
    PyprojectOptions {
        python_version: ctx.settings.python_version.clone(),
        description: package.description.clone(),
        package_name_external: package.python_package_name_external.clone(),
        package_name_internal: package.python_package_name_internal.clone(),
        indexes: uv.indexes.clone(),
    }
}

fn dispatch(command: Commands, ctx: &HookContext) -> Result<bool> {
    let python_version = ctx.settings.python_version.as_str();
    let passed = match command {
        Commands::AddFutureImportAnnotations(paths) => run_all(
            &python_files(&paths),
            ctx.settings.max_workers,
            hooks::python_source::add_future_import_annotations,
        ),
        Commands::AddHooks {
            paths,
            ci,
            direnv,
            docker,
            fish,
            lua,
            prettier,
            python,
            shell,
            toml,
            xml,
            package,
            uv,
        } => {
            let options = AddHooksOptions {
                ci,
                direnv,
                docker,
                fish,
                lua,
                prettier,
                python,
                shell,
                toml,
                xml,
                description: package.description,
                package_name_external: package.python_package_name_external,
                package_name_internal: package.python_package_name_internal,
                python_version: python_version.to_string(),
                uv: uv.options(),
            };
            let hooks_url = ctx.settings.hooks_url.as_str();
            each(ctx, &paths, PRE_COMMIT_CONFIG_YAML, None, |path| {
                hooks::add_hooks::run(path, &options, hooks_url)
            })?
        }
        Commands::CheckVersionBumped(paths) => {
            each(ctx, &paths, BUMPVERSION_TOML, Some(PYPROJECT_TOML), |path| {
                Ok(hooks::bump_my_version::check_version_bumped(path))
            })?
        }
        Commands::CheckVersionsConsistent(paths) => each(
            ctx,
            &paths,
            BUMPVERSION_TOML,
            Some(PYPROJECT_TOML),
            hooks::bump_my_version::check_versions_consistent,
        )?,
        Commands::FormatPreCommitConfig(paths) => {
            let hooks_url = ctx.settings.hooks_url.as_str();
            each(ctx, &paths, PRE_COMMIT_CONFIG_YAML, None, |path| {
                hooks::format_pre_commit_config::run(path, hooks_url)
            })?
        }
        Commands::FormatPytest(paths) => each(ctx, &paths, PYTEST_TOML, None, hooks::pytest::run)?,
        Commands::FormatRequirements(paths) => each(
            ctx,
            &paths,
            PYPROJECT_TOML,
            None,
            hooks::requirements::format_requirements,
        )?,
        Commands::Manifest { path } => catalog::write_manifest(&path)?,
        Commands::PinCliRequirements { paths, uv } => {
            let versions = hooks::uv::version_set(&ctx.cwd, &uv.options())?;
            each(ctx, &paths, PYPROJECT_TOML, None, |path| {
                hooks::requirements::pin_cli(path, &versions)
            })?
        }
        Commands::ReplaceSequenceStr(paths) => run_all(
            &python_files(&paths),
            ctx.settings.max_workers,
            hooks::python_source::replace_sequence_str,
        ),
        Commands::RunPrekAutoupdate(paths) => ctx.throttled("run-prek-autoupdate", || {
            each(ctx, &paths, PRE_COMMIT_CONFIG_YAML, None, hooks::prek::autoupdate)
        })?,
        Commands::RunUvLock { paths, uv } => {
            let options = uv.options();
            ctx.throttled("run-uv-lock", || {
                each(ctx, &paths, PYPROJECT_TOML, None, |path| {
                    hooks::uv::run_uv_lock(path, &options)
                })
            })?
        }
        Commands::RunVersionBump(paths) => each(
            ctx,
            &paths,
            BUMPVERSION_TOML,
            Some(PYPROJECT_TOML),
            hooks::bump_my_version::run_version_bump,
        )?,
        Commands::SetupBumpMyVersion {
            paths,
            python_package_name_internal,
        } => each(ctx, &paths, BUMPVERSION_TOML, None, |path| {
            hooks::bump_my_version::setup(path, python_package_name_internal.as_deref())
        })?,
        Commands::SetupCiPullRequest {
            paths,
            gitea,
            native_tls,
            repo_name,
            pytest_os,
            pytest_python_versions,
            pytest_runs_on,
        } => {
            let options = PullRequestOptions {
                gitea,
                native_tls,
                python_version: python_version.to_string(),
                repo_name: repo_name.or_else(|| {
                    git::git_root(&ctx.cwd)
                        .and_then(|root| root.file_name().map(|n| n.to_string_lossy().into_owned()))
                }),
                pytest_os,
                pytest_python_versions,
                pytest_runs_on,
            };
            let target = hooks::ci::pull_request_target(gitea);
            each(ctx, &paths, target, None, |path| {
                hooks::ci::setup_pull_request(path, &options)
            })?
        }
        Commands::SetupCiPush {
            paths,
            gitea,
            native_tls,
        } => each(ctx, &paths, hooks::ci::push_target(gitea), None, |path| {
            hooks::ci::setup_push(path, gitea, native_tls)
        })?,
        Commands::SetupDirenv { paths, python, uv } => {
            let options = uv.options();
            let python = python.then_some((python_version, &options));
            each(ctx, &paths, ENVRC, None, |path| hooks::direnv::run(path, python))?
        }
        Commands::SetupGit(paths) => each(ctx, &paths, GITIGNORE, None, |path| {
            hooks::git::setup(dir_of(path))
        })?,
        Commands::SetupPyproject { paths, package, uv } => {
            let options = pyproject_options(ctx, &package, &uv);
            each(ctx, &paths, PYPROJECT_TOML, None, |path| {
                hooks::pyproject::run(path, &options)
            })?
        }
        Commands::SetupPyright(paths) => each(ctx, &paths, PYRIGHTCONFIG_JSON, None, |path| {
            hooks::pyright::run(path, python_version)
        })?,
        Commands::SetupRuff(paths) => each(ctx, &paths, RUFF_TOML, None, |path| {
            hooks::ruff::run(path, python_version)
        })?,
        Commands::UpdateCiExtensions(paths) => {
            let targets = if paths.paths.is_empty() {
                hooks::ci::find_yml_workflows(&ctx.cwd)?
            } else {
                paths.paths
            };
            run_all(
                &targets,
                ctx.settings.max_workers,
                hooks::ci::update_extension,
            )
        }
        Commands::UpdateRequirements { paths, uv } => {
            let options = uv.options();
            ctx.throttled("update-requirements", || {
                let versions = hooks::uv::version_set(&ctx.cwd, &options)?;
                each(ctx, &paths, PYPROJECT_TOML, None, |path| {
                    hooks::requirements::update_requirements(path, &versions)
                })
            })?
        }
    };
    Ok(passed)
}
