use crate::config::MAX_PYTHON_VERSION;
use crate::document::ensure_contains;
use crate::document::yaml::{
    edit_yaml_mapping, ensure_contains_partial_mapping, get_set_mapping, get_set_seq_mappings,
    get_set_seq_strs, mapping,
};
use crate::document::Modifications;
use crate::error::{Error, Result};
use crate::version::Version2;
use serde_yaml::{Mapping, Sequence, Value};
use blake2::digest::consts::U8;
use blake2::{Blake2b, Digest};
use std::fs;
use std::path::{Path, PathBuf};

pub const GITHUB_PUSH_YAML: &str = ".github/workflows/push.yaml";
pub const GITEA_PUSH_YAML: &str = ".gitea/workflows/push.yaml";
pub const GITHUB_PULL_REQUEST_YAML: &str = ".github/workflows/pull-request.yaml";
pub const GITEA_PULL_REQUEST_YAML: &str = ".gitea/workflows/pull-request.yaml";

const WORKFLOW_DIRS: [&str; 2] = [".github/workflows", ".gitea/workflows"];

pub fn push_target(gitea: bool) -> &'static str {
    if gitea {
        GITEA_PUSH_YAML
    } else {
        GITHUB_PUSH_YAML
    }
}

pub fn pull_request_target(gitea: bool) -> &'static str {
    if gitea {
        GITEA_PULL_REQUEST_YAML
    } else {
        GITHUB_PULL_REQUEST_YAML
    }
}

fn add_update_certificates(steps: &mut Sequence) {
    ensure_contains(
        steps,
        [Value::Mapping(mapping([
            ("name", "Update CA certificates"),
            ("run", "sudo update-ca-certificates"),
        ]))],
    );
}

/// A `runs-on: ubuntu-latest` job whose steps include the action `uses`;
/// returns that step's `with` mapping
fn action_job<'a>(
    jobs: &'a mut Mapping,
    job: &str,
    step_name: &str,
    uses: &str,
    native_tls: bool,
) -> Result<&'a mut Mapping> {
    let job = get_set_mapping(jobs, job)?;
    job.insert("runs-on".into(), "ubuntu-latest".into());
    action_step(job, step_name, uses, native_tls)
}

fn action_step<'a>(
    job: &'a mut Mapping,
    step_name: &str,
    uses: &str,
    native_tls: bool,
) -> Result<&'a mut Mapping> {
    let steps = get_set_seq_mappings(job, "steps")?;
    if native_tls {
        add_update_certificates(steps);
    }
    let step = ensure_contains_partial_mapping(
        steps,
        mapping([("name", step_name), ("uses", uses)]),
        Mapping::new(),
    )?;
    let with = get_set_mapping(step, "with")?;
    if native_tls {
        with.insert("native-tls".into(), true.into());
    }
    Ok(with)
}

fn ensure_branch(on: &mut Mapping, event: &str) -> Result<()> {
    let event = get_set_mapping(on, event)?;
    ensure_contains(get_set_seq_strs(event, "branches")?, [Value::from("master")]);
    Ok(())
}

/// Push workflow: publish the package and tag the commit on `master`
pub fn setup_push(path: &Path, gitea: bool, native_tls: bool) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_yaml_mapping(path, &mut modifications, |workflow| {
        workflow.insert("name".into(), "push".into());
        ensure_branch(get_set_mapping(workflow, "on")?, "push")?;

        let jobs = get_set_mapping(workflow, "jobs")?;
        let publish = get_set_mapping(jobs, "publish")?;
        if !gitea {
            get_set_mapping(publish, "environment")?.insert("name".into(), "pypi".into());
            get_set_mapping(publish, "permissions")?.insert("id-token".into(), "write".into());
        }
        action_job(
            jobs,
            "publish",
            "Build and publish the package",
            "dycw/action-publish-package@latest",
            native_tls,
        )?;
        action_job(
            jobs,
            "tag",
            "Tag the latest commit",
            "dycw/action-tag-commit@latest",
            native_tls,
        )?;
        Ok(())
    })?;
    Ok(modifications.is_empty())
}

/// Daily schedule spread over the day by a hash of `repo_name`
pub fn cron_schedule(repo_name: Option<&str>) -> String {
    let (minute, hour) = match repo_name {
        Some(name) => {
            let digest = Blake2b::<U8>::digest(name.as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest);
            let value = u64::from_be_bytes(bytes);
            (value % 60, (value / 60) % 24)
        }
        None => (0, 0),
    };
    format!("{minute} {hour} * * *")
}

/// `python_version` up to the newest supported minor version
pub fn python_versions(python_version: &str) -> Result<Vec<String>> {
    let version: Version2 = python_version.parse()?;
    let max: Version2 = MAX_PYTHON_VERSION.parse()?;
    if version.major != max.major || version.minor > max.minor {
        return Err(Error::Validation {
            field: "python-version".into(),
            expected: format!("{}.x up to {max}", max.major),
            actual: python_version.to_string(),
        });
    }
    Ok((version.minor..=max.minor)
        .map(|minor| Version2::new(version.major, minor).to_string())
        .collect())
}

#[derive(Debug, Clone, Default)]
pub struct PullRequestOptions {
    pub gitea: bool,
    pub native_tls: bool,
    pub python_version: String,
    pub repo_name: Option<String>,
    pub pytest_os: Vec<String>,
    pub pytest_python_versions: Vec<String>,
    pub pytest_runs_on: Vec<String>,
}

fn add_pytest(jobs: &mut Mapping, options: &PullRequestOptions) -> Result<()> {
    let pytest = get_set_mapping(jobs, "pytest")?;
    get_set_mapping(pytest, "env")?.insert("CI".into(), "1".into());
    pytest.insert(
        "name".into(),
        "pytest (${{matrix.os}}, ${{matrix.python-version}}, ${{matrix.resolution}})".into(),
    );
    let runs_on = get_set_seq_strs(pytest, "runs-on")?;
    if options.pytest_runs_on.is_empty() {
        ensure_contains(runs_on, [Value::from("${{matrix.os}}")]);
    } else {
        ensure_contains(runs_on, options.pytest_runs_on.iter().map(|s| Value::from(s.as_str())));
    }

    let with = action_step(pytest, "Run 'pytest'", "dycw/action-pytest@latest", options.native_tls)?;
    with.insert("python-version".into(), "${{matrix.python-version}}".into());
    with.insert("resolution".into(), "${{matrix.resolution}}".into());

    let strategy = get_set_mapping(pytest, "strategy")?;
    strategy.insert("fail-fast".into(), false.into());
    let matrix = get_set_mapping(strategy, "matrix")?;
    let os = if options.pytest_os.is_empty() {
        vec!["macos-latest".to_string(), "ubuntu-latest".to_string()]
    } else {
        options.pytest_os.clone()
    };
    ensure_contains(get_set_seq_strs(matrix, "os")?, os.into_iter().map(Value::from));
    let versions = if options.pytest_python_versions.is_empty() {
        python_versions(&options.python_version)?
    } else {
        options.pytest_python_versions.clone()
    };
    ensure_contains(
        get_set_seq_strs(matrix, "python-version")?,
        versions.into_iter().map(Value::from),
    );
    ensure_contains(
        get_set_seq_strs(matrix, "resolution")?,
        [Value::from("highest"), Value::from("lowest-direct")],
    );
    pytest.insert("timeout-minutes".into(), 10.into());
    Ok(())
}

/// Pull request workflow: pyright and a pytest matrix, also run on a daily
/// schedule
pub fn setup_pull_request(path: &Path, options: &PullRequestOptions) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_yaml_mapping(path, &mut modifications, |workflow| {
        workflow.insert("name".into(), "pull-request".into());
        let on = get_set_mapping(workflow, "on")?;
        ensure_branch(on, "pull_request")?;
        let cron = mapping([("cron", cron_schedule(options.repo_name.as_deref()))]);
        ensure_contains(get_set_seq_mappings(on, "schedule")?, [Value::Mapping(cron)]);

        let jobs = get_set_mapping(workflow, "jobs")?;
        let with = action_job(
            jobs,
            "pyright",
            "Run 'pyright'",
            "dycw/action-pyright@latest",
            options.native_tls,
        )?;
        with.insert("python-version".into(), options.python_version.as_str().into());
        add_pytest(jobs, options)
    })?;
    Ok(modifications.is_empty())
}

fn yaml_name(path: &Path) -> Option<PathBuf> {
    (path.extension()? == "yml").then(|| path.with_extension("yaml"))
}

/// Workflow files with a `.yml` extension under `root`
pub fn find_yml_workflows(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for dir in WORKFLOW_DIRS {
        let pattern = root.join(dir).join("*.yml");
        let entries = glob::glob(&pattern.to_string_lossy()).map_err(|e| Error::InvalidPath {
            path: PathBuf::from(e.msg),
        })?;
        found.extend(entries.filter_map(std::result::Result::ok));
    }
    found.sort();
    Ok(found)
}

/// Rename a workflow file from `.yml` to `.yaml`; passes when there was
/// nothing to rename
pub fn update_extension(path: &Path) -> Result<bool> {
    let Some(target) = yaml_name(path) else {
        return Ok(true);
    };
    if !path.exists() {
        return Ok(true);
    }
    if target.exists() {
        tracing::warn!(
            from = %path.display(),
            to = %target.display(),
            "not renaming workflow over an existing file"
        );
        return Ok(false);
    }
    fs::rename(path, &target).map_err(|source| Error::Write {
        path: target.clone(),
        source,
    })?;
    tracing::info!(from = %path.display(), to = %target.display(), "renamed workflow");
    Ok(false)
}
