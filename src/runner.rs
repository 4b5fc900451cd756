use crate::error::{Error, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

pub const PRE_COMMIT_CONFIG_YAML: &str = ".pre-commit-config.yaml";

/// Outcome of one job
#[derive(Debug)]
pub struct JobResult {
    pub target: PathBuf,
    pub outcome: Result<bool>,
}

impl JobResult {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Ok(true))
    }
}

/// Run `job` for every target in parallel. Every job runs to completion;
/// the return value is true only if every job returned `Ok(true)`.
pub fn run_all<F>(targets: &[PathBuf], max_workers: Option<usize>, job: F) -> bool
where
    F: Fn(&Path) -> Result<bool> + Sync,
{
    let run = || -> Vec<JobResult> {
        targets
            .par_iter()
            .map(|target| JobResult {
                target: target.clone(),
                outcome: job(target.as_path()),
            })
            .collect()
    };

    let results = match max_workers {
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                tracing::warn!(error = %e, "failed to build thread pool; using the global pool");
                run()
            }
        },
        None => run(),
    };

    report(&results)
}

fn report(results: &[JobResult]) -> bool {
    let mut all_passed = true;
    for result in results {
        match &result.outcome {
            Ok(true) => {
                tracing::debug!(path = %result.target.display(), "passed");
            }
            Ok(false) => {
                tracing::info!(path = %result.target.display(), "modified or failed check");
            }
            Err(e) => {
                tracing::error!(path = %result.target.display(), error = %e, "hook failed");
            }
        }
        all_passed &= result.passed();
    }
    all_passed
}

/// Map pre-commit supplied paths to the files a hook operates on.
///
/// A path ending in `target` is kept. A `.pre-commit-config.yaml`, or a
/// path named `also_ok`, maps to the `target` next to it. Anything else is
/// rejected. Results keep first-seen order without duplicates; no paths
/// means `target` itself.
pub fn resolve_targets(paths: &[PathBuf], target: &str, also_ok: Option<&str>) -> Result<Vec<PathBuf>> {
    if paths.is_empty() {
        return Ok(vec![PathBuf::from(target)]);
    }
    let mut out: Vec<PathBuf> = Vec::new();
    for path in paths {
        let resolved = if path.ends_with(target) {
            path.clone()
        } else if path.ends_with(PRE_COMMIT_CONFIG_YAML)
            || also_ok.is_some_and(|name| path.ends_with(name))
        {
            path.parent().unwrap_or(Path::new("")).join(target)
        } else {
            return Err(Error::InvalidPath { path: path.clone() });
        };
        if !out.contains(&resolved) {
            out.push(resolved);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_resolve_targets_empty() {
        assert_eq!(
            resolve_targets(&[], "pyproject.toml", None).unwrap(),
            paths(&["pyproject.toml"])
        );
    }

    #[test]
    fn test_resolve_targets_maps_and_dedups() {
        let input = paths(&[
            "pkg/pyproject.toml",
            "pkg/.pre-commit-config.yaml",
            ".pre-commit-config.yaml",
            "pyproject.toml",
        ]);
        assert_eq!(
            resolve_targets(&input, "pyproject.toml", None).unwrap(),
            paths(&["pkg/pyproject.toml", "pyproject.toml"])
        );
    }

    #[test]
    fn test_resolve_targets_also_ok() {
        let input = paths(&["sub/.bumpversion.toml"]);
        assert_eq!(
            resolve_targets(&input, "pyproject.toml", Some(".bumpversion.toml")).unwrap(),
            paths(&["sub/pyproject.toml"])
        );
    }

    #[test]
    fn test_resolve_targets_invalid() {
        let err = resolve_targets(&paths(&["README.md"]), "pyproject.toml", None).unwrap_err();
        assert_eq!(err.to_string(), "invalid path; got 'README.md'");
    }

    #[test]
    fn test_run_all_runs_every_job() {
        let calls = AtomicUsize::new(0);
        let targets = paths(&["a", "b", "c"]);
        let ok = run_all(&targets, Some(2), |target| {
            calls.fetch_add(1, Ordering::SeqCst);
            if target == Path::new("b") {
                Err(Error::Version("bad".into()))
            } else {
                Ok(true)
            }
        });
        assert!(!ok);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_run_all_passes_only_when_all_true() {
        let targets = paths(&["a", "b"]);
        assert!(run_all(&targets, None, |_| Ok(true)));
        assert!(!run_all(&targets, None, |t| Ok(t != Path::new("a"))));
    }
}
