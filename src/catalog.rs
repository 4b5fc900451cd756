use crate::document::yaml::{edit_yaml, mapping};
use crate::document::Modifications;
use crate::error::Result;
use serde_yaml::{Sequence, Value};
use std::path::Path;
use std::sync::LazyLock;

pub const MANIFEST_YAML: &str = ".pre-commit-hooks.yaml";

const PRE_COMMIT_CONFIG: &str = r"(^|/)\.pre-commit-config\.yaml$";
const PYPROJECT: &str = r"(^|/)(\.pre-commit-config\.yaml|pyproject\.toml)$";
const PYTHON: &str = r"\.py$";

/// Whether a hook rewrites files or only inspects them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
    Formatter,
    Linter,
}

impl HookType {
    /// prek `priority`; formatters run before linters
    pub fn priority(self) -> u64 {
        match self {
            Self::Formatter => 10,
            Self::Linter => 20,
        }
    }
}

/// A hook this binary provides
#[derive(Debug, Clone)]
pub struct HookSpec {
    pub id: &'static str,
    pub name: &'static str,
    /// Regex of files that trigger the hook
    pub files: &'static str,
    /// Whether pre-commit passes matched filenames
    pub pass_filenames: bool,
}

fn hook(id: &'static str, name: &'static str, files: &'static str) -> HookSpec {
    HookSpec {
        id,
        name,
        files,
        pass_filenames: true,
    }
}

fn always(id: &'static str, name: &'static str) -> HookSpec {
    HookSpec {
        id,
        name,
        files: PRE_COMMIT_CONFIG,
        pass_filenames: false,
    }
}

/// Every hook, in manifest order
pub static HOOKS: LazyLock<Vec<HookSpec>> = LazyLock::new(|| {
    vec![
        hook("add-future-import-annotations", "add 'from __future__ import annotations'", PYTHON),
        hook("add-hooks", "add hooks to .pre-commit-config.yaml", PRE_COMMIT_CONFIG),
        always("check-version-bumped", "check the version has been bumped"),
        always("check-versions-consistent", "check the versions are consistent"),
        hook("format-pre-commit-config", "format .pre-commit-config.yaml", PRE_COMMIT_CONFIG),
        hook("format-pytest", "format pytest.toml", r"(^|/)(\.pre-commit-config\.yaml|pytest\.toml)$"),
        hook("format-requirements", "format requirements", PYPROJECT),
        hook("pin-cli-requirements", "pin the 'cli' extra", PYPROJECT),
        hook("replace-sequence-str", "replace 'Sequence[str]'", PYTHON),
        always("run-prek-autoupdate", "run 'prek autoupdate'"),
        hook("run-uv-lock", "run 'uv lock'", PYPROJECT),
        always("run-version-bump", "run 'bump-my-version'"),
        hook("setup-bump-my-version", "set up bump-my-version", PRE_COMMIT_CONFIG),
        hook("setup-ci-pull-request", "set up the pull request workflow", PRE_COMMIT_CONFIG),
        hook("setup-ci-push", "set up the push workflow", PRE_COMMIT_CONFIG),
        hook("setup-direnv", "set up direnv", PRE_COMMIT_CONFIG),
        hook("setup-git", "set up git", PRE_COMMIT_CONFIG),
        hook("setup-pyproject", "set up pyproject.toml", PYPROJECT),
        hook("setup-pyright", "set up pyright", PRE_COMMIT_CONFIG),
        hook("setup-ruff", "set up ruff", PRE_COMMIT_CONFIG),
        hook("update-ci-extensions", "rename workflow files to '.yaml'", r"(^|/)\.(github|gitea)/workflows/.*\.yml$"),
        hook("update-requirements", "update requirements", PYPROJECT),
    ]
});

/// The pre-commit manifest describing every hook
pub fn manifest() -> Value {
    let entries: Sequence = HOOKS
        .iter()
        .map(|h| {
            let mut entry = mapping([
                ("id", h.id.to_string()),
                ("name", h.name.to_string()),
                ("entry", format!("prehooks {}", h.id)),
                ("language", "rust".to_string()),
                ("files", h.files.to_string()),
            ]);
            if !h.pass_filenames {
                entry.insert("pass_filenames".into(), false.into());
                entry.insert("always_run".into(), true.into());
            }
            Value::Mapping(entry)
        })
        .collect();
    Value::Sequence(entries)
}

/// Write the manifest to `path`; true when it was already current
pub fn write_manifest(path: &Path) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_yaml(path, &mut modifications, |doc| {
        *doc = manifest();
        Ok(())
    })?;
    Ok(modifications.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ids_unique_and_sorted() {
        let ids: Vec<&str> = HOOKS.iter().map(|h| h.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_files_are_valid_regexes() {
        for h in HOOKS.iter() {
            assert!(regex::Regex::new(h.files).is_ok(), "hook {} has bad files regex", h.id);
        }
    }

    #[test]
    fn test_priorities() {
        assert_eq!(HookType::Formatter.priority(), 10);
        assert_eq!(HookType::Linter.priority(), 20);
    }

    #[test]
    fn test_write_manifest_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(MANIFEST_YAML);
        assert!(!write_manifest(&path).unwrap());
        assert!(write_manifest(&path).unwrap());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("- id: add-future-import-annotations\n"));
        assert!(text.contains("entry: prehooks run-prek-autoupdate\n"));
    }
}
