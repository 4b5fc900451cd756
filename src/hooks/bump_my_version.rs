use super::pyproject::snake_case;
use super::PYPROJECT_TOML;
use crate::document::toml::{edit_toml, ensure_aot_entry, get_set_aot, get_set_table, read_str};
use crate::document::{read_optional, Modifications};
use crate::error::{Error, Result};
use crate::git::{self, BASE_REF};
use crate::process::Tool;
use crate::version::Version3;
use std::path::{Path, PathBuf};
use toml_edit::value;

const CURRENT_VERSION: [&str; 3] = ["tool", "bumpversion", "current_version"];

fn parent(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// `[tool.bumpversion]` with `allow_dirty`, a default `current_version`,
/// and with a package name, file entries for `pyproject.toml` and the
/// package `__init__.py`
pub fn setup(path: &Path, package_name_internal: Option<&str>) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_toml(path, &mut modifications, |doc| {
        let tool = get_set_table(doc.as_table_mut(), "tool")?;
        let bumpversion = get_set_table(tool, "bumpversion")?;
        bumpversion["allow_dirty"] = value(true);
        if !bumpversion.contains_key("current_version") {
            bumpversion["current_version"] = value(Version3::new(0, 1, 0).to_string());
        }
        let Some(name) = package_name_internal else {
            return Ok(());
        };
        let init = format!("src/{}/__init__.py", snake_case(name));
        let files = get_set_aot(bumpversion, "files")?;
        for (filename, template) in [
            (PYPROJECT_TOML, "version = \"{version}\""),
            (init.as_str(), "__version__ = \"{version}\""),
        ] {
            let entry = ensure_aot_entry(files, "filename", filename)?;
            entry["search"] = value(template.replace("{version}", "{current_version}"));
            entry["replace"] = value(template.replace("{version}", "{new_version}"));
        }
        Ok(())
    })?;
    Ok(modifications.is_empty())
}

fn parse_current_version(source: &Path, text: &str) -> Result<Version3> {
    read_str(source, text, &CURRENT_VERSION)?.parse()
}

/// `current_version` of a `.bumpversion.toml`
pub fn current_version(path: &Path) -> Result<Version3> {
    let text = read_optional(path)?.ok_or_else(|| Error::InvalidPath {
        path: path.to_path_buf(),
    })?;
    parse_current_version(path, &text)
}

/// `current_version` as of the base branch
pub fn base_version(path: &Path) -> Result<Version3> {
    let text = git::show_file(BASE_REF, path)?;
    parse_current_version(path, &text)
}

/// Whether the version differs from the base branch. Any failure to read
/// either version fails the check.
pub fn check_version_bumped(path: &Path) -> bool {
    match (current_version(path), base_version(path)) {
        (Ok(current), Ok(base)) => {
            if current == base {
                tracing::warn!(path = %path.display(), version = %current, "version not bumped");
            }
            current != base
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "could not compare versions");
            false
        }
    }
}

/// `project.version` of the sibling `pyproject.toml` must equal
/// `current_version`; passes when there is no `pyproject.toml`
pub fn check_versions_consistent(path: &Path) -> Result<bool> {
    let current = current_version(path)?;
    let pyproject = parent(path).join(PYPROJECT_TOML);
    let Some(text) = read_optional(&pyproject)? else {
        return Ok(true);
    };
    let project: Version3 = read_str(&pyproject, &text, &["project", "version"])?.parse()?;
    if project != current {
        return Err(Error::Validation {
            field: "project.version".into(),
            expected: current.to_string(),
            actual: project.to_string(),
        });
    }
    Ok(true)
}

/// Version to move to, or `None` when `current` is already a single bump
/// of `base`
pub fn next_version(current: Version3, base: Version3) -> Option<Version3> {
    let bumps = [base.bump_patch(), base.bump_minor(), base.bump_major()];
    (!bumps.contains(&current)).then(|| base.bump_patch())
}

fn in_template_repo(dir: &Path) -> bool {
    git::git_root(dir)
        .and_then(|root| root.file_name().map(|n| n.to_string_lossy().contains("template")))
        .unwrap_or(false)
}

/// Bump to the next patch of the base branch unless already bumped once.
/// Template repositories are left alone.
pub fn run_version_bump(path: &Path) -> Result<bool> {
    let dir = parent(path);
    if in_template_repo(dir) {
        return Ok(true);
    }
    let current = current_version(path)?;
    let base = base_version(path)?;
    let Some(next) = next_version(current, base) else {
        return Ok(true);
    };
    tracing::info!(path = %path.display(), from = %current, to = %next, "bumping version");
    let name: PathBuf = path.file_name().map(PathBuf::from).unwrap_or_default();
    Tool::new("bump-my-version")
        .args(["replace", "--new-version"])
        .arg(next.to_string())
        .arg(&name)
        .current_dir(dir)
        .run()?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_setup_twice() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".bumpversion.toml");
        for i in 0..2 {
            assert_eq!(setup(&path, None).unwrap(), i >= 1);
        }
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[tool.bumpversion]\nallow_dirty = true\ncurrent_version = \"0.1.0\"\n"
        );
        assert_eq!(current_version(&path).unwrap(), Version3::new(0, 1, 0));
    }

    #[test]
    fn test_setup_with_package_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".bumpversion.toml");
        fs::write(&path, "[tool.bumpversion]\ncurrent_version = \"1.2.3\"\n").unwrap();
        assert!(!setup(&path, Some("my-package")).unwrap());
        assert!(setup(&path, Some("my-package")).unwrap());

        let doc: toml::Table = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let bumpversion = &doc["tool"]["bumpversion"];
        assert_eq!(bumpversion["current_version"].as_str(), Some("1.2.3"));
        let files = bumpversion["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1]["filename"].as_str(), Some("src/my_package/__init__.py"));
        assert_eq!(files[0]["search"].as_str(), Some("version = \"{current_version}\""));
        assert_eq!(files[1]["replace"].as_str(), Some("__version__ = \"{new_version}\""));
    }

    #[test]
    fn test_check_versions_consistent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".bumpversion.toml");
        fs::write(&path, "[tool.bumpversion]\ncurrent_version = \"1.2.3\"\n").unwrap();
        assert!(check_versions_consistent(&path).unwrap());

        let pyproject = temp.path().join("pyproject.toml");
        fs::write(&pyproject, "[project]\nversion = \"1.2.3\"\n").unwrap();
        assert!(check_versions_consistent(&path).unwrap());

        fs::write(&pyproject, "[project]\nversion = \"1.2.4\"\n").unwrap();
        let err = check_versions_consistent(&path).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(err.to_string(), "project.version: expected 1.2.3, got 1.2.4");
    }

    #[test]
    fn test_check_version_bumped_without_base() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".bumpversion.toml");
        assert!(!check_version_bumped(&path));
    }

    #[test]
    fn test_next_version() {
        let base = Version3::new(1, 2, 3);
        assert_eq!(next_version(Version3::new(1, 2, 4), base), None);
        assert_eq!(next_version(Version3::new(1, 3, 0), base), None);
        assert_eq!(next_version(Version3::new(2, 0, 0), base), None);
        assert_eq!(next_version(base, base), Some(Version3::new(1, 2, 4)));
        assert_eq!(
            next_version(Version3::new(1, 2, 5), base),
            Some(Version3::new(1, 2, 4))
        );
    }
}
