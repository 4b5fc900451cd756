use crate::document::read_optional;
use crate::error::Result;
use crate::process::Tool;
use std::path::Path;

/// Run `program autoupdate` next to `config`; passes when the config is
/// unchanged
pub fn autoupdate_with(program: &str, config: &Path) -> Result<bool> {
    let dir = match config.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let before = read_optional(config)?;
    Tool::new(program).arg("autoupdate").current_dir(dir).run()?;
    let after = read_optional(config)?;
    if before != after {
        tracing::info!(path = %config.display(), "hook revisions updated");
    }
    Ok(before == after)
}

pub fn autoupdate(config: &Path) -> Result<bool> {
    autoupdate_with("prek", config)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn fake_tool(dir: &Path, name: &str, script: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_autoupdate_reports_changes() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join(".pre-commit-config.yaml");
        fs::write(&config, "repos: []\n").unwrap();

        let noop = fake_tool(temp.path(), "noop", "exit 0");
        assert!(autoupdate_with(&noop, &config).unwrap());

        let bump = fake_tool(temp.path(), "bump", "echo '# updated' >> .pre-commit-config.yaml");
        assert!(!autoupdate_with(&bump, &config).unwrap());
    }

    #[test]
    fn test_autoupdate_failure() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join(".pre-commit-config.yaml");
        let failing = fake_tool(temp.path(), "failing", "echo 'no network' >&2; exit 1");
        let err = autoupdate_with(&failing, &config).unwrap_err();
        assert!(err.to_string().contains("no network"));
    }
}
