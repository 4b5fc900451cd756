use crate::error::Result;
use crate::process::Tool;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Branch that version checks compare against
pub const BASE_REF: &str = "origin/master";

/// Get the git repository root directory.
pub fn git_root(cwd: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(cwd)
        .output()
        .ok()?;

    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout);
        Some(PathBuf::from(path.trim()))
    } else {
        None
    }
}

/// Contents of `path` as of `rev`. Relative paths resolve against the
/// current directory.
pub fn show_file(rev: &str, path: &Path) -> Result<String> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Tool::new("git")
        .arg("show")
        .arg(format!("{rev}:./{name}"))
        .current_dir(dir)
        .run()
}
