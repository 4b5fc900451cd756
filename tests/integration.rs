#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn run_prehooks(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_prehooks"))
        .args(args)
        .current_dir(dir)
        .env("PREHOOKS_CACHE_DIR", dir.join(".cache"))
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("failed to run prehooks");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_format_requirements_then_clean() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("pyproject.toml"),
        "[project]\ndependencies = [\"package  >=  1.2.3\"]\n",
    )
    .unwrap();

    let (_stdout, _stderr, code) = run_prehooks(temp.path(), &["format-requirements"]);
    assert_eq!(code, 1, "first run rewrites the file");
    let text = fs::read_to_string(temp.path().join("pyproject.toml")).unwrap();
    assert!(text.contains("\"package>=1.2.3\""));

    let (_stdout, _stderr, code) = run_prehooks(temp.path(), &["format-requirements"]);
    assert_eq!(code, 0, "second run is a no-op");
}

#[test]
fn test_setup_pyright_creates_file() {
    let temp = TempDir::new().unwrap();
    let (_stdout, _stderr, code) = run_prehooks(
        temp.path(),
        &["setup-pyright", "--python-version=3.13", ".pre-commit-config.yaml"],
    );
    assert_eq!(code, 1);

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("pyrightconfig.json")).unwrap())
            .unwrap();
    assert_eq!(config["pythonVersion"], "3.13");
    assert_eq!(config["typeCheckingMode"], "strict");

    let (_stdout, _stderr, code) = run_prehooks(temp.path(), &["setup-pyright", "--python-version=3.13"]);
    assert_eq!(code, 0);
}

#[test]
fn test_settings_file_sets_python_version() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("prehooks.yaml"), "python_version: \"3.14\"\n").unwrap();
    let (_stdout, _stderr, code) = run_prehooks(temp.path(), &["setup-ruff"]);
    assert_eq!(code, 1);
    let text = fs::read_to_string(temp.path().join("ruff.toml")).unwrap();
    assert!(text.contains("target-version = \"py314\""));
}

#[test]
fn test_manifest_lists_every_hook() {
    let temp = TempDir::new().unwrap();
    let (_stdout, _stderr, code) = run_prehooks(temp.path(), &["manifest"]);
    assert_eq!(code, 1);

    let text = fs::read_to_string(temp.path().join(".pre-commit-hooks.yaml")).unwrap();
    let manifest: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    let hooks = manifest.as_sequence().unwrap();
    assert_eq!(hooks.len(), 22);
    assert_eq!(hooks[0]["id"], "add-future-import-annotations");

    let (_stdout, _stderr, code) = run_prehooks(temp.path(), &["manifest"]);
    assert_eq!(code, 0);
}

#[test]
fn test_invalid_path_fails() {
    let temp = TempDir::new().unwrap();
    let (_stdout, stderr, code) = run_prehooks(temp.path(), &["setup-pyproject", "README.md"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("README.md"), "stderr was: {stderr}");
    assert!(!temp.path().join("pyproject.toml").exists());
}

#[test]
fn test_unknown_subcommand_fails() {
    let temp = TempDir::new().unwrap();
    let (_stdout, _stderr, code) = run_prehooks(temp.path(), &["not-a-hook"]);
    assert_ne!(code, 0);
}

#[test]
fn test_python_hooks_ignore_other_files() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("module.py"), "x: Sequence[str] = []\n").unwrap();
    fs::write(temp.path().join("notes.txt"), "Sequence[str]\n").unwrap();

    let (_stdout, _stderr, code) =
        run_prehooks(temp.path(), &["replace-sequence-str", "module.py", "notes.txt"]);
    assert_eq!(code, 1);
    assert_eq!(
        fs::read_to_string(temp.path().join("module.py")).unwrap(),
        "x: list[str] = []\n"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("notes.txt")).unwrap(),
        "Sequence[str]\n"
    );
}
