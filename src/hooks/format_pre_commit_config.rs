use crate::document::yaml::{edit_yaml_mapping, get_seq_mappings, re_insert};
use crate::document::Modifications;
use crate::error::Result;
use serde_yaml::{Mapping, Value};
use std::path::Path;

const REPO_KEYS: &[&str] = &["repo", "rev", "hooks"];

const REMOTE_HOOK_KEYS: &[&str] = &[
    "id",
    "alias",
    "name",
    "language_version",
    "files",
    "exclude",
    "types",
    "types_or",
    "exclude_types",
    "args",
    "stages",
    "additional_dependencies",
    "always_run",
    "verbose",
    "log_file",
    "priority",
];

const LOCAL_HOOK_KEYS: &[&str] = &[
    "id",
    "name",
    "entry",
    "language",
    "files",
    "exclude",
    "types",
    "types_or",
    "exclude_types",
    "always_run",
    "fail_fast",
    "verbose",
    "pass_filenames",
    "require_serial",
    "description",
    "language_version",
    "minimum_pre_commit_version",
    "args",
    "stages",
    "additional_dependencies",
    "priority",
];

fn str_field<'a>(mapping: &'a Mapping, key: &str) -> &'a str {
    mapping.get(key).and_then(Value::as_str).unwrap_or("")
}

fn repo_sort_key(repo: &Mapping, hooks_url: &str) -> (u8, String, String) {
    let url = str_field(repo, "repo");
    let group = if url == hooks_url {
        0
    } else if url.contains("pre-commit-hooks") {
        1
    } else {
        2
    };
    (group, url.to_string(), str_field(repo, "rev").to_string())
}

fn hook_sort_key(hook: &Mapping) -> (u8, String) {
    let id = str_field(hook, "id");
    (u8::from(id != "add-hooks"), id.to_string())
}

fn is_absent(mapping: &Mapping, key: &str) -> bool {
    mapping.get(key).is_none_or(Value::is_null)
}

/// Sort repos and hooks and put their keys in canonical order. Keys this
/// module does not know about stay, after the known ones.
pub fn format_config(config: &mut Mapping, hooks_url: &str) -> Result<()> {
    if is_absent(config, "repos") {
        return Ok(());
    }
    let repos = get_seq_mappings(config, "repos")?;

    repos.sort_by_cached_key(|r| r.as_mapping().map(|m| repo_sort_key(m, hooks_url)));
    for repo in repos.iter_mut().filter_map(Value::as_mapping_mut) {
        re_insert(repo, REPO_KEYS);
        let keys = if str_field(repo, "repo") == "local" {
            LOCAL_HOOK_KEYS
        } else {
            REMOTE_HOOK_KEYS
        };
        if is_absent(repo, "hooks") {
            continue;
        }
        let hooks = get_seq_mappings(repo, "hooks")?;
        hooks.sort_by_cached_key(|h| h.as_mapping().map(hook_sort_key));
        for hook in hooks.iter_mut().filter_map(Value::as_mapping_mut) {
            re_insert(hook, keys);
        }
    }
    Ok(())
}

pub fn run(path: &Path, hooks_url: &str) -> Result<bool> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config to format");
        return Ok(true);
    }
    let mut modifications = Modifications::new();
    edit_yaml_mapping(path, &mut modifications, |config| format_config(config, hooks_url))?;
    Ok(modifications.is_empty())
}
