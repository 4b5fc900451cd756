use super::uv::UvOptions;
use crate::catalog::HookType;
use crate::document::yaml::{
    edit_yaml_mapping, ensure_contains_partial_mapping, get_set_seq_mappings, mapping, strs,
};
use crate::document::Modifications;
use crate::error::Result;
use serde_yaml::{Mapping, Value};
use std::path::Path;

pub const BUILTIN: &str = "builtin";
pub const LOCAL: &str = "local";
pub const DOCKERFMT_URL: &str = "https://github.com/reteps/dockerfmt";
pub const RUFF_URL: &str = "https://github.com/astral-sh/ruff-pre-commit";
pub const SHELLCHECK_URL: &str = "https://github.com/koalaman/shellcheck-precommit";
pub const SHFMT_URL: &str = "https://github.com/scop/pre-commit-shfmt";
pub const STD_PRE_COMMIT_HOOKS_URL: &str = "https://github.com/pre-commit/pre-commit-hooks";
pub const STYLUA_URL: &str = "https://github.com/JohnnyMorganz/StyLua";
pub const TAPLO_URL: &str = "https://github.com/compwa/taplo-pre-commit";
pub const UV_URL: &str = "https://github.com/astral-sh/uv-pre-commit";
pub const XMLFORMATTER_URL: &str = "https://github.com/pamoller/xmlformatter";

/// Feature groups selecting which hooks to add
#[derive(Debug, Clone, Default)]
pub struct AddHooksOptions {
    pub ci: bool,
    pub direnv: bool,
    pub docker: bool,
    pub fish: bool,
    pub lua: bool,
    pub prettier: bool,
    pub python: bool,
    pub shell: bool,
    pub toml: bool,
    pub xml: bool,
    pub description: Option<String>,
    pub package_name_external: Option<String>,
    pub package_name_internal: Option<String>,
    pub python_version: String,
    pub uv: UvOptions,
}

/// One hook to ensure in `.pre-commit-config.yaml`
#[derive(Debug, Clone)]
pub struct HookEntry {
    repo: String,
    id: &'static str,
    /// Whether the repo needs a `rev`
    rev: bool,
    fields: Vec<(&'static str, Value)>,
    args: Option<Vec<String>>,
    hook_type: HookType,
}

impl HookEntry {
    pub fn remote(repo: &str, id: &'static str, hook_type: HookType) -> Self {
        Self {
            repo: repo.to_string(),
            id,
            rev: true,
            fields: Vec::new(),
            args: None,
            hook_type,
        }
    }

    pub fn builtin(id: &'static str, hook_type: HookType) -> Self {
        Self {
            rev: false,
            ..Self::remote(BUILTIN, id, hook_type)
        }
    }

    pub fn local(id: &'static str, hook_type: HookType) -> Self {
        Self {
            rev: false,
            ..Self::remote(LOCAL, id, hook_type)
        }
    }

    pub fn field(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    pub fn args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Set args only when there are any
    fn args_if_any(self, args: Vec<String>) -> Self {
        if args.is_empty() {
            self
        } else {
            self.args(args)
        }
    }

    /// Ensure the repo and hook exist in `config` and carry this entry's
    /// fields. Existing keys not named here are left alone.
    pub fn apply(&self, config: &mut Mapping) -> Result<()> {
        let repos = get_set_seq_mappings(config, "repos")?;
        let extra = if self.rev {
            mapping([("rev", "master")])
        } else {
            Mapping::new()
        };
        let repo = ensure_contains_partial_mapping(repos, mapping([("repo", self.repo.as_str())]), extra)?;
        let hooks = get_set_seq_mappings(repo, "hooks")?;
        let hook = ensure_contains_partial_mapping(hooks, mapping([("id", self.id)]), Mapping::new())?;
        for (key, value) in &self.fields {
            hook.insert(Value::from(*key), value.clone());
        }
        if let Some(args) = &self.args {
            hook.insert("args".into(), strs(args));
        }
        hook.insert("priority".into(), self.hook_type.priority().into());
        Ok(())
    }
}

/// The hooks selected by `options`, in application order. Later entries
/// for the same hook override earlier ones.
pub fn entries(options: &AddHooksOptions, hooks_url: &str) -> Vec<HookEntry> {
    use HookType::{Formatter, Linter};

    let ours = |id: &'static str, hook_type: HookType| HookEntry::remote(hooks_url, id, hook_type);
    let python_version_arg = format!("--python-version={}", options.python_version);

    let mut out = vec![
        ours("check-version-bumped", Linter),
        ours("check-versions-consistent", Linter),
        ours("format-pre-commit-config", Linter),
        ours("run-prek-autoupdate", Formatter),
        ours("run-version-bump", Formatter),
        ours("setup-bump-my-version", Formatter),
    ];
    out.extend(standard_hooks());

    if options.ci {
        out.push(ours("update-ci-action-versions", Formatter));
        out.push(ours("update-ci-extensions", Formatter));
    }
    if options.direnv {
        out.push(ours("setup-direnv", Formatter).args([python_version_arg.clone()]));
    }
    if options.docker {
        out.push(HookEntry::remote(DOCKERFMT_URL, "dockerfmt", Formatter).args(["--newline", "--write"]));
    }
    if options.fish {
        out.push(
            HookEntry::local("fish_indent", Formatter)
                .field("name", "fish_indent")
                .field("entry", "fish_indent")
                .field("language", "unsupported")
                .field("files", r"\.fish$")
                .args(["--write"]),
        );
    }
    if options.lua {
        out.push(HookEntry::remote(STYLUA_URL, "stylua-github", Formatter));
    }
    if options.prettier {
        out.push(
            HookEntry::local("prettier", Formatter)
                .field("name", "prettier")
                .field("entry", "npx prettier --write")
                .field("language", "unsupported")
                .field("types_or", strs(["markdown", "yaml"])),
        );
    }
    if options.python {
        out.push(ours("add-future-import-annotations", Formatter));
        out.push(ours("format-requirements", Formatter));
        out.push(ours("replace-sequence-str", Formatter));
        out.push(HookEntry::remote(RUFF_URL, "ruff-check", Linter).args(["--fix"]));
        out.push(HookEntry::remote(RUFF_URL, "ruff-format", Formatter));

        let mut bump_args = Vec::new();
        if let Some(name) = &options.package_name_internal {
            bump_args.push(format!("--python-package-name-internal={name}"));
        }
        out.push(ours("setup-bump-my-version", Formatter).args_if_any(bump_args));

        let mut direnv_args = vec!["--python".to_string()];
        direnv_args.extend(options.uv.hook_args());
        direnv_args.push(python_version_arg.clone());
        out.push(ours("setup-direnv", Formatter).args(direnv_args));

        out.push(ours("setup-git", Formatter));

        let mut pyproject_args = vec![python_version_arg.clone()];
        if let Some(description) = &options.description {
            pyproject_args.push(format!("--description={description}"));
        }
        if let Some(name) = &options.package_name_external {
            pyproject_args.push(format!("--python-package-name-external={name}"));
        }
        if let Some(name) = &options.package_name_internal {
            pyproject_args.push(format!("--python-package-name-internal={name}"));
        }
        pyproject_args.extend(options.uv.index_hook_args());
        out.push(ours("setup-pyproject", Formatter).args(pyproject_args));

        out.push(ours("setup-pyright", Formatter).args([python_version_arg.clone()]));
        out.push(ours("setup-ruff", Formatter).args([python_version_arg.clone()]));
        out.push(ours("update-requirements", Formatter));
        out.push(
            HookEntry::remote(UV_URL, "uv-lock", Formatter)
                .args(["--upgrade", "--resolution", "highest", "--prerelease", "disallow"]),
        );
    }
    if options.shell {
        out.push(HookEntry::remote(SHELLCHECK_URL, "shellcheck", Linter));
        out.push(HookEntry::remote(SHFMT_URL, "shfmt", Formatter));
    }
    if options.toml {
        out.push(HookEntry::remote(TAPLO_URL, "taplo-format", Linter).args([
            "--option",
            "indent_tables=true",
            "--option",
            "indent_entries=true",
            "--option",
            "reorder_keys=true",
        ]));
    }
    if options.xml {
        out.push(
            HookEntry::remote(XMLFORMATTER_URL, "xml-formatter", Formatter)
                .field("types", strs(Vec::<&str>::new()))
                .field("types_or", strs(["plist", "xml"]))
                .args(["--eof-newline"]),
        );
    }
    out
}

fn standard_hooks() -> Vec<HookEntry> {
    use HookType::{Formatter, Linter};

    let mut out: Vec<HookEntry> = [
        "check-added-large-files",
        "check-case-conflict",
        "check-executables-have-shebangs",
        "check-json",
        "check-json5",
        "check-merge-conflict",
        "check-symlinks",
        "check-toml",
        "check-xml",
        "check-yaml",
        "detect-private-key",
        "no-commit-to-branch",
    ]
    .into_iter()
    .map(|id| HookEntry::builtin(id, Linter))
    .collect();
    out.extend([
        HookEntry::builtin("end-of-file-fixer", Formatter),
        HookEntry::builtin("fix-byte-order-marker", Formatter),
        HookEntry::builtin("mixed-line-ending", Formatter).args(["--fix=lf"]),
        HookEntry::builtin("trailing-whitespace", Formatter),
        HookEntry::remote(STD_PRE_COMMIT_HOOKS_URL, "check-illegal-windows-names", Linter),
        HookEntry::remote(STD_PRE_COMMIT_HOOKS_URL, "destroyed-symlinks", Linter),
        HookEntry::remote(STD_PRE_COMMIT_HOOKS_URL, "pretty-format-json", Formatter).args(["--autofix"]),
    ]);
    out
}

pub fn run(path: &Path, options: &AddHooksOptions, hooks_url: &str) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_yaml_mapping(path, &mut modifications, |config| {
        for entry in entries(options, hooks_url) {
            entry.apply(config)?;
        }
        Ok(())
    })?;
    Ok(modifications.is_empty())
}
