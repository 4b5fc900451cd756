use super::uv::UvOptions;
use crate::document::text::{edit_text, ensure_block};
use crate::document::Modifications;
use crate::error::Result;
use std::path::Path;

const HEADER: &str = r#"#!/usr/bin/env sh
# shellcheck source=/dev/null

# echo
echo_date() { echo "[$(date +'%Y-%m-%d %H:%M:%S')] $*" >&2; }"#;

const UV_MARKER: &str = "# uv\n";

/// The `# uv` block: environment for `uv`, then activate or create the venv
pub fn uv_block(python_version: &str, uv: &UvOptions) -> String {
    let mut lines = vec![
        "# uv".to_string(),
        "export UV_MANAGED_PYTHON='true'".to_string(),
    ];
    if !uv.indexes.is_empty() {
        let indexes: Vec<String> = uv.indexes.iter().map(ToString::to_string).collect();
        lines.push(format!("export UV_INDEX='{}'", indexes.join(" ")));
    }
    if uv.native_tls {
        lines.push("export UV_NATIVE_TLS='true'".to_string());
    }
    lines.extend(
        [
            "export UV_PRERELEASE='disallow'".to_string(),
            format!("export UV_PYTHON='{python_version}'"),
            "export UV_RESOLUTION='highest'".to_string(),
            "export UV_VENV_CLEAR=1".to_string(),
            "if ! command -v uv >/dev/null 2>&1; then\n\techo_date \"ERROR: 'uv' not found\" && exit 1\nfi".to_string(),
            "activate='.venv/bin/activate'".to_string(),
            "if [ -f $activate ]; then\n\t. $activate\nelse\n\tuv venv\nfi".to_string(),
            "uv sync --all-extras --all-groups --active --locked".to_string(),
        ],
    );
    lines.join("\n")
}

/// Replace the paragraph starting with `# uv`, or append `block`
fn set_uv_block(text: &mut String, block: &str) {
    let start = if text.starts_with(UV_MARKER) {
        Some(0)
    } else {
        text.find(&format!("\n\n{UV_MARKER}")).map(|i| i + 2)
    };
    let Some(start) = start else {
        ensure_block(text, block);
        return;
    };
    let end = text[start..]
        .find("\n\n")
        .map_or(text.len(), |i| start + i);
    text.replace_range(start..end, block);
}

/// Ensure the `echo_date` header, and with `python` the uv block
pub fn run(path: &Path, python: Option<(&str, &UvOptions)>) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_text(path, &mut modifications, |text| {
        ensure_block(text, HEADER);
        if let Some((python_version, uv)) = python {
            set_uv_block(text, &uv_block(python_version, uv));
        }
        Ok(())
    })?;
    Ok(modifications.is_empty())
}
