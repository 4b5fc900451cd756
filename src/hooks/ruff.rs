use super::python_source::FUTURE_IMPORT;
use crate::document::toml::{ensure_contains_strs, edit_toml, get_set_array, get_set_table};
use crate::document::Modifications;
use crate::error::Result;
use crate::version::Version2;
use std::path::Path;
use toml_edit::value;

const IGNORE: [&str; 11] = [
    "ANN401", "C901", "COM812", "D", "E501", "FIX002", "ISC001", "PLR0913", "PLR2004", "TD002",
    "TD003",
];

/// `3.12` as ruff's `py312`
pub fn target_version(python_version: &str) -> Result<String> {
    let version: Version2 = python_version.parse()?;
    Ok(format!("py{}{}", version.major, version.minor))
}

pub fn run(path: &Path, python_version: &str) -> Result<bool> {
    let target = target_version(python_version)?;
    let mut modifications = Modifications::new();
    edit_toml(path, &mut modifications, |doc| {
        doc["target-version"] = value(target);
        doc["unsafe-fixes"] = value(true);

        let format = get_set_table(doc.as_table_mut(), "format")?;
        format["preview"] = value(true);
        format["skip-magic-trailing-comma"] = value(true);

        let lint = get_set_table(doc.as_table_mut(), "lint")?;
        lint["explicit-preview-rules"] = value(true);
        ensure_contains_strs(get_set_array(lint, "fixable")?, ["ALL"]);
        ensure_contains_strs(get_set_array(lint, "select")?, ["ALL"]);
        ensure_contains_strs(get_set_array(lint, "ignore")?, IGNORE);

        let tidy = get_set_table(lint, "flake8-tidy-imports")?;
        tidy["ban-relative-imports"] = value("all");

        let isort = get_set_table(lint, "isort")?;
        ensure_contains_strs(get_set_array(isort, "required-imports")?, [FUTURE_IMPORT]);
        isort["split-on-trailing-comma"] = value(false);
        Ok(())
    })?;
    Ok(modifications.is_empty())
}
