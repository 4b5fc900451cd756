use crate::document::toml::{
    array_strs, edit_toml, get_array, get_set_array, get_set_table, set_array_strs,
};
use crate::document::Modifications;
use crate::error::Result;
use crate::requirements::{
    for_each_dependency_array, map_requirements, pin_requirement, update_requirement, Requirement,
};
use crate::version::VersionSet;
use std::path::Path;
use toml_edit::Item;

/// Canonicalize every requirement string and sort each dependency array
pub fn format_requirements(path: &Path) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_toml(path, &mut modifications, |doc| {
        for_each_dependency_array(doc, |key, array| {
            let current = array_strs(array, key)?;
            let mut formatted = current
                .iter()
                .map(|text| text.parse::<Requirement>().map(|r| r.to_string()))
                .collect::<Result<Vec<_>>>()?;
            formatted.sort();
            if formatted != current {
                set_array_strs(array, &formatted);
            }
            Ok(())
        })
    })?;
    Ok(modifications.is_empty())
}

/// Raise requirement bounds to admit the latest versions
pub fn update_requirements(path: &Path, versions: &VersionSet) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_toml(path, &mut modifications, |doc| {
        map_requirements(doc, |req| update_requirement(req, versions))
    })?;
    Ok(modifications.is_empty())
}

/// For projects with `[project.scripts]`, make the `cli` extra the project
/// dependencies pinned to their latest versions. Dependencies with no known
/// version are kept as written.
pub fn pin_cli(path: &Path, versions: &VersionSet) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_toml(path, &mut modifications, |doc| {
        let Some(project) = doc.get_mut("project").and_then(Item::as_table_mut) else {
            return Ok(());
        };
        if !project.contains_key("scripts") {
            return Ok(());
        }
        let dependencies = if project.contains_key("dependencies") {
            array_strs(get_array(project, "dependencies")?, "dependencies")?
        } else {
            Vec::new()
        };
        let mut pinned = Vec::with_capacity(dependencies.len());
        for text in dependencies {
            let req: Requirement = text.parse()?;
            let req = match versions.get(&req.name) {
                Some(latest) => pin_requirement(req, latest)?,
                None => req,
            };
            pinned.push(req.to_string());
        }
        let optional = get_set_table(project, "optional-dependencies")?;
        let cli = get_set_array(optional, "cli")?;
        if array_strs(cli, "cli")? != pinned {
            set_array_strs(cli, &pinned);
        }
        Ok(())
    })?;
    Ok(modifications.is_empty())
}
