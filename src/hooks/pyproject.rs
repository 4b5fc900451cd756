use super::uv::Index;
use crate::document::toml::{
    edit_toml, ensure_aot_entry, ensure_contains_partial_str, get_set_aot, get_set_array,
    get_set_table,
};
use crate::document::Modifications;
use crate::error::Result;
use std::path::Path;
use toml_edit::{value, Array, DocumentMut, Table};

pub const README_MD: &str = "README.md";

const DEV_DEPENDENCIES: [&str; 3] = ["dycw-utilities[test]", "pyright", "rich"];

#[derive(Debug, Clone, Default)]
pub struct PyprojectOptions {
    pub python_version: String,
    pub description: Option<String>,
    /// Distribution name, written kebab-case
    pub package_name_external: Option<String>,
    /// Import name, written snake_case
    pub package_name_internal: Option<String>,
    pub indexes: Vec<Index>,
}

fn words(name: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub fn kebab_case(name: &str) -> String {
    words(name).join("-")
}

pub fn snake_case(name: &str) -> String {
    words(name).join("_")
}

fn tool_uv(doc: &mut DocumentMut) -> Result<&mut Table> {
    let tool = get_set_table(doc.as_table_mut(), "tool")?;
    get_set_table(tool, "uv")
}

fn apply(doc: &mut DocumentMut, options: &PyprojectOptions) -> Result<()> {
    let build_system = get_set_table(doc.as_table_mut(), "build-system")?;
    build_system["build-backend"] = value("uv_build");
    build_system["requires"] = value(Array::from_iter(["uv_build"]));

    let project = get_set_table(doc.as_table_mut(), "project")?;
    if let Some(name) = &options.package_name_external {
        project["name"] = value(kebab_case(name));
    }
    if let Some(description) = &options.description {
        project["description"] = value(description.as_str());
    }
    project["readme"] = value(README_MD);
    project["requires-python"] = value(format!(">= {}", options.python_version));
    if !project.contains_key("version") {
        project["version"] = value("0.1.0");
    }

    let groups = get_set_table(doc.as_table_mut(), "dependency-groups")?;
    let dev = get_set_array(groups, "dev")?;
    for dependency in DEV_DEPENDENCIES {
        ensure_contains_partial_str(dev, dependency);
    }

    if let Some(name) = &options.package_name_internal {
        let backend = get_set_table(tool_uv(doc)?, "build-backend")?;
        backend["module-name"] = value(snake_case(name));
        backend["module-root"] = value("src");
    }
    for index in &options.indexes {
        let entries = get_set_aot(tool_uv(doc)?, "index")?;
        let entry = ensure_aot_entry(entries, "name", &index.name)?;
        entry["explicit"] = value(true);
        entry["url"] = value(index.url.as_str());
    }
    Ok(())
}

pub fn run(path: &Path, options: &PyprojectOptions) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_toml(path, &mut modifications, |doc| apply(doc, options))?;
    Ok(modifications.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PYTHON_VERSION;
    use std::fs;
    use tempfile::TempDir;

    fn options() -> PyprojectOptions {
        PyprojectOptions {
            python_version: DEFAULT_PYTHON_VERSION.to_string(),
            ..PyprojectOptions::default()
        }
    }

    #[test]
    fn test_case_conversion() {
        assert_eq!(kebab_case("my_package"), "my-package");
        assert_eq!(kebab_case("MyPackage"), "my-package");
        assert_eq!(snake_case("my-package"), "my_package");
        assert_eq!(snake_case("py3Utils"), "py3_utils");
    }

    #[test]
    fn test_run_creates_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyproject.toml");
        for i in 0..2 {
            assert_eq!(run(&path, &options()).unwrap(), i >= 1);
        }
        let doc: toml::Table = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["build-system"]["build-backend"].as_str(), Some("uv_build"));
        assert_eq!(doc["project"]["requires-python"].as_str(), Some(">= 3.12"));
        assert_eq!(doc["project"]["version"].as_str(), Some("0.1.0"));
        assert_eq!(doc["project"]["readme"].as_str(), Some("README.md"));
        let dev: Vec<&str> = doc["dependency-groups"]["dev"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(dev, DEV_DEPENDENCIES);
    }

    #[test]
    fn test_run_keeps_existing_version_and_pins() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyproject.toml");
        fs::write(
            &path,
            "[project]\nversion = \"1.2.3\"\n\n[dependency-groups]\ndev = [\"pyright>=1.1\"]\n",
        )
        .unwrap();
        assert!(!run(&path, &options()).unwrap());
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("version = \"1.2.3\""));
        assert!(text.contains("\"pyright>=1.1\""));
        assert_eq!(text.matches("pyright").count(), 1);
    }

    #[test]
    fn test_run_names_and_indexes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyproject.toml");
        let opts = PyprojectOptions {
            description: Some("A package".into()),
            package_name_external: Some("my_package".into()),
            package_name_internal: Some("my-package".into()),
            indexes: vec!["internal=https://pypi.example.com/simple".parse().unwrap()],
            ..options()
        };
        assert!(!run(&path, &opts).unwrap());
        assert!(run(&path, &opts).unwrap());

        let doc: toml::Table = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["project"]["name"].as_str(), Some("my-package"));
        assert_eq!(doc["project"]["description"].as_str(), Some("A package"));
        let uv = &doc["tool"]["uv"];
        assert_eq!(uv["build-backend"]["module-name"].as_str(), Some("my_package"));
        assert_eq!(uv["build-backend"]["module-root"].as_str(), Some("src"));
        let index = &uv["index"].as_array().unwrap()[0];
        assert_eq!(index["name"].as_str(), Some("internal"));
        assert_eq!(index["explicit"].as_bool(), Some(true));
        assert_eq!(index["url"].as_str(), Some("https://pypi.example.com/simple"));
    }
}
