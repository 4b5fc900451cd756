//! PEP 508-style requirement strings and the dependency arrays of
//! `pyproject.toml`.

use crate::document::toml::{array_strs, set_array_strs};
use crate::error::{Error, Result};
use crate::version::{update_bounds, UpperBound, Version2Or3, VersionSet};
use std::fmt;
use std::str::FromStr;
use toml_edit::{Array, DocumentMut, Item};

/// Specifier operators, in the order they are written
pub const OPERATORS: [&str; 8] = ["===", "==", "~=", ">=", ">", "!=", "<=", "<"];

/// Operators tried longest first when parsing
const PARSE_ORDER: [&str; 8] = ["===", "==", "~=", ">=", "<=", "!=", ">", "<"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub operator: &'static str,
    pub version: String,
}

impl Specifier {
    fn rank(&self) -> usize {
        OPERATORS
            .iter()
            .position(|op| *op == self.operator)
            .unwrap_or(OPERATORS.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub extras: Vec<String>,
    pub specifiers: Vec<Specifier>,
    pub url: Option<String>,
    pub marker: Option<String>,
}

impl Requirement {
    /// Version text of the specifier using `operator`
    pub fn get(&self, operator: &str) -> Option<&str> {
        self.specifiers
            .iter()
            .find(|s| s.operator == operator)
            .map(|s| s.version.as_str())
    }

    /// Set, replace or (with `None`) remove the specifier using `operator`
    pub fn replace(mut self, operator: &str, version: Option<String>) -> Result<Self> {
        let operator = PARSE_ORDER
            .iter()
            .copied()
            .find(|op| *op == operator)
            .ok_or_else(|| Error::Requirement(format!("{}{operator}", self.name)))?;
        self.specifiers.retain(|s| s.operator != operator);
        if let Some(version) = version {
            self.specifiers.push(Specifier { operator, version });
        }
        self.specifiers.sort_by_key(Specifier::rank);
        Ok(self)
    }
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Requirement(s.to_string());

        let (body, marker) = match s.split_once(';') {
            Some((body, marker)) => (body, Some(marker.trim().to_string())),
            None => (s, None),
        };
        let body = body.trim();

        let name_len = body
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(body.len());
        let name = &body[..name_len];
        if name.is_empty() {
            return Err(invalid());
        }
        let mut rest = body[name_len..].trim_start();

        let mut extras = Vec::new();
        if let Some(after) = rest.strip_prefix('[') {
            let (inner, tail) = after.split_once(']').ok_or_else(invalid)?;
            extras = inner
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
            extras.sort();
            rest = tail.trim_start();
        }

        if let Some(url) = rest.strip_prefix('@') {
            let url = url.trim();
            if url.is_empty() {
                return Err(invalid());
            }
            return Ok(Self {
                name: name.to_string(),
                extras,
                specifiers: Vec::new(),
                url: Some(url.to_string()),
                marker,
            });
        }

        let rest = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(rest);
        let mut specifiers = Vec::new();
        for part in rest.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let operator = PARSE_ORDER
                .iter()
                .copied()
                .find(|op| part.starts_with(op))
                .ok_or_else(invalid)?;
            let version: String = part[operator.len()..]
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if version.is_empty() {
                return Err(invalid());
            }
            specifiers.push(Specifier { operator, version });
        }
        specifiers.sort_by_key(Specifier::rank);

        Ok(Self {
            name: name.to_string(),
            extras,
            specifiers,
            url: None,
            marker,
        })
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(url) = &self.url {
            write!(f, " @ {url}")?;
        } else {
            let specs: Vec<String> = self
                .specifiers
                .iter()
                .map(|s| format!("{}{}", s.operator, s.version))
                .collect();
            f.write_str(&specs.join(", "))?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

/// Raise the requirement's `>=` and `<` bounds to admit the latest version
/// in `versions`
pub fn update_requirement(requirement: Requirement, versions: &VersionSet) -> Result<Requirement> {
    let lower = requirement.get(">=").map(str::parse::<Version2Or3>).transpose()?;
    let upper = requirement.get("<").map(str::parse::<UpperBound>).transpose()?;
    let fixed = requirement.get("==").map(str::parse::<Version2Or3>).transpose()?;
    let latest = versions.get(&requirement.name);

    let (new_lower, new_upper) = update_bounds(lower, upper, fixed, latest);
    let mut requirement = requirement;
    if new_lower != lower {
        requirement = requirement.replace(">=", new_lower.map(|v| v.to_string()))?;
    }
    if new_upper != upper {
        requirement = requirement.replace("<", new_upper.map(|v| v.to_string()))?;
    }
    Ok(requirement)
}

/// Pin a requirement to exactly `latest`, dropping its range bounds
pub fn pin_requirement(requirement: Requirement, latest: Version2Or3) -> Result<Requirement> {
    requirement
        .replace(">=", None)?
        .replace("<", None)?
        .replace("==", Some(latest.to_string()))
}

/// Apply `f` to every dependency array of a pyproject document:
/// `project.dependencies`, each `project.optional-dependencies.*` and each
/// `dependency-groups.*`. Arrays or tables that are absent are skipped.
pub fn for_each_dependency_array(
    doc: &mut DocumentMut,
    mut f: impl FnMut(&str, &mut Array) -> Result<()>,
) -> Result<()> {
    if let Some(project) = doc.get_mut("project").and_then(Item::as_table_mut) {
        if let Some(deps) = project.get_mut("dependencies").and_then(Item::as_array_mut) {
            f("dependencies", deps)?;
        }
        if let Some(optional) = project
            .get_mut("optional-dependencies")
            .and_then(Item::as_table_mut)
        {
            for (key, item) in optional.iter_mut() {
                if let Some(array) = item.as_array_mut() {
                    f(key.get(), array)?;
                }
            }
        }
    }
    if let Some(groups) = doc.get_mut("dependency-groups").and_then(Item::as_table_mut) {
        for (key, item) in groups.iter_mut() {
            if let Some(array) = item.as_array_mut() {
                f(key.get(), array)?;
            }
        }
    }
    Ok(())
}

/// Rewrite each requirement of each dependency array with `f`
pub fn map_requirements(
    doc: &mut DocumentMut,
    mut f: impl FnMut(Requirement) -> Result<Requirement>,
) -> Result<()> {
    for_each_dependency_array(doc, |key, array| {
        let mut out = Vec::new();
        for text in array_strs(array, key)? {
            out.push(f(text.parse()?)?.to_string());
        }
        if out != array_strs(array, key)? {
            set_array_strs(array, &out);
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(s: &str) -> String {
        s.parse::<Requirement>().unwrap().to_string()
    }

    #[test]
    fn test_format() {
        assert_eq!(fmt("package"), "package");
        assert_eq!(fmt("package  >=  1.2.3"), "package>=1.2.3");
        assert_eq!(fmt("package<1.3,>=1.2.3"), "package>=1.2.3, <1.3");
        assert_eq!(fmt("package[b, a]>=1"), "package[a,b]>=1");
        assert_eq!(
            fmt("package>=1;python_version<'3.12'"),
            "package>=1; python_version<'3.12'"
        );
        assert_eq!(
            fmt("package @ https://example.com/p.whl"),
            "package @ https://example.com/p.whl"
        );
        assert_eq!(fmt("package (>=1.0, !=1.1)"), "package>=1.0, !=1.1");
    }

    #[test]
    fn test_invalid() {
        assert!(">=1".parse::<Requirement>().is_err());
        assert!("package>=".parse::<Requirement>().is_err());
        assert!("package^1".parse::<Requirement>().is_err());
        assert!("package[a".parse::<Requirement>().is_err());
    }

    #[test]
    fn test_get_and_replace() {
        let req: Requirement = "package>=1.2, <2".parse().unwrap();
        assert_eq!(req.get(">="), Some("1.2"));
        assert_eq!(req.get("=="), None);
        let req = req.replace("<", Some("3".into())).unwrap();
        assert_eq!(req.to_string(), "package>=1.2, <3");
        let req = req.replace(">=", None).unwrap();
        assert_eq!(req.to_string(), "package<3");
    }

    #[test]
    fn test_update_requirement() {
        let mut versions = VersionSet::new();
        versions.insert("package", "1.2.4");
        let cases = [
            ("package>=1.2.3, <1.3", "package>=1.2.4, <1.3"),
            ("package[extra]>=1.2.3, <1.3", "package[extra]>=1.2.4, <1.3"),
            ("package==1.0.0", "package==1.0.0"),
            ("other>=1.0", "other>=1.0"),
        ];
        for (input, expected) in cases {
            let req = update_requirement(input.parse().unwrap(), &versions).unwrap();
            assert_eq!(req.to_string(), expected);
        }
    }

    #[test]
    fn test_update_requirement_unparseable_bound() {
        let mut versions = VersionSet::new();
        versions.insert("package", "1.2.4");
        let req: Requirement = "package>=1.2b1".parse().unwrap();
        assert!(update_requirement(req, &versions).is_err());
    }

    #[test]
    fn test_pin_requirement() {
        let req: Requirement = "click>=8.1, <9".parse().unwrap();
        let pinned = pin_requirement(req, "8.1.7".parse().unwrap()).unwrap();
        assert_eq!(pinned.to_string(), "click==8.1.7");
    }

    #[test]
    fn test_map_requirements_visits_all_arrays() {
        let mut doc: DocumentMut = concat!(
            "[project]\n",
            "dependencies = [\"a >= 1\"]\n",
            "[project.optional-dependencies]\n",
            "cli = [\"b >= 2\"]\n",
            "[dependency-groups]\n",
            "dev = [\"c >= 3\"]\n",
        )
        .parse()
        .unwrap();
        map_requirements(&mut doc, Ok).unwrap();
        assert_eq!(
            doc.to_string(),
            concat!(
                "[project]\n",
                "dependencies = [\"a>=1\"]\n",
                "[project.optional-dependencies]\n",
                "cli = [\"b>=2\"]\n",
                "[dependency-groups]\n",
                "dev = [\"c>=3\"]\n",
            )
        );
    }
}
