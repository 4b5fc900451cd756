use crate::document::ensure_contains;
use crate::document::json::{edit_json_object, get_set_array_strs};
use crate::document::Modifications;
use crate::error::Result;
use serde_json::Value;
use std::path::Path;

const FLAGS: [(&str, bool); 22] = [
    ("deprecateTypingAliases", true),
    ("enableReachabilityAnalysis", false),
    ("reportCallInDefaultInitializer", true),
    ("reportImplicitOverride", true),
    ("reportImplicitStringConcatenation", true),
    ("reportImportCycles", true),
    ("reportMissingSuperCall", true),
    ("reportMissingTypeArgument", false),
    ("reportMissingTypeStubs", false),
    ("reportPrivateImportUsage", false),
    ("reportPrivateUsage", false),
    ("reportPropertyTypeMismatch", true),
    ("reportUninitializedInstanceVariable", true),
    ("reportUnknownArgumentType", false),
    ("reportUnknownMemberType", false),
    ("reportUnknownParameterType", false),
    ("reportUnknownVariableType", false),
    ("reportUnnecessaryComparison", false),
    ("reportUnnecessaryTypeIgnoreComment", true),
    ("reportUnusedCallResult", true),
    ("reportUnusedImport", false),
    ("reportUnusedVariable", false),
];

pub fn run(path: &Path, python_version: &str) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_json_object(path, &mut modifications, |config| {
        let include = get_set_array_strs(config, "include")?;
        ensure_contains(include, [Value::from("src")]);
        config.insert("pythonVersion".into(), python_version.into());
        for (key, flag) in FLAGS {
            config.insert(key.into(), flag.into());
        }
        config.insert("typeCheckingMode".into(), "strict".into());
        Ok(())
    })?;
    Ok(modifications.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_twice() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyrightconfig.json");
        for i in 0..2 {
            assert_eq!(run(&path, "3.13").unwrap(), i >= 1);
        }
        let config: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config["include"], serde_json::json!(["src"]));
        assert_eq!(config["pythonVersion"], "3.13");
        assert_eq!(config["typeCheckingMode"], "strict");
        assert_eq!(config["reportImportCycles"], true);
    }

    #[test]
    fn test_existing_include_kept() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyrightconfig.json");
        fs::write(&path, r#"{"include": ["tests", "src"], "exclude": ["build"]}"#).unwrap();
        assert!(!run(&path, "3.12").unwrap());
        let config: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config["include"], serde_json::json!(["tests", "src"]));
        assert_eq!(config["exclude"], serde_json::json!(["build"]));
    }
}
