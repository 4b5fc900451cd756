use super::{edit, Format, Modifications};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::path::Path;

pub struct Json;

impl Format for Json {
    const NAME: &'static str = "json";
    type Doc = Value;

    fn parse(text: &str) -> std::result::Result<Value, String> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    fn empty() -> Value {
        Value::Object(Map::new())
    }

    fn render(doc: &Value) -> Result<String> {
        serde_json::to_string_pretty(doc).map_err(|e| Error::Serialize {
            format: Self::NAME,
            message: e.to_string(),
        })
    }

    fn canonical(doc: &Value) -> Result<String> {
        serde_json::to_string(doc).map_err(|e| Error::Serialize {
            format: Self::NAME,
            message: e.to_string(),
        })
    }
}

/// Edit a JSON file whose root is an object
pub fn edit_json_object<R>(
    path: &Path,
    modifications: &mut Modifications,
    f: impl FnOnce(&mut Map<String, Value>) -> Result<R>,
) -> Result<R> {
    edit::<Json, R>(path, modifications, |value| {
        let object = value
            .as_object_mut()
            .ok_or_else(|| Error::wrong_type("<root>", "an object"))?;
        f(object)
    })
}

pub fn get_set_object<'a>(
    object: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Map<String, Value>> {
    object
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| Error::wrong_type(key, "an object"))
}

pub fn get_set_array_strs<'a>(
    object: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Vec<Value>> {
    let array = object
        .entry(key)
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| Error::wrong_type(key, "an array"))?;
    if array.iter().all(Value::is_string) {
        Ok(array)
    } else {
        Err(Error::wrong_type(key, "an array of strings"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ensure_contains;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_created_pretty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyrightconfig.json");
        let mut modifications = Modifications::new();

        edit_json_object(&path, &mut modifications, |obj| {
            obj.insert("typeCheckingMode".into(), "strict".into());
            let include = get_set_array_strs(obj, "include")?;
            ensure_contains(include, [Value::from("src")]);
            Ok(())
        })
        .unwrap();

        assert!(!modifications.is_empty());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\n  \"typeCheckingMode\": \"strict\",\n  \"include\": [\n    \"src\"\n  ]\n}\n"
        );
    }

    #[test]
    fn test_compact_input_same_content_is_unchanged() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"a": 1, "b": {"c": true}}"#).unwrap();
        let mut modifications = Modifications::new();

        edit_json_object(&path, &mut modifications, |obj| {
            obj.insert("a".into(), 1.into());
            get_set_object(obj, "b")?.insert("c".into(), true.into());
            Ok(())
        })
        .unwrap();

        assert!(modifications.is_empty());
    }

    #[test]
    fn test_wrong_type() {
        let mut obj = Map::new();
        obj.insert("include".into(), Value::from(1));
        assert!(get_set_array_strs(&mut obj, "include").is_err());
        assert!(get_set_object(&mut obj, "include").is_err());
        obj.insert("exclude".into(), serde_json::json!(["a", 1]));
        assert!(get_set_array_strs(&mut obj, "exclude").is_err());
    }
}
