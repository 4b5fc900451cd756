use super::{edit, Format, Modifications};
use crate::error::{Error, Result};
use std::path::Path;
use toml_edit::{Array, ArrayOfTables, DocumentMut, Item, Table, Value};

/// TOML edited in place so untouched formatting and comments survive
pub struct Toml;

impl Format for Toml {
    const NAME: &'static str = "toml";
    type Doc = DocumentMut;

    fn parse(text: &str) -> std::result::Result<DocumentMut, String> {
        text.parse::<DocumentMut>().map_err(|e| e.to_string())
    }

    fn empty() -> DocumentMut {
        DocumentMut::new()
    }

    fn render(doc: &DocumentMut) -> Result<String> {
        Ok(doc.to_string())
    }

    fn canonical(doc: &DocumentMut) -> Result<String> {
        let serialize_err = |message: String| Error::Serialize {
            format: Self::NAME,
            message,
        };
        let table: ::toml::Table =
            ::toml::from_str(&doc.to_string()).map_err(|e| serialize_err(e.to_string()))?;
        serde_json::to_string(&table).map_err(|e| serialize_err(e.to_string()))
    }
}

pub fn edit_toml<R>(
    path: &Path,
    modifications: &mut Modifications,
    f: impl FnOnce(&mut DocumentMut) -> Result<R>,
) -> Result<R> {
    edit::<Toml, R>(path, modifications, f)
}

/// Read the string at `keys` from TOML text
pub fn read_str(source: &Path, text: &str, keys: &[&str]) -> Result<String> {
    let doc = Toml::parse(text).map_err(|message| Error::Parse {
        path: source.to_path_buf(),
        message,
    })?;
    let mut item = doc.as_item();
    for key in keys {
        item = item.get(key).ok_or_else(|| Error::missing(*key))?;
    }
    let last = keys.last().copied().unwrap_or("<root>");
    item.as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::wrong_type(last, "a string"))
}

pub fn get_table<'a>(table: &'a mut Table, key: &str) -> Result<&'a mut Table> {
    table
        .get_mut(key)
        .ok_or_else(|| Error::missing(key))?
        .as_table_mut()
        .ok_or_else(|| Error::wrong_type(key, "a table"))
}

/// Table under `key`, created as an implicit table when absent
pub fn get_set_table<'a>(table: &'a mut Table, key: &str) -> Result<&'a mut Table> {
    table
        .entry(key)
        .or_insert_with(|| {
            let mut new = Table::new();
            new.set_implicit(true);
            Item::Table(new)
        })
        .as_table_mut()
        .ok_or_else(|| Error::wrong_type(key, "a table"))
}

pub fn get_array<'a>(table: &'a mut Table, key: &str) -> Result<&'a mut Array> {
    table
        .get_mut(key)
        .ok_or_else(|| Error::missing(key))?
        .as_array_mut()
        .ok_or_else(|| Error::wrong_type(key, "an array"))
}

pub fn get_set_array<'a>(table: &'a mut Table, key: &str) -> Result<&'a mut Array> {
    table
        .entry(key)
        .or_insert_with(|| Item::Value(Value::Array(Array::new())))
        .as_array_mut()
        .ok_or_else(|| Error::wrong_type(key, "an array"))
}

pub fn get_set_aot<'a>(table: &'a mut Table, key: &str) -> Result<&'a mut ArrayOfTables> {
    table
        .entry(key)
        .or_insert_with(|| Item::ArrayOfTables(ArrayOfTables::new()))
        .as_array_of_tables_mut()
        .ok_or_else(|| Error::wrong_type(key, "an array of tables"))
}

/// Strings of an array; errors if any element is not a string
pub fn array_strs(array: &Array, key: &str) -> Result<Vec<String>> {
    array
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::wrong_type(key, "an array of strings"))
        })
        .collect()
}

/// Replace the contents of `array`, keeping its position decor and
/// rendering it inline as `["a", "b"]`
pub fn set_array_strs<S: AsRef<str>>(array: &mut Array, items: impl IntoIterator<Item = S>) {
    let decor = array.decor().clone();
    let mut new: Array = items.into_iter().map(|s| s.as_ref().to_string()).collect();
    new.fmt();
    *new.decor_mut() = decor;
    *array = new;
}

/// Table in `aot` whose `key` equals `value`; appended when absent
pub fn ensure_aot_entry<'a>(
    aot: &'a mut ArrayOfTables,
    key: &str,
    value: &str,
) -> Result<&'a mut Table> {
    let position = aot
        .iter()
        .position(|t| t.get(key).and_then(Item::as_str) == Some(value));
    let index = match position {
        Some(index) => index,
        None => {
            let mut table = Table::new();
            table.insert(key, toml_edit::value(value));
            aot.push(table);
            aot.len() - 1
        }
    };
    aot.get_mut(index)
        .ok_or_else(|| Error::wrong_type(format!("{key}[{index}]"), "a table"))
}

/// Append each string of `items` not already in `array`
pub fn ensure_contains_strs<S: AsRef<str>>(array: &mut Array, items: impl IntoIterator<Item = S>) {
    for item in items {
        let item = item.as_ref();
        if !array.iter().any(|v| v.as_str() == Some(item)) {
            array.push(item);
        }
    }
}

/// First string in `array` containing `text`; appends `text` when none does
pub fn ensure_contains_partial_str(array: &mut Array, text: &str) -> String {
    if let Some(found) = array
        .iter()
        .filter_map(Value::as_str)
        .find(|s| s.contains(text))
    {
        return found.to_string();
    }
    array.push(text);
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_implicit_tables() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyproject.toml");
        let mut modifications = Modifications::new();

        edit_toml(&path, &mut modifications, |doc| {
            let backend = get_set_table(get_set_table(doc, "tool")?, "uv")?;
            backend.insert("package", toml_edit::value(true));
            Ok(())
        })
        .unwrap();

        assert!(!modifications.is_empty());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[tool.uv]\npackage = true\n"
        );
    }

    #[test]
    fn test_comments_and_whitespace_only_changes_are_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pyproject.toml");
        let original = "# top\n[project]\n  name   =   \"pkg\"  # trailing\n";
        fs::write(&path, original).unwrap();
        let mut modifications = Modifications::new();

        edit_toml(&path, &mut modifications, |doc| {
            get_set_table(doc, "project")?.insert("name", toml_edit::value("pkg"));
            Ok(())
        })
        .unwrap();

        assert!(modifications.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_set_array_strs_keeps_key_layout() {
        let mut doc: DocumentMut = "[project]\n  dependencies = [\"b\",\"a\"]\n"
            .parse()
            .unwrap();
        let array = get_array(get_table(&mut doc, "project").unwrap(), "dependencies").unwrap();
        let mut items = array_strs(array, "dependencies").unwrap();
        items.sort();
        set_array_strs(array, &items);
        assert_eq!(
            doc.to_string(),
            "[project]\n  dependencies = [\"a\", \"b\"]\n"
        );
    }

    #[test]
    fn test_array_strs_rejects_non_strings() {
        let mut doc: DocumentMut = "a = [1]\n".parse().unwrap();
        let array = get_array(&mut doc, "a").unwrap();
        assert!(array_strs(array, "a").is_err());
    }

    #[test]
    fn test_ensure_aot_entry() {
        let mut doc: DocumentMut = "[[files]]\nfilename = \"a\"\n".parse().unwrap();
        let aot = get_set_aot(&mut doc, "files").unwrap();
        ensure_aot_entry(aot, "filename", "a").unwrap();
        let added = ensure_aot_entry(aot, "filename", "b").unwrap();
        added.insert("search", toml_edit::value("x"));
        assert_eq!(aot.len(), 2);
    }

    #[test]
    fn test_get_set_wrong_type() {
        let mut doc: DocumentMut = "project = 1\n".parse().unwrap();
        assert!(matches!(
            get_set_table(&mut doc, "project").unwrap_err(),
            Error::WrongType { .. }
        ));
        assert!(matches!(
            get_table(&mut doc, "tool").unwrap_err(),
            Error::MissingKey { .. }
        ));
    }

    #[test]
    fn test_read_str() {
        let text = "[tool.bumpversion]\ncurrent_version = \"1.2.3\"\n";
        let path = Path::new(".bumpversion.toml");
        assert_eq!(
            read_str(path, text, &["tool", "bumpversion", "current_version"]).unwrap(),
            "1.2.3"
        );
        assert!(read_str(path, text, &["tool", "missing"]).is_err());
    }
}
