use crate::document::toml::{array_strs, edit_toml, get_table, set_array_strs};
use crate::document::Modifications;
use crate::error::Result;
use std::path::Path;

/// Sort the `[pytest]` keys and each of its string arrays. A missing file
/// passes.
pub fn run(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    let mut modifications = Modifications::new();
    edit_toml(path, &mut modifications, |doc| {
        let pytest = get_table(doc.as_table_mut(), "pytest")?;
        pytest.sort_values();
        for (key, item) in pytest.iter_mut() {
            let Some(array) = item.as_array_mut() else {
                continue;
            };
            let mut items = array_strs(array, key.get())?;
            items.sort();
            set_array_strs(array, &items);
        }
        Ok(())
    })?;
    Ok(modifications.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_run_sorts_keys_and_arrays() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pytest.toml");
        fs::write(
            &path,
            concat!(
                "[pytest]\n",
                "  d = [\n",
                "    \"--arg2\",\n",
                "    \"--arg1\",\n",
                "  ]\n",
                "  c = \"c\"\n",
                "  b = [\n",
                "    \"--arg2\",\n",
                "    \"--arg1\",\n",
                "  ]\n",
                "  a = \"a\"\n",
            ),
        )
        .unwrap();
        let expected = concat!(
            "[pytest]\n",
            "  a = \"a\"\n",
            "  b = [\"--arg1\", \"--arg2\"]\n",
            "  c = \"c\"\n",
            "  d = [\"--arg1\", \"--arg2\"]\n",
        );
        for i in 0..2 {
            assert_eq!(run(&path).unwrap(), i >= 1);
            assert_eq!(fs::read_to_string(&path).unwrap(), expected);
        }
    }

    #[test]
    fn test_missing_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pytest.toml");
        fs::write(&path, "[tool]\n").unwrap();
        assert!(matches!(run(&path), Err(Error::MissingKey { .. })));
        assert!(run(&temp.path().join("absent.toml")).unwrap());
    }
}
