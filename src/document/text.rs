use super::{edit, ensure_new_line, Format, Modifications};
use crate::error::Result;
use std::path::Path;

/// Plain text; equivalence ignores surrounding newlines
pub struct Text;

impl Format for Text {
    const NAME: &'static str = "text";
    type Doc = String;

    fn parse(text: &str) -> std::result::Result<String, String> {
        Ok(text.to_string())
    }

    fn empty() -> String {
        String::new()
    }

    fn render(doc: &String) -> Result<String> {
        Ok(doc.clone())
    }

    fn canonical(doc: &String) -> Result<String> {
        Ok(ensure_new_line(doc))
    }
}

pub fn edit_text<R>(
    path: &Path,
    modifications: &mut Modifications,
    f: impl FnOnce(&mut String) -> Result<R>,
) -> Result<R> {
    edit::<Text, R>(path, modifications, f)
}

/// Append `block` separated by a blank line unless it is already present
pub fn ensure_block(text: &mut String, block: &str) {
    let block = block.trim_matches('\n');
    if text.contains(block) {
        return;
    }
    let trimmed = text.trim_end_matches('\n').len();
    text.truncate(trimmed);
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(block);
    text.push('\n');
}

/// Append `line` unless a line equal to it already exists
pub fn ensure_line(text: &mut String, line: &str) {
    if text.lines().any(|l| l == line) {
        return;
    }
    let trimmed = text.trim_end_matches('\n').len();
    text.truncate(trimmed);
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(line);
    text.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".envrc");
        let mut modifications = Modifications::new();

        edit_text(&path, &mut modifications, |text| {
            ensure_block(text, "echo hi");
            Ok(())
        })
        .unwrap();

        assert!(!modifications.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "echo hi\n");
    }

    #[test]
    fn test_trailing_newline_difference_is_not_a_change() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.txt");
        fs::write(&path, "a\n\n\n").unwrap();
        let mut modifications = Modifications::new();

        edit_text(&path, &mut modifications, |text| {
            *text = "a".to_string();
            Ok(())
        })
        .unwrap();

        assert!(modifications.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n\n\n");
    }

    #[test]
    fn test_ensure_block_is_idempotent() {
        let mut text = "first\n".to_string();
        ensure_block(&mut text, "second\nthird\n");
        ensure_block(&mut text, "second\nthird\n");
        assert_eq!(text, "first\n\nsecond\nthird\n");
    }

    #[test]
    fn test_ensure_line() {
        let mut text = "a\nb".to_string();
        ensure_line(&mut text, "b");
        assert_eq!(text, "a\nb");
        ensure_line(&mut text, "c");
        assert_eq!(text, "a\nb\nc\n");
    }
}
