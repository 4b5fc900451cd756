use crate::document::text::edit_text;
use crate::document::Modifications;
use crate::error::Result;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

pub const FUTURE_IMPORT: &str = "from __future__ import annotations";

#[allow(clippy::expect_used)]
fn sequence_str() -> &'static Regex {
    static RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(^|[^\w.])Sequence\[\s*str\s*\]").expect("Valid regex"));
    &RE
}

/// Byte offset after the shebang, leading comments and module docstring
fn preamble_end(source: &str) -> usize {
    let mut offset = 0;
    let mut lines = source.split_inclusive('\n').peekable();
    while let Some(line) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            offset += line.len();
            lines.next();
        } else {
            break;
        }
    }
    let Some(first) = lines.next() else {
        return offset;
    };
    let first_trimmed = first.trim_start();
    let Some(quote) = ["\"\"\"", "'''"]
        .into_iter()
        .find(|q| first_trimmed.starts_with(q))
    else {
        return offset;
    };
    offset += first.len();
    if first_trimmed[quote.len()..].contains(quote) {
        return offset;
    }
    for line in lines {
        offset += line.len();
        if line.contains(quote) {
            break;
        }
    }
    offset
}

fn has_future_import(source: &str) -> bool {
    source.lines().any(|l| l.trim() == FUTURE_IMPORT)
}

/// Insert the future import after the module preamble
pub fn add_future_import(source: &str) -> String {
    if has_future_import(source) {
        return source.to_string();
    }
    let at = preamble_end(source);
    let (head, tail) = source.split_at(at);
    let mut out = String::with_capacity(source.len() + FUTURE_IMPORT.len() + 2);
    out.push_str(head);
    if !head.is_empty() && !head.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(FUTURE_IMPORT);
    out.push('\n');
    if !tail.trim().is_empty() {
        out.push('\n');
    }
    out.push_str(tail);
    out
}

pub fn add_future_import_annotations(path: &Path) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_text(path, &mut modifications, |source| {
        *source = add_future_import(source);
        Ok(())
    })?;
    Ok(modifications.is_empty())
}

/// Byte ranges of `source` outside comments and string literals
fn code_spans(source: &str) -> Vec<(usize, usize)> {
    let bytes = source.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                spans.push((start, i));
                i = source[i..].find('\n').map_or(bytes.len(), |n| i + n);
                start = i;
            }
            quote @ (b'"' | b'\'') => {
                spans.push((start, i));
                i = string_end(bytes, i, quote);
                start = i;
            }
            _ => i += 1,
        }
    }
    spans.push((start, bytes.len()));
    spans
}

/// Offset just past the string literal opening at `open`. An unterminated
/// single-quoted string ends at the line break.
fn string_end(bytes: &[u8], open: usize, quote: u8) -> usize {
    let triple = bytes[open..].starts_with(&[quote; 3]);
    let width = if triple { 3 } else { 1 };
    let mut i = open + width;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' if !triple => return i,
            c if c == quote && (!triple || bytes[i..].starts_with(&[quote; 3])) => {
                return i + width;
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Annotate `Sequence[str]` as `list[str]`, leaving comments and string
/// literals alone
pub fn replace_sequence_str_in(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for (start, end) in code_spans(source) {
        out.push_str(&source[last..start]);
        out.push_str(&sequence_str().replace_all(&source[start..end], "${1}list[str]"));
        last = end;
    }
    out.push_str(&source[last..]);
    out
}

pub fn replace_sequence_str(path: &Path) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_text(path, &mut modifications, |source| {
        *source = replace_sequence_str_in(source);
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
    fn test_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.py");
        for i in 0..2 {
            assert_eq!(add_future_import_annotations(&path).unwrap(), i >= 1);
            assert_eq!(
                fs::read_to_string(&path).unwrap(),
                "from __future__ import annotations\n"
            );
        }
    }

    #[test]
    fn test_after_docstring() {
        let source = "#!/usr/bin/env python\n\"\"\"Module.\n\nMore.\n\"\"\"\nimport os\n";
        assert_eq!(
            add_future_import(source),
            "#!/usr/bin/env python\n\"\"\"Module.\n\nMore.\n\"\"\"\nfrom __future__ import annotations\n\nimport os\n"
        );
        let one_line = "\"\"\"Module.\"\"\"\nx = 1\n";
        assert_eq!(
            add_future_import(one_line),
            "\"\"\"Module.\"\"\"\nfrom __future__ import annotations\n\nx = 1\n"
        );
    }

    #[test]
    fn test_existing_import_kept() {
        let source = "from __future__ import annotations\n\nimport os\n";
        assert_eq!(add_future_import(source), source);
    }

    #[test]
    fn test_replace_sequence_str() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file.py");
        fs::write(
            &path,
            "from collections.abc import Sequence\n\nx: Sequence[str]\n",
        )
        .unwrap();
        for i in 0..2 {
            assert_eq!(replace_sequence_str(&path).unwrap(), i >= 1);
            assert_eq!(
                fs::read_to_string(&path).unwrap(),
                "from collections.abc import Sequence\n\nx: list[str]\n"
            );
        }
    }

    #[test]
    fn test_replace_sequence_str_leaves_others() {
        assert_eq!(replace_sequence_str_in("x: Sequence[int]"), "x: Sequence[int]");
        assert_eq!(replace_sequence_str_in("x: MySequence[str]"), "x: MySequence[str]");
        assert_eq!(
            replace_sequence_str_in("def f(a: Sequence[ str ]) -> Sequence[str]: ..."),
            "def f(a: list[str]) -> list[str]: ..."
        );
    }

    #[test]
    fn test_replace_sequence_str_skips_comments_and_strings() {
        let source = "\
x: Sequence[str] = []  # was Sequence[str]
y = \"Sequence[str]\"
z = 'it\\'s Sequence[str]'
\"\"\"
Sequence[str]
\"\"\"
def f(a: Sequence[str]) -> None: ...
";
        assert_eq!(
            replace_sequence_str_in(source),
            "\
x: list[str] = []  # was Sequence[str]
y = \"Sequence[str]\"
z = 'it\\'s Sequence[str]'
\"\"\"
Sequence[str]
\"\"\"
def f(a: list[str]) -> None: ...
"
        );
    }

    #[test]
    fn test_code_spans() {
        let source = "a # c\nb 'x' c";
        let code: Vec<&str> = code_spans(source)
            .into_iter()
            .map(|(start, end)| &source[start..end])
            .collect();
        assert_eq!(code, vec!["a ", "\nb ", " c"]);
    }
}
