use super::{edit, Format, Modifications};
use crate::error::{Error, Result};
use serde_yaml::{Mapping, Sequence, Value};
use std::path::Path;

pub struct Yaml;

impl Format for Yaml {
    const NAME: &'static str = "yaml";
    type Doc = Value;

    fn parse(text: &str) -> std::result::Result<Value, String> {
        if text.trim().is_empty() {
            return Ok(Self::empty());
        }
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }

    fn empty() -> Value {
        Value::Mapping(Mapping::new())
    }

    fn render(doc: &Value) -> Result<String> {
        serde_yaml::to_string(doc).map_err(|e| Error::Serialize {
            format: Self::NAME,
            message: e.to_string(),
        })
    }

    /// serde_yaml drops comments, so only the file's leading comment block
    /// survives a rewrite.
    fn render_over(doc: &Value, previous: Option<&str>) -> Result<String> {
        let rendered = Self::render(doc)?;
        let header = previous.map(leading_comments).unwrap_or_default();
        if header.is_empty() {
            Ok(rendered)
        } else {
            Ok(format!("{header}\n{rendered}"))
        }
    }

    fn canonical(doc: &Value) -> Result<String> {
        Self::render(doc)
    }
}

/// Comment lines (and blank lines between them) before the first content line
fn leading_comments(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .take_while(|line| {
            let line = line.trim_start();
            line.is_empty() || line.starts_with('#')
        })
        .collect();
    lines.join("\n").trim().to_string()
}

pub fn edit_yaml<R>(
    path: &Path,
    modifications: &mut Modifications,
    f: impl FnOnce(&mut Value) -> Result<R>,
) -> Result<R> {
    edit::<Yaml, R>(path, modifications, f)
}

/// Edit a YAML file whose root is a mapping
pub fn edit_yaml_mapping<R>(
    path: &Path,
    modifications: &mut Modifications,
    f: impl FnOnce(&mut Mapping) -> Result<R>,
) -> Result<R> {
    edit_yaml(path, modifications, |value| {
        if value.is_null() {
            *value = Value::Mapping(Mapping::new());
        }
        let mapping = value
            .as_mapping_mut()
            .ok_or_else(|| Error::wrong_type("<root>", "a mapping"))?;
        f(mapping)
    })
}

/// Existing value for `key`, treating an explicit null as absent
fn slot<'a>(mapping: &'a mut Mapping, key: &str, default: Value) -> &'a mut Value {
    let value = mapping
        .entry(Value::from(key))
        .or_insert_with(|| default.clone());
    if value.is_null() {
        *value = default;
    }
    value
}

pub fn get_mapping<'a>(mapping: &'a mut Mapping, key: &str) -> Result<&'a mut Mapping> {
    mapping
        .get_mut(key)
        .ok_or_else(|| Error::missing(key))?
        .as_mapping_mut()
        .ok_or_else(|| Error::wrong_type(key, "a mapping"))
}

pub fn get_set_mapping<'a>(mapping: &'a mut Mapping, key: &str) -> Result<&'a mut Mapping> {
    slot(mapping, key, Value::Mapping(Mapping::new()))
        .as_mapping_mut()
        .ok_or_else(|| Error::wrong_type(key, "a mapping"))
}

/// Sequence under `key` whose items are all mappings
pub fn get_seq_mappings<'a>(mapping: &'a mut Mapping, key: &str) -> Result<&'a mut Sequence> {
    let seq = mapping
        .get_mut(key)
        .ok_or_else(|| Error::missing(key))?
        .as_sequence_mut()
        .ok_or_else(|| Error::wrong_type(key, "a sequence"))?;
    check_items(seq, key, Value::is_mapping, "a sequence of mappings")?;
    Ok(seq)
}

pub fn get_set_seq_mappings<'a>(mapping: &'a mut Mapping, key: &str) -> Result<&'a mut Sequence> {
    let seq = slot(mapping, key, Value::Sequence(Sequence::new()))
        .as_sequence_mut()
        .ok_or_else(|| Error::wrong_type(key, "a sequence"))?;
    check_items(seq, key, Value::is_mapping, "a sequence of mappings")?;
    Ok(seq)
}

pub fn get_set_seq_strs<'a>(mapping: &'a mut Mapping, key: &str) -> Result<&'a mut Sequence> {
    let seq = slot(mapping, key, Value::Sequence(Sequence::new()))
        .as_sequence_mut()
        .ok_or_else(|| Error::wrong_type(key, "a sequence"))?;
    check_items(seq, key, Value::is_string, "a sequence of strings")?;
    Ok(seq)
}

fn check_items(
    seq: &Sequence,
    key: &str,
    predicate: fn(&Value) -> bool,
    expected: &'static str,
) -> Result<()> {
    if seq.iter().all(predicate) {
        Ok(())
    } else {
        Err(Error::wrong_type(key, expected))
    }
}

/// Build a string-keyed mapping from pairs
pub fn mapping<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Mapping
where
    K: Into<Value>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

pub fn strs<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Value {
    Value::Sequence(
        items
            .into_iter()
            .map(|s| Value::from(s.as_ref()))
            .collect(),
    )
}

/// Whether every entry of `partial` is present in `candidate`, recursing
/// into nested mappings
pub fn is_partial_mapping(partial: &Mapping, candidate: &Value) -> bool {
    let Some(candidate) = candidate.as_mapping() else {
        return false;
    };
    partial.iter().all(|(key, expected)| match candidate.get(key) {
        Some(actual) => match (expected, actual) {
            (Value::Mapping(expected), Value::Mapping(_)) => is_partial_mapping(expected, actual),
            _ => expected == actual,
        },
        None => false,
    })
}

/// First mapping in `seq` matching `partial`; appends `partial ∪ extra` when
/// none matches.
pub fn ensure_contains_partial_mapping<'a>(
    seq: &'a mut Sequence,
    partial: Mapping,
    extra: Mapping,
) -> Result<&'a mut Mapping> {
    let index = match seq.iter().position(|v| is_partial_mapping(&partial, v)) {
        Some(index) => index,
        None => {
            let mut new = partial;
            for (k, v) in extra {
                new.entry(k).or_insert(v);
            }
            seq.push(Value::Mapping(new));
            seq.len() - 1
        }
    };
    seq[index]
        .as_mapping_mut()
        .ok_or_else(|| Error::wrong_type(format!("[{index}]"), "a mapping"))
}

/// First string in `seq` containing `text`; appends `text` when none does
pub fn ensure_contains_partial_str(seq: &mut Sequence, text: &str) -> String {
    if let Some(found) = seq
        .iter()
        .filter_map(Value::as_str)
        .find(|s| s.contains(text))
    {
        return found.to_string();
    }
    seq.push(Value::from(text));
    text.to_string()
}

/// Rebuild `mapping` with `keys` first (in that order), then any other keys
/// in their existing order.
pub fn re_insert(mapping: &mut Mapping, keys: &[&str]) {
    let mut old = std::mem::take(mapping);
    for key in keys {
        if let Some(value) = old.shift_remove(*key) {
            mapping.insert(Value::from(*key), value);
        }
    }
    for (k, v) in old {
        mapping.insert(k, v);
    }
}
