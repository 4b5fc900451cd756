//! Change-tracked read-modify-write access to config files.
//!
//! Every hook goes through [`edit`]: the file is parsed (or an empty
//! document is used when it does not exist), the caller mutates it, and the
//! result is written back only when it differs from what was on disk.

pub mod json;
pub mod text;
pub mod toml;
pub mod yaml;

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Paths written during one hook invocation
#[derive(Debug, Default)]
pub struct Modifications(BTreeSet<PathBuf>);

impl Modifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>) {
        self.0.insert(path.into());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.iter()
    }
}

/// A file format the mutation context can work with
pub trait Format {
    const NAME: &'static str;
    type Doc;

    fn parse(text: &str) -> std::result::Result<Self::Doc, String>;

    /// Document used when the file does not exist
    fn empty() -> Self::Doc;

    fn render(doc: &Self::Doc) -> Result<String>;

    /// Render `doc` to replace `previous`, the text it was parsed from
    fn render_over(doc: &Self::Doc, _previous: Option<&str>) -> Result<String> {
        Self::render(doc)
    }

    /// Form used to decide whether two documents are equivalent.
    /// Key order is significant; layout is not.
    fn canonical(doc: &Self::Doc) -> Result<String>;
}

/// Read `path`, hand the parsed document to `f`, and write it back if `f`
/// changed it. A missing file is always written.
pub fn edit<F, R>(
    path: &Path,
    modifications: &mut Modifications,
    f: impl FnOnce(&mut F::Doc) -> Result<R>,
) -> Result<R>
where
    F: Format,
{
    let current = read_optional(path)?;
    let (mut doc, before) = match &current {
        Some(text) => {
            let doc = F::parse(text).map_err(|message| Error::Parse {
                path: path.to_path_buf(),
                message,
            })?;
            let before = F::canonical(&doc)?;
            (doc, Some(before))
        }
        None => (F::empty(), None),
    };

    let output = f(&mut doc)?;

    let changed = match before {
        Some(before) => F::canonical(&doc)? != before,
        None => true,
    };
    if changed {
        write_text(path, &F::render_over(&doc, current.as_deref())?, modifications)?;
    } else {
        tracing::debug!(path = %path.display(), format = F::NAME, "unchanged");
    }
    Ok(output)
}

/// Read a file, mapping "not found" to `None`
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomically replace `path` with `text` (one trailing newline) and record it.
pub fn write_text(path: &Path, text: &str, modifications: &mut Modifications) -> Result<()> {
    let write_err = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(write_err)?;

    let existed = path.exists();
    let permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let mut temp = NamedTempFile::new_in(&parent).map_err(write_err)?;
    temp.write_all(ensure_new_line(text).as_bytes())
        .map_err(write_err)?;
    match permissions {
        Some(perms) => temp.as_file().set_permissions(perms).map_err(write_err)?,
        None => set_default_permissions(temp.as_file()).map_err(write_err)?,
    }
    temp.persist(path).map_err(|e| write_err(e.error))?;

    if existed {
        tracing::info!(path = %path.display(), "updated");
    } else {
        tracing::info!(path = %path.display(), "created");
    }
    modifications.insert(path);
    Ok(())
}

#[cfg(unix)]
fn set_default_permissions(file: &fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &fs::File) -> std::io::Result<()> {
    Ok(())
}

/// Strip surrounding newlines and end with exactly one
pub fn ensure_new_line(text: &str) -> String {
    let mut out = text.trim_matches('\n').to_string();
    out.push('\n');
    out
}

/// Append each item not already present
pub fn ensure_contains<T: PartialEq>(container: &mut Vec<T>, items: impl IntoIterator<Item = T>) {
    for item in items {
        if !container.contains(&item) {
            container.push(item);
        }
    }
}

/// Remove the first occurrence of each item
pub fn ensure_not_contains<T: PartialEq>(container: &mut Vec<T>, items: &[T]) {
    for item in items {
        if let Some(index) = container.iter().position(|c| c == item) {
            container.remove(index);
        }
    }
}
