use super::{BUMPVERSION_TOML, GITATTRIBUTES, GITIGNORE};
use crate::document::text::{edit_text, ensure_block, ensure_line};
use crate::document::Modifications;
use crate::error::Result;
use std::path::Path;

const GITIGNORE_TEMPLATE: &str = include_str!("../../configs/gitignore");

/// Mark `.bumpversion.toml` as generated and ensure the ignore template,
/// both in `dir`
pub fn setup(dir: &Path) -> Result<bool> {
    let mut modifications = Modifications::new();
    edit_text(&dir.join(GITATTRIBUTES), &mut modifications, |text| {
        ensure_line(text, &format!("{BUMPVERSION_TOML} linguist-generated=true"));
        Ok(())
    })?;
    edit_text(&dir.join(GITIGNORE), &mut modifications, |text| {
        ensure_block(text, GITIGNORE_TEMPLATE);
        Ok(())
    })?;
    Ok(modifications.is_empty())
}
