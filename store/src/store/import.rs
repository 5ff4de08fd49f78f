//! Asset names recovered from pak `.contents.txt` listings.
//!
//! Listing lines look like
//!
//! ```text
//! 0x1A2B3C4D  C:\build\MetroidCWP\x_rep\Characters\Samus\samus.cmdl
//! ```
//!
//! Lines without an id or for ids the store doesn't track are skipped.

use std::collections::BTreeMap;
use std::path::Path;

use relic_core::AssetId;
use relic_vfs::path;

use super::ResourceStore;
use crate::error::StoreResult;

/// Parse one listing line into an id and a project-relative path.
fn parse_line(line: &str) -> Option<(AssetId, String)> {
    let start = line.find("0x")? + 2;
    let rest = &line[start..];
    let id_end = rest.find([' ', '\t']).unwrap_or(rest.len());
    let id = AssetId::from_hex(&rest[..id_end])?;
    let full_path = rest[id_end..].trim();
    if full_path.is_empty() {
        return None;
    }

    // Keep what follows the "x_rep" build folder. Without one, drop a
    // drive prefix; a bare name is used as-is.
    let relative = match full_path.find("_rep") {
        Some(rep) => full_path.get(rep + 5..).unwrap_or_default(),
        None if full_path.as_bytes().get(1) == Some(&b':') => {
            full_path.get(3..).unwrap_or_default()
        }
        None => full_path,
    };
    Some((id, relative.to_owned()))
}

impl ResourceStore {
    /// Rename and relocate entries from a `.contents.txt` listing, then
    /// save the store. With `unnamed_only`, entries that already have a
    /// real name are left alone. Returns how many entries were moved.
    pub fn import_names_from_contents_txt(
        &mut self,
        txt_path: &Path,
        unnamed_only: bool,
    ) -> StoreResult<usize> {
        let text = std::fs::read_to_string(txt_path).map_err(|e| {
            log::error!("Failed to open .contents.txt file {}: {e}", txt_path.display());
            e
        })?;

        // Collect first, move after: listings repeat entries.
        let id_length = self.game.id_length();
        let mut paths = BTreeMap::new();
        for line in text.lines() {
            let Some((id, rel_path)) = parse_line(line) else {
                continue;
            };
            let id = AssetId::new(id.value(), id_length);
            if self.entries.contains_key(&id) {
                paths.insert(id, rel_path);
            }
        }

        let mut moved = 0;
        for (id, rel_path) in paths {
            let Some(entry) = self.entries.get(&id) else {
                continue;
            };
            if unnamed_only && entry.is_named() {
                continue;
            }
            let name = path::file_stem(&rel_path).to_owned();
            let mut dir = path::parent(&rel_path).to_owned();
            if dir.is_empty() {
                dir = self.directory_path(id).unwrap_or_default();
            }
            if self.move_entry(id, &dir, &name) {
                moved += 1;
            }
        }

        log::info!("Imported {moved} names from {}", txt_path.display());
        self.conditional_save_store()?;
        Ok(moved)
    }
}
