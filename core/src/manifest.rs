//! Plant manifest: the display names and sprite paths a run draws its
//! archetypes from.
//!
//! File format: a header line `Plant Name,Sprite Path` followed by one
//! `name,sprite` row per plant. Blank lines are skipped. Fields may be
//! double-quoted; inside quotes `""` is a literal quote and commas are data.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name:   String,
    pub sprite: String,
}

impl ManifestEntry {
    pub fn new(name: impl Into<String>, sprite: impl Into<String>) -> Self {
        Self { name: name.into(), sprite: sprite.into() }
    }
}

const NAME_COLUMN: &str = "Plant Name";
const SPRITE_COLUMN: &str = "Sprite Path";

/// Read a manifest file from disk.
pub fn load_manifest(path: impl AsRef<Path>) -> SimResult<Vec<ManifestEntry>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read manifest {}: {e}", path.display()))?;
    let entries = parse_manifest(&content)?;
    log::info!("manifest: {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Parse manifest text. Column order is taken from the header.
pub fn parse_manifest(content: &str) -> SimResult<Vec<ManifestEntry>> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (_, header) = lines.next().ok_or(SimError::ManifestParse {
        line: 1,
        reason: "missing header".into(),
    })?;
    let header = split_row(header.trim_start_matches('\u{feff}'))
        .map_err(|reason| SimError::ManifestParse { line: 1, reason })?;
    let columns: Vec<&str> = header.iter().map(|c| c.trim()).collect();
    let name_idx = column_index(&columns, NAME_COLUMN)?;
    let sprite_idx = column_index(&columns, SPRITE_COLUMN)?;

    let mut entries = Vec::new();
    for (idx, line) in lines {
        let fields = split_row(line).map_err(|reason| SimError::ManifestParse { line: idx + 1, reason })?;
        if fields.len() != columns.len() {
            return Err(SimError::ManifestParse {
                line: idx + 1,
                reason: format!("expected {} columns, found {}", columns.len(), fields.len()),
            });
        }
        let name = fields[name_idx].trim();
        if name.is_empty() {
            return Err(SimError::ManifestParse { line: idx + 1, reason: "empty plant name".into() });
        }
        entries.push(ManifestEntry::new(name, normalize_sprite_path(fields[sprite_idx].trim())));
    }
    Ok(entries)
}

/// Split one row on commas, honouring double-quoted fields.
fn split_row(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ('"', false) => return Err("stray quote inside unquoted field".into()),
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".into());
    }
    fields.push(field);
    Ok(fields)
}

fn column_index(columns: &[&str], wanted: &str) -> SimResult<usize> {
    columns
        .iter()
        .position(|c| *c == wanted)
        .ok_or_else(|| SimError::ManifestParse {
            line: 1,
            reason: format!("header has no '{wanted}' column"),
        })
}

/// Sprite paths are relative to the asset root: drop leading separators
/// and use forward slashes.
pub fn normalize_sprite_path(raw: &str) -> String {
    raw.trim_start_matches(['/', '\\']).replace('\\', "/")
}

/// DEVELOPMENT ONLY: placeholder entries for runs without a manifest file.
/// Names are `plant0..plantN` so they are never mistaken for real content.
pub fn synthetic_manifest(count: usize) -> Vec<ManifestEntry> {
    log::warn!("manifest: using {count} synthetic placeholder entries");
    (0..count)
        .map(|i| ManifestEntry::new(format!("plant{i}"), format!("assets/plant{i}.png")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let text = "Plant Name,Sprite Path\nFern,/assets/fern.png\n\nCactus,\\assets\\cactus.png\n";
        let entries = parse_manifest(text).unwrap();
        assert_eq!(entries, vec![
            ManifestEntry::new("Fern", "assets/fern.png"),
            ManifestEntry::new("Cactus", "assets/cactus.png"),
        ]);
    }

    #[test]
    fn header_order_is_respected() {
        let text = "Sprite Path,Plant Name\nassets/moss.png,Moss\n";
        let entries = parse_manifest(text).unwrap();
        assert_eq!(entries[0].name, "Moss");
        assert_eq!(entries[0].sprite, "assets/moss.png");
    }

    #[test]
    fn short_row_reports_line_number() {
        let text = "Plant Name,Sprite Path\nFern,a.png\nBroken\n";
        match parse_manifest(text) {
            Err(SimError::ManifestParse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn quoted_fields_keep_their_commas() {
        let text = "Plant Name,Sprite Path\n\"Rose, Red\",assets/rose.png\n\"Say \"\"Hi\"\"\",\"/a.png\"\n";
        let entries = parse_manifest(text).unwrap();
        assert_eq!(entries, vec![
            ManifestEntry::new("Rose, Red", "assets/rose.png"),
            ManifestEntry::new("Say \"Hi\"", "a.png"),
        ]);
    }

    #[test]
    fn malformed_rows_are_rejected() {
        for row in ["Fern,a.png,extra", "\"Fern,a.png", "Fe\"rn,a.png"] {
            let text = format!("Plant Name,Sprite Path\n{row}\n");
            match parse_manifest(&text) {
                Err(SimError::ManifestParse { line, .. }) => assert_eq!(line, 2, "row {row}"),
                other => panic!("expected parse error for {row}, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_header_column_is_rejected() {
        assert!(parse_manifest("Name,Path\nFern,a.png\n").is_err());
    }
}
