//! Frame extraction: turns source images into packable frames, slicing grid sheets.
//!
//! A file is a sheet when its name reads `<stem><columns>x<rows>.<ext>`, e.g. `walk_4x2.png`.
//! The stem must be at least two characters long and must not end in a digit, and the
//! name may contain only one `.`. Each cell becomes one frame, in row-major order, named
//! `<stem><index>.<ext>` with the index zero-padded to the digit count of the last index.
//! Two sheets that map to the same animation key (`walk_2x1.png`, `walk-3x1.png`) are rejected.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SheetPackerError};
use crate::model::{Frame, SheetRef, SourceImage};

/// A file name recognised as a grid sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetName<'a> {
    /// Everything before the column count, separator included (`walk_`).
    pub stem: &'a str,
    pub columns: u32,
    pub rows: u32,
    /// Extension without the dot (`png`).
    pub extension: &'a str,
}

impl SheetName<'_> {
    /// Animation group key: the stem without a trailing `_`, `-` or space.
    pub fn animation(&self) -> &str {
        let trimmed = self.stem.trim_end_matches(['_', '-', ' ']);
        if trimmed.is_empty() { self.stem } else { trimmed }
    }

    /// Manifest key of the frame at raster `index`.
    pub fn frame_name(&self, index: u32) -> String {
        let width = pad_width(self.columns.saturating_mul(self.rows));
        format!(
            "{}{:0width$}.{}",
            self.stem,
            index,
            self.extension,
            width = width
        )
    }
}

/// Parses `file_name` against the sheet naming convention.
pub fn parse_sheet_name(file_name: &str) -> Option<SheetName<'_>> {
    let (head, extension) = file_name.split_once('.')?;
    if extension.is_empty() || extension.contains('.') {
        return None;
    }
    let (before_x, rows) = head.rsplit_once('x')?;
    if rows.is_empty() || !rows.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let stem = before_x.trim_end_matches(|c: char| c.is_ascii_digit());
    let columns = &before_x[stem.len()..];
    if columns.is_empty() || stem.chars().count() < 2 {
        return None;
    }
    Some(SheetName {
        stem,
        columns: columns.parse().ok()?,
        rows: rows.parse().ok()?,
        extension,
    })
}

/// Digits needed to print the largest index of a `count`-frame sheet.
pub fn pad_width(count: u32) -> usize {
    let max_index = count.saturating_sub(1);
    max_index.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Expands `sources` into frames. Plain images keep input order and their file name;
/// sheets expand in place into their cells.
pub fn extract_frames(sources: &[SourceImage]) -> Result<Vec<Frame>> {
    if sources.is_empty() {
        return Err(SheetPackerError::NoInput {
            location: "source list".into(),
        });
    }
    let mut frames = Vec::with_capacity(sources.len());
    for src in sources {
        let file_name = src.file_name();
        match parse_sheet_name(&file_name) {
            Some(sheet) => slice_sheet(src, &file_name, &sheet, &mut frames)?,
            None => frames.push(Frame {
                name: file_name,
                source: src.path.clone(),
                width: src.width,
                height: src.height,
                sheet: None,
            }),
        }
    }

    let mut seen = HashSet::with_capacity(frames.len());
    for f in &frames {
        if !seen.insert(f.name.as_str()) {
            return Err(SheetPackerError::DuplicateFrame {
                name: f.name.clone(),
            });
        }
    }

    // Each animation key belongs to exactly one sheet.
    let mut owners: HashMap<&str, &Path> = HashMap::new();
    for f in &frames {
        let Some(sheet) = &f.sheet else { continue };
        let owner = *owners.entry(sheet.animation.as_str()).or_insert(&f.source);
        if owner != f.source.as_path() {
            return Err(SheetPackerError::DuplicateAnimation {
                name: sheet.animation.clone(),
                first: owner.display().to_string(),
                second: f.source.display().to_string(),
            });
        }
    }
    Ok(frames)
}

fn slice_sheet(
    src: &SourceImage,
    file_name: &str,
    sheet: &SheetName<'_>,
    out: &mut Vec<Frame>,
) -> Result<()> {
    let (columns, rows) = (sheet.columns, sheet.rows);
    let uneven = columns == 0
        || rows == 0
        || src.width % columns != 0
        || src.height % rows != 0
        || src.width == 0
        || src.height == 0;
    if uneven {
        return Err(SheetPackerError::Geometry {
            file: file_name.to_string(),
            width: src.width,
            height: src.height,
            columns,
            rows,
        });
    }
    let (w, h) = (src.width / columns, src.height / rows);
    let animation = sheet.animation().to_string();
    debug!(file = file_name, columns, rows, w, h, %animation, "slicing sheet");
    for row in 0..rows {
        for column in 0..columns {
            let cell = SheetRef {
                column,
                row,
                columns,
                rows,
                animation: animation.clone(),
            };
            out.push(Frame {
                name: sheet.frame_name(cell.index()),
                source: src.path.clone(),
                width: w,
                height: h,
                sheet: Some(cell),
            });
        }
    }
    Ok(())
}
