use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the interiors of `self` and `r` share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
}

/// An image file read once during extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }

    /// File name component used for sheet detection and plain frame keys.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Cell of a grid sheet a frame was sliced from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetRef {
    pub column: u32,
    pub row: u32,
    pub columns: u32,
    pub rows: u32,
    /// Animation group (sheet base name) the frame belongs to.
    pub animation: String,
}

impl SheetRef {
    /// Raster index of the cell (`row * columns + column`).
    pub fn index(&self) -> u32 {
        self.row * self.columns + self.column
    }
}

/// A rectangle to be packed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frame {
    /// Final manifest key.
    pub name: String,
    /// Originating file.
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub sheet: Option<SheetRef>,
}

impl Frame {
    /// Region of the originating image covered by this frame; `None` means the whole image.
    pub fn source_region(&self) -> Option<Rect> {
        self.sheet.as_ref().map(|s| {
            Rect::new(
                s.column * self.width,
                s.row * self.height,
                self.width,
                self.height,
            )
        })
    }
}

/// A frame with its assigned top-left offset within the canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacedFrame {
    pub frame: Frame,
    pub x: u32,
    pub y: u32,
}

impl PlacedFrame {
    /// Placed rectangle (without spacing).
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.frame.width, self.frame.height)
    }
}

/// The single output bin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<PlacedFrame>,
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Total number of frames packed.
    pub num_frames: usize,
    /// Number of frames sliced from grid sheets.
    pub num_sheet_frames: usize,
    /// Canvas area (`width * height`).
    pub canvas_area: u64,
    /// Sum of frame areas.
    pub used_frame_area: u64,
    /// Occupancy ratio: used_frame_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// Computes packing statistics for this canvas.
    pub fn stats(&self) -> PackStats {
        let canvas_area = self.width as u64 * self.height as u64;
        let used_frame_area: u64 = self.frames.iter().map(|p| p.rect().area()).sum();
        let num_sheet_frames = self
            .frames
            .iter()
            .filter(|p| p.frame.sheet.is_some())
            .count();
        let occupancy = if canvas_area > 0 {
            used_frame_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        PackStats {
            num_frames: self.frames.len(),
            num_sheet_frames,
            canvas_area,
            used_frame_area,
            occupancy,
            width: self.width,
            height: self.height,
        }
    }
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Canvas: {}x{}, Frames: {} ({} from sheets), Occupancy: {:.2}%, Used Area: {} px²",
            self.width,
            self.height,
            self.num_frames,
            self.num_sheet_frames,
            self.occupancy * 100.0,
            self.used_frame_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.used_frame_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 5, 5);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&Rect::new(9, 9, 2, 2)));
    }

    #[test]
    fn sheet_frame_region_follows_cell() {
        let f = Frame {
            name: "walk_5.png".into(),
            source: "walk_4x2.png".into(),
            width: 64,
            height: 64,
            sheet: Some(SheetRef {
                column: 1,
                row: 1,
                columns: 4,
                rows: 2,
                animation: "walk".into(),
            }),
        };
        assert_eq!(f.source_region(), Some(Rect::new(64, 64, 64, 64)));
        assert_eq!(f.sheet.as_ref().map(SheetRef::index), Some(5));
    }

    #[test]
    fn stats_count_sheet_frames_and_occupancy() {
        let frame = |name: &str, sheet: bool| Frame {
            name: name.into(),
            source: name.into(),
            width: 8,
            height: 8,
            sheet: sheet.then(|| SheetRef {
                column: 0,
                row: 0,
                columns: 1,
                rows: 1,
                animation: "a".into(),
            }),
        };
        let canvas = Canvas {
            width: 16,
            height: 16,
            frames: vec![
                PlacedFrame { frame: frame("a_0.png", true), x: 0, y: 0 },
                PlacedFrame { frame: frame("b.png", false), x: 8, y: 0 },
            ],
        };
        let stats = canvas.stats();
        assert_eq!(stats.num_frames, 2);
        assert_eq!(stats.num_sheet_frames, 1);
        assert_eq!(stats.used_frame_area, 128);
        assert_eq!(stats.wasted_area(), 128);
        assert!((stats.occupancy - 0.5).abs() < 1e-9);
        assert!(stats.summary().contains("16x16"));
    }
}
