//! Core library for packing a folder of sprites and grid sheets into one texture atlas.
//!
//! - Sheets: files named like `walk_4x2.png` are sliced into `4 x 2` frames and grouped as an animation
//! - Packing: MaxRects (best-area-fit) into a single canvas with spacing, power-of-two, square and auto-grow policies
//! - Output: one RGBA image plus a JSON manifest (frames + animations); PNG encoding helper included
//!
//! Quick example:
//! ```ignore
//! use sheet_packer_core::{AtlasConfig, MemoryImageSource, TracingProgress, pack_sources};
//! # fn main() -> anyhow::Result<()> {
//! let src = MemoryImageSource::new()
//!     .with("icon.png", image::open("icon.png")?)
//!     .with("walk_4x2.png", image::open("walk_4x2.png")?);
//! let out = pack_sources(&src.sources(), &src, &AtlasConfig::default(), &TracingProgress)?;
//! println!("{}x{}: {}", out.canvas.width, out.canvas.height, out.manifest);
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod folder;
pub mod manifest;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod progress;
pub mod sheet;
pub mod source;

pub use config::*;
pub use error::*;
pub use manifest::{Manifest, build_manifest};
pub use model::*;
pub use packer::{Packer, pack_frames};
pub use pipeline::*;
pub use progress::*;
pub use sheet::{extract_frames, parse_sheet_name};
pub use source::*;

/// Convenience prelude for common types and functions.
/// Importing `sheet_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{AtlasConfig, PackerConfig, PackerConfigBuilder};
    pub use crate::error::{Result, SheetPackerError};
    pub use crate::model::{Canvas, Frame, PackStats, PlacedFrame, Rect, SheetRef, SourceImage};
    pub use crate::progress::{NoProgress, Progress, TracingProgress};
    pub use crate::source::{FsImageSource, ImageSource, MemoryImageSource};
    pub use crate::{
        FolderOptions, FolderOutput, PackOutput, extract_frames, pack_files, pack_folder,
        pack_folder_with, pack_frames,
        pack_layout, pack_sources,
    };
}
