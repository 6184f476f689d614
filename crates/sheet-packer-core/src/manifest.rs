//! JSON manifest describing frame rectangles and animation groups (TexturePacker-like hash).
//!
//! Shape: `{ meta, animations?, frames: { name: { frame, rotated, trimmed, spriteSourceSize, sourceSize, anchor } } }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::AtlasConfig;
use crate::error::Result;
use crate::model::Canvas;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub meta: ManifestMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animations: Option<BTreeMap<String, Vec<String>>>,
    pub frames: BTreeMap<String, FrameEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMeta {
    pub app: String,
    pub version: String,
    pub image: String,
    pub format: String,
    pub size: Size,
    pub scale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEntry {
    pub frame: FrameRect,
    pub rotated: bool,
    pub trimmed: bool,
    pub sprite_source_size: FrameRect,
    pub source_size: Size,
    pub anchor: Point,
}

impl Manifest {
    /// Builds the manifest for `canvas`. Animation member lists are sorted by frame name,
    /// which matches raster order thanks to the zero-padded indices.
    pub fn from_canvas(canvas: &Canvas, cfg: &AtlasConfig) -> Self {
        let mut frames = BTreeMap::new();
        let mut animations: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for pf in &canvas.frames {
            let (w, h) = (pf.frame.width, pf.frame.height);
            if let Some(sheet) = &pf.frame.sheet {
                animations
                    .entry(sheet.animation.clone())
                    .or_default()
                    .push(pf.frame.name.clone());
            }
            frames.insert(
                pf.frame.name.clone(),
                FrameEntry {
                    frame: FrameRect {
                        x: pf.x,
                        y: pf.y,
                        w,
                        h,
                    },
                    rotated: false,
                    trimmed: false,
                    sprite_source_size: FrameRect { x: 0, y: 0, w, h },
                    source_size: Size { w, h },
                    anchor: Point { x: 0.5, y: 0.5 },
                },
            );
        }
        for names in animations.values_mut() {
            names.sort();
        }
        Manifest {
            meta: ManifestMeta {
                app: "sheet-packer".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                image: cfg.image_name(),
                format: "RGBA8888".into(),
                size: Size {
                    w: canvas.width,
                    h: canvas.height,
                },
                scale: "1".into(),
            },
            animations: (!animations.is_empty()).then_some(animations),
            frames,
        }
    }

    /// Serializes compactly, or indented with two spaces when `prettify` is set.
    pub fn to_json(&self, prettify: bool) -> Result<String> {
        Ok(if prettify {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }
}

/// Builds and serializes the manifest for `canvas` per `cfg.prettify`.
#[instrument(skip_all)]
pub fn build_manifest(canvas: &Canvas, cfg: &AtlasConfig) -> Result<String> {
    Manifest::from_canvas(canvas, cfg).to_json(cfg.prettify)
}
