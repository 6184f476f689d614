use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::compositing::compose;
use crate::config::{AtlasConfig, PackerConfig};
use crate::error::{Result, SheetPackerError};
use crate::folder::{list_images, write_outputs};
use crate::manifest::build_manifest;
use crate::model::{Canvas, PackStats, SourceImage};
use crate::packer::pack_frames;
use crate::progress::{NoProgress, Progress};
use crate::sheet::extract_frames;
use crate::source::{FsImageSource, ImageSource, encode_png};

/// Output of a packing run: the placed canvas, its RGBA pixels and the serialized manifest.
#[derive(Debug, Clone)]
pub struct PackOutput {
    pub canvas: Canvas,
    pub image: RgbaImage,
    pub manifest: String,
}

impl PackOutput {
    /// Computes packing statistics for this output.
    /// This is a convenience method that delegates to `canvas.stats()`.
    pub fn stats(&self) -> PackStats {
        self.canvas.stats()
    }
}

/// Result of [`pack_folder`]: the packed canvas and the files written (none on a dry run).
#[derive(Debug, Clone)]
pub struct FolderOutput {
    pub canvas: Canvas,
    pub image_path: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
}

/// Extra knobs for [`pack_folder_with`].
#[derive(Default, Clone, Copy)]
pub struct FolderOptions<'a> {
    /// Keeps only the listed paths for which this returns `true`.
    pub filter: Option<&'a (dyn Fn(&Path) -> bool + Sync)>,
    /// Pack and composite without writing any file.
    pub dry_run: bool,
}

/// Reads the dimensions of every path. Results keep the order of `paths`.
#[instrument(skip_all, fields(count = paths.len()))]
pub fn probe_sources(paths: &[PathBuf], source: &dyn ImageSource) -> Result<Vec<SourceImage>> {
    let probe = |p: &PathBuf| -> Result<SourceImage> {
        let (w, h) = source.dimensions(p)?;
        Ok(SourceImage::new(p.clone(), w, h))
    };
    #[cfg(feature = "parallel")]
    {
        paths.par_iter().map(probe).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        paths.iter().map(probe).collect()
    }
}

/// Layout only: extracts frames from `sources` and packs them without touching pixels.
pub fn pack_layout(sources: &[SourceImage], cfg: &PackerConfig) -> Result<Canvas> {
    cfg.validate()?;
    let frames = extract_frames(sources)?;
    pack_frames(&frames, cfg)
}

/// Packs already-probed `sources` and produces the atlas pixels and manifest in memory.
///
/// Compositing and manifest building run concurrently with the `parallel` feature.
#[instrument(skip_all, fields(sources = sources.len()))]
pub fn pack_sources(
    sources: &[SourceImage],
    source: &dyn ImageSource,
    cfg: &AtlasConfig,
    progress: &dyn Progress,
) -> Result<PackOutput> {
    cfg.validate()?;
    let progress: &dyn Progress = if cfg.log { progress } else { &NoProgress };

    let frames = extract_frames(sources)?;
    progress.message("Packing...");
    let canvas = pack_frames(&frames, &cfg.pack)?;

    #[cfg(feature = "parallel")]
    let (image, manifest) = rayon::join(
        || compose(&canvas, source, progress),
        || build_manifest(&canvas, cfg),
    );
    #[cfg(not(feature = "parallel"))]
    let (image, manifest) = (
        compose(&canvas, source, progress),
        build_manifest(&canvas, cfg),
    );

    Ok(PackOutput {
        image: image?,
        manifest: manifest?,
        canvas,
    })
}

/// Probes `paths` through `source` and packs them. An empty list is a `NoInput` error.
pub fn pack_files(
    paths: &[PathBuf],
    source: &dyn ImageSource,
    cfg: &AtlasConfig,
    progress: &dyn Progress,
) -> Result<PackOutput> {
    cfg.validate()?;
    if paths.is_empty() {
        return Err(SheetPackerError::NoInput {
            location: "input file list".into(),
        });
    }
    let sources = probe_sources(paths, source)?;
    pack_sources(&sources, source, cfg, progress)
}

/// Packs every image directly inside `folder` and writes `<file_name>.png` and
/// `<file_name>.json` into `out_dir` (created if missing). Nothing is written on failure.
pub fn pack_folder(
    folder: &Path,
    out_dir: &Path,
    cfg: &AtlasConfig,
    progress: &dyn Progress,
) -> Result<FolderOutput> {
    pack_folder_with(folder, out_dir, cfg, progress, &FolderOptions::default())
}

/// [`pack_folder`] with a file filter and an optional dry run.
///
/// Listed images for which `opts.filter` returns `false` are left out. With `opts.dry_run`
/// the atlas is packed and composited but nothing is written and both output paths are `None`.
#[instrument(skip_all, fields(folder = %folder.display(), dry_run = opts.dry_run))]
pub fn pack_folder_with(
    folder: &Path,
    out_dir: &Path,
    cfg: &AtlasConfig,
    progress: &dyn Progress,
    opts: &FolderOptions<'_>,
) -> Result<FolderOutput> {
    cfg.validate()?;
    let progress: &dyn Progress = if cfg.log { progress } else { &NoProgress };

    progress.message(&format!("Loading images from folder {}...", folder.display()));
    let mut paths = list_images(folder)?;
    if let Some(keep) = opts.filter {
        paths.retain(|p| keep(p.as_path()));
    }
    let out = pack_files(&paths, &FsImageSource, cfg, progress)?;
    if opts.dry_run {
        info!(summary = %out.stats().summary(), "dry run, nothing written");
        return Ok(FolderOutput {
            canvas: out.canvas,
            image_path: None,
            manifest_path: None,
        });
    }
    let png = encode_png(&out.image)?;

    progress.message("Writing image and json output...");
    let (image_path, manifest_path) = write_outputs(
        out_dir,
        &cfg.image_name(),
        &png,
        &cfg.manifest_name(),
        &out.manifest,
    )?;
    info!(image = %image_path.display(), manifest = %manifest_path.display(), "atlas written");
    progress.message("Packed");
    Ok(FolderOutput {
        canvas: out.canvas,
        image_path: Some(image_path),
        manifest_path: Some(manifest_path),
    })
}
