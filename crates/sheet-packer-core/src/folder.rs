//! Filesystem side of a run: listing the input folder and writing the two artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SheetPackerError};

/// Extensions (lowercase) treated as raster images.
pub const IMAGE_EXTENSIONS: &[&str] = &["gif", "jpg", "jpeg", "tif", "tiff", "png", "webp", "bmp"];

pub fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str())
    )
}

/// Lists the image files directly inside `folder`, sorted by file name.
/// Fails with `NoInput` when nothing matches.
pub fn list_images(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut list = Vec::new();
    let walker = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| SheetPackerError::Io {
            path: folder.to_path_buf(),
            source: e.into(),
        })?;
        let p = entry.path();
        if entry.file_type().is_file() && is_image(p) {
            list.push(p.to_path_buf());
        }
    }
    debug!(folder = %folder.display(), count = list.len(), "listed images");
    if list.is_empty() {
        return Err(SheetPackerError::NoInput {
            location: folder.display().to_string(),
        });
    }
    Ok(list)
}

/// Writes `bytes` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source| SheetPackerError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)
}

/// Writes the atlas image and manifest into `out_dir` and returns their paths.
pub fn write_outputs(
    out_dir: &Path,
    image_name: &str,
    png: &[u8],
    manifest_name: &str,
    manifest: &str,
) -> Result<(PathBuf, PathBuf)> {
    let png_path = out_dir.join(image_name);
    let json_path = out_dir.join(manifest_name);
    #[cfg(feature = "parallel")]
    {
        let (a, b) = rayon::join(
            || write_file(&png_path, png),
            || write_file(&json_path, manifest.as_bytes()),
        );
        a?;
        b?;
    }
    #[cfg(not(feature = "parallel"))]
    {
        write_file(&png_path, png)?;
        write_file(&json_path, manifest.as_bytes())?;
    }
    Ok((png_path, json_path))
}
