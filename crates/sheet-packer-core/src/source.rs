//! Image services the pipeline depends on: dimension probing, region fetch and encoding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::error::{ParameterError, ParameterErrorKind};
use image::{DynamicImage, ImageEncoder, ImageError, ImageReader, RgbaImage};

use crate::error::{Result, SheetPackerError};
use crate::model::{Rect, SourceImage};

/// Read access to source pixels. Calls may arrive from several threads at once.
pub trait ImageSource: Send + Sync {
    /// Pixel width and height of the image at `path`.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)>;
    /// Decoded RGBA pixels of `rect` within the image (the whole image when `None`).
    fn region(&self, path: &Path, rect: Option<Rect>) -> Result<RgbaImage>;
}

/// Reads images from disk with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsImageSource;

impl FsImageSource {
    fn reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>> {
        let io_err = |source| SheetPackerError::Io {
            path: path.to_path_buf(),
            source,
        };
        ImageReader::open(path)
            .map_err(io_err)?
            .with_guessed_format()
            .map_err(io_err)
    }
}

impl ImageSource for FsImageSource {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        Self::reader(path)?
            .into_dimensions()
            .map_err(|source| image_err(path, source))
    }

    fn region(&self, path: &Path, rect: Option<Rect>) -> Result<RgbaImage> {
        let img = Self::reader(path)?
            .decode()
            .map_err(|source| image_err(path, source))?
            .to_rgba8();
        crop(path, img, rect)
    }
}

/// Images held in memory, keyed by the path they are reported under.
#[derive(Debug, Default, Clone)]
pub struct MemoryImageSource {
    order: Vec<PathBuf>,
    images: HashMap<PathBuf, RgbaImage>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an image. Insertion order is kept for [`Self::sources`].
    pub fn insert(&mut self, path: impl Into<PathBuf>, image: DynamicImage) {
        let path = path.into();
        if !self.images.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.images.insert(path, image.to_rgba8());
    }

    pub fn with(mut self, path: impl Into<PathBuf>, image: DynamicImage) -> Self {
        self.insert(path, image);
        self
    }

    /// Source descriptors for every held image, in insertion order.
    pub fn sources(&self) -> Vec<SourceImage> {
        self.order
            .iter()
            .map(|p| {
                let (w, h) = self.images[p].dimensions();
                SourceImage::new(p.clone(), w, h)
            })
            .collect()
    }

    fn get(&self, path: &Path) -> Result<&RgbaImage> {
        self.images
            .get(path)
            .ok_or_else(|| SheetPackerError::MissingSource {
                path: path.to_path_buf(),
            })
    }
}

impl ImageSource for MemoryImageSource {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        Ok(self.get(path)?.dimensions())
    }

    fn region(&self, path: &Path, rect: Option<Rect>) -> Result<RgbaImage> {
        crop(path, self.get(path)?.clone(), rect)
    }
}

fn image_err(path: &Path, source: ImageError) -> SheetPackerError {
    SheetPackerError::Image {
        path: path.to_path_buf(),
        source,
    }
}

/// Fails with a dimension mismatch when `r` reaches outside a `dims`-sized image.
pub(crate) fn check_region(path: &Path, dims: (u32, u32), r: Rect) -> Result<()> {
    if r.right() > dims.0 || r.bottom() > dims.1 {
        return Err(image_err(
            path,
            ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::DimensionMismatch,
            )),
        ));
    }
    Ok(())
}

fn crop(path: &Path, img: RgbaImage, rect: Option<Rect>) -> Result<RgbaImage> {
    let Some(r) = rect else {
        return Ok(img);
    };
    check_region(path, img.dimensions(), r)?;
    Ok(image::imageops::crop_imm(&img, r.x, r.y, r.w, r.h).to_image())
}

/// Encodes `rgba` as PNG (lossless, alpha preserved).
pub fn encode_png(rgba: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(std::io::Cursor::new(&mut bytes));
    encoder
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| SheetPackerError::Encode(format!("Failed to encode PNG: {}", e)))?;
    Ok(bytes)
}
