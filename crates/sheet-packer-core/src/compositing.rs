use std::collections::HashMap;
use std::path::Path;

use image::RgbaImage;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;
use crate::model::{Canvas, PlacedFrame, Rect};
use crate::progress::Progress;
use crate::source::{ImageSource, check_region};

/// Frames fetched and drawn per compositing pass.
pub const BATCH_SIZE: usize = 100;

/// Copy `region` of `src` into `canvas` with its top-left at (dx, dy), clipped to the canvas.
///
/// Placed frames never overlap, so a plain copy gives the same result as alpha-over on the
/// transparent background.
pub fn blit_rgba(src: &RgbaImage, region: Rect, canvas: &mut RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    let rw = region.w.min(src.width().saturating_sub(region.x));
    let rh = region.h.min(src.height().saturating_sub(region.y));
    for yy in 0..rh {
        if dy + yy >= ch {
            break;
        }
        for xx in 0..rw {
            if dx + xx < cw {
                canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(region.x + xx, region.y + yy));
            }
        }
    }
}

/// Decodes every distinct source of `batch` once; sheet cells share their sheet's pixels.
fn fetch_batch<'a>(
    batch: &'a [PlacedFrame],
    source: &dyn ImageSource,
) -> Result<HashMap<&'a Path, RgbaImage>> {
    let mut paths: Vec<&Path> = batch.iter().map(|pf| pf.frame.source.as_path()).collect();
    paths.sort_unstable();
    paths.dedup();
    let fetch = |p: &&'a Path| -> Result<(&'a Path, RgbaImage)> { Ok((*p, source.region(p, None)?)) };
    #[cfg(feature = "parallel")]
    {
        paths.par_iter().map(fetch).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        paths.iter().map(fetch).collect()
    }
}

fn draw(out: &mut RgbaImage, pf: &PlacedFrame, image: &RgbaImage) -> Result<()> {
    let (w, h) = image.dimensions();
    let region = pf
        .frame
        .source_region()
        .unwrap_or_else(|| Rect::new(0, 0, w, h));
    check_region(&pf.frame.source, (w, h), region)?;
    blit_rgba(image, region, out, pf.x, pf.y);
    Ok(())
}

/// Renders every placed frame onto a transparent `canvas.width x canvas.height` RGBA buffer.
///
/// Frames are processed in batches of [`BATCH_SIZE`]: each batch's source images are fetched
/// once per path (concurrently with the `parallel` feature), then every frame's cell is drawn
/// into the single accumulating buffer before the next batch starts.
#[instrument(skip_all, fields(frames = canvas.frames.len()))]
pub fn compose(
    canvas: &Canvas,
    source: &dyn ImageSource,
    progress: &dyn Progress,
) -> Result<RgbaImage> {
    let mut out = RgbaImage::new(canvas.width, canvas.height);
    progress.message("Processing images...");

    let total = canvas.frames.len();
    let batches = total.div_ceil(BATCH_SIZE);
    let mut drawn = 0usize;
    for (i, batch) in canvas.frames.chunks(BATCH_SIZE).enumerate() {
        let images = fetch_batch(batch, source)?;
        for pf in batch {
            if let Some(image) = images.get(pf.frame.source.as_path()) {
                draw(&mut out, pf, image)?;
            }
        }
        drawn += batch.len();
        debug!(batch = i + 1, batches, drawn, "batch composited");
        if batches - (i + 1) > 1 {
            let percent = ((100 * drawn) as f64 / total as f64).round() as u32;
            progress.batch_done(i + 1, batches, percent);
        }
    }
    Ok(out)
}
