use tracing::{debug, info, instrument};

use crate::config::{PackerConfig, next_pow2};
use crate::error::{Result, SheetPackerError};
use crate::model::{Canvas, Frame, PlacedFrame, Rect};

pub mod maxrects;

use maxrects::MaxRectsPacker;

/// A packer places rectangles into a fixed-size canvas.
///
/// Implementations must ensure no overlaps, including the configured spacing.
/// `pack` returns `None` if the rectangle cannot be placed.
pub trait Packer {
    fn can_pack(&self, w: u32, h: u32) -> bool;
    fn pack(&mut self, w: u32, h: u32) -> Option<Rect>;
}

/// Packs `frames` into one canvas.
///
/// Frames are placed largest area first (stable on input order). With `smart` the canvas
/// starts at the smallest plausible size and doubles until everything fits; otherwise it
/// is exactly the effective maxima. Returned frames keep the input order.
#[instrument(skip_all, fields(frames = frames.len()))]
pub fn pack_frames(frames: &[Frame], cfg: &PackerConfig) -> Result<Canvas> {
    cfg.validate()?;
    if frames.is_empty() {
        return Err(SheetPackerError::NoInput {
            location: "frame list".into(),
        });
    }

    let (max_w, max_h) = cfg.effective_max();
    let fit_failure = |placed: usize| SheetPackerError::FitFailure {
        placed,
        total: frames.len(),
        max_width: max_w,
        max_height: max_h,
    };
    if frames.iter().any(|f| f.width > max_w || f.height > max_h) {
        return Err(fit_failure(0));
    }

    let mut order: Vec<usize> = (0..frames.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(frames[i].width as u64 * frames[i].height as u64));

    let (width, height, placements) = if cfg.smart {
        let (mut w, mut h) = initial_size(frames, cfg, (max_w, max_h));
        loop {
            debug!(w, h, "trying canvas size");
            match try_pack(frames, &order, w, h, cfg.spacing) {
                Ok(placements) => {
                    let (fw, fh) = used_size(&placements, cfg, (w, h));
                    break (fw, fh, placements);
                }
                Err(placed) if w >= max_w && h >= max_h => return Err(fit_failure(placed)),
                Err(_) => (w, h) = grow(w, h, cfg, (max_w, max_h)),
            }
        }
    } else {
        let placements = try_pack(frames, &order, max_w, max_h, cfg.spacing).map_err(fit_failure)?;
        (max_w, max_h, placements)
    };

    info!(width, height, frames = frames.len(), "packed canvas");
    let placed = frames
        .iter()
        .zip(placements)
        .map(|(frame, r)| PlacedFrame {
            frame: frame.clone(),
            x: r.x,
            y: r.y,
        })
        .collect();
    Ok(Canvas {
        width,
        height,
        frames: placed,
    })
}

/// Places every frame in `order` on a `w x h` canvas. Returns rects indexed like `frames`,
/// or the number of frames placed before the first one that did not fit.
fn try_pack(
    frames: &[Frame],
    order: &[usize],
    w: u32,
    h: u32,
    spacing: u32,
) -> std::result::Result<Vec<Rect>, usize> {
    let mut packer = MaxRectsPacker::new(w, h, spacing);
    let mut out = vec![Rect::new(0, 0, 0, 0); frames.len()];
    for (placed, &idx) in order.iter().enumerate() {
        let f = &frames[idx];
        match packer.pack(f.width, f.height) {
            Some(r) => out[idx] = r,
            None => return Err(placed),
        }
    }
    Ok(out)
}

/// Rounds `(w, h)` to the configured shape and clamps to the effective maxima.
fn shape(w: u32, h: u32, cfg: &PackerConfig, max: (u32, u32)) -> (u32, u32) {
    let (mut w, mut h) = (w.max(1), h.max(1));
    if cfg.pot {
        w = next_pow2(w);
        h = next_pow2(h);
    }
    if cfg.square {
        let m = w.max(h);
        w = m;
        h = m;
    }
    (w.min(max.0), h.min(max.1))
}

/// Smallest size that could hold the reserved frame area and the largest frame.
fn initial_size(frames: &[Frame], cfg: &PackerConfig, max: (u32, u32)) -> (u32, u32) {
    let s = cfg.spacing as u64;
    let area: u64 = frames
        .iter()
        .map(|f| (f.width as u64 + s) * (f.height as u64 + s))
        .sum();
    let side = (area as f64).sqrt().ceil() as u64;
    let side = u32::try_from(side.saturating_sub(s)).unwrap_or(u32::MAX);
    let widest = frames.iter().map(|f| f.width).max().unwrap_or(1);
    let tallest = frames.iter().map(|f| f.height).max().unwrap_or(1);
    shape(widest.max(side), tallest.max(side), cfg, max)
}

/// Doubles the shorter side that can still grow (both sides when square).
fn grow(w: u32, h: u32, cfg: &PackerConfig, max: (u32, u32)) -> (u32, u32) {
    if cfg.square {
        return shape(w.saturating_mul(2), h.saturating_mul(2), cfg, max);
    }
    let grow_w = w < max.0 && (h >= max.1 || w <= h);
    if grow_w {
        shape(w.saturating_mul(2), h, cfg, max)
    } else {
        shape(w, h.saturating_mul(2), cfg, max)
    }
}

/// Final canvas: the used extent, reshaped, never larger than the trial size.
fn used_size(placements: &[Rect], cfg: &PackerConfig, trial: (u32, u32)) -> (u32, u32) {
    let w = placements.iter().map(Rect::right).max().unwrap_or(1);
    let h = placements.iter().map(Rect::bottom).max().unwrap_or(1);
    shape(w, h, cfg, trial)
}
