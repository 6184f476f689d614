use super::Packer;
use crate::model::Rect;

/// MaxRects free-list packer (best-area-fit, ties broken by the shorter leftover side).
///
/// Every frame reserves `spacing` extra pixels to its right and below. The free area is
/// the canvas grown by `spacing` on both axes so the reservation of frames touching the
/// right or bottom edge never needs canvas pixels.
pub struct MaxRectsPacker {
    spacing: u32,
    free: Vec<Rect>,
}

impl MaxRectsPacker {
    pub fn new(width: u32, height: u32, spacing: u32) -> Self {
        let bin = Rect::new(
            0,
            0,
            width.saturating_add(spacing),
            height.saturating_add(spacing),
        );
        Self {
            spacing,
            free: vec![bin],
        }
    }

    fn place_rect(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::new();
        let mut i = 0usize;
        while i < self.free.len() {
            let fr = self.free[i];
            if fr.intersects(node) {
                // Replaced by its leftovers around `node`.
                self.free.swap_remove(i);
                split_free_node(fr, node, &mut new_free);
            } else {
                i += 1;
            }
        }
        self.prune_new_vs_old(&mut new_free);
        prune_within(&mut new_free);
        self.free.extend(new_free);
    }

    fn prune_new_vs_old(&mut self, new_free: &mut Vec<Rect>) {
        // Leftovers already covered by a surviving free rect add nothing.
        new_free.retain(|nr| nr.w > 0 && nr.h > 0 && !self.free.iter().any(|of| of.contains(nr)));
        // Neither do surviving rects swallowed by a leftover.
        self.free
            .retain(|of| !new_free.iter().any(|nr| nr.contains(of)));
    }

    fn score(fr: &Rect, w: u32, h: u32) -> (u64, u32) {
        let leftover_h = fr.w - w;
        let leftover_v = fr.h - h;
        let area_fit = fr.area() - (w as u64 * h as u64);
        (area_fit, leftover_h.min(leftover_v))
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Rect> {
        // Score: leftover area, shorter leftover side, bottom edge, x.
        let mut best: Option<(u64, u32, u32, u32)> = None;
        let mut best_rect = None;

        for fr in &self.free {
            if fr.w < w || fr.h < h {
                continue;
            }
            // Exact match cannot be beaten.
            if fr.w == w && fr.h == h {
                return Some(Rect::new(fr.x, fr.y, w, h));
            }
            let (area_fit, short_fit) = Self::score(fr, w, h);
            // Equal scores go to the higher, then leftmost, slot.
            let key = (area_fit, short_fit, fr.y.saturating_add(h), fr.x);
            if best.is_none_or(|b| key < b) {
                best = Some(key);
                best_rect = Some(Rect::new(fr.x, fr.y, w, h));
            }
        }
        best_rect
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    fn reserved(&self, w: u32, h: u32) -> (u32, u32) {
        (w.saturating_add(self.spacing), h.saturating_add(self.spacing))
    }
}

/// Splits `fr` around `node` into up to four maximal residual rectangles.
/// When `node` sits at the top-left of `fr` only the right and bottom parts remain.
fn split_free_node(fr: Rect, node: &Rect, out: &mut Vec<Rect>) {
    let fr_x2 = fr.right();
    let fr_y2 = fr.bottom();
    let n_x2 = node.right();
    let n_y2 = node.bottom();

    // Left
    if node.x > fr.x && node.x < fr_x2 {
        out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
    }
    // Right
    if n_x2 < fr_x2 {
        out.push(Rect::new(n_x2, fr.y, fr_x2 - n_x2, fr.h));
    }
    // Top
    if node.y > fr.y && node.y < fr_y2 {
        out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
    }
    // Bottom
    if n_y2 < fr_y2 {
        out.push(Rect::new(fr.x, n_y2, fr.w, fr_y2 - n_y2));
    }
}

/// Compacts `v` by dropping every rectangle contained in another one (keeps one of equal pairs).
fn prune_within(v: &mut Vec<Rect>) {
    let mut i = 0;
    while i < v.len() {
        let a = v[i];
        let dominated = v
            .iter()
            .enumerate()
            .any(|(j, b)| j != i && b.contains(&a) && (a != *b || j > i));
        if dominated {
            v.swap_remove(i);
        } else {
            i += 1;
        }
    }
}

impl Packer for MaxRectsPacker {
    fn can_pack(&self, w: u32, h: u32) -> bool {
        let (rw, rh) = self.reserved(w, h);
        self.find_position(rw, rh).is_some()
    }

    fn pack(&mut self, w: u32, h: u32) -> Option<Rect> {
        let (rw, rh) = self.reserved(w, h);
        let place = self.find_position(rw, rh)?;
        self.place_rect(&place);
        Some(Rect::new(place.x, place.y, w, h))
    }
}
