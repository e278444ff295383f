// area-preserving resize and shrink-and-shift local placement
//
// the placer is fully deterministic: shrink levels are tried outermost
// (largest size first), shift offsets innermost in the caller-supplied
// order, and the first non-overlapping candidate wins. iteration order is
// the tie-break, so it must not change.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::geom::Rect;

/// scale `img` so its pixel area is `ratio * canvas_area`, preserving
/// aspect ratio. dimensions are floored. callers must guard against
/// non-positive ratios.
pub fn resize_by_area(img: &RgbaImage, ratio: f64, canvas_area: u64) -> (RgbaImage, (u32, u32)) {
    let orig_area = img.width() as f64 * img.height() as f64;
    let scale = (ratio * canvas_area as f64 / orig_area).sqrt();
    let new_w = (img.width() as f64 * scale) as u32;
    let new_h = (img.height() as f64 * scale) as u32;
    if new_w == 0 || new_h == 0 {
        return (RgbaImage::new(0, 0), (new_w, new_h));
    }
    let resized = imageops::resize(img, new_w, new_h, FilterType::Lanczos3);
    (resized, (new_w, new_h))
}

/// build the candidate displacement grid `{-range..=range}²` with the given
/// step, dx-major. both endpoints are included when they align to the step.
pub fn shift_offsets(range: i32, step: i32) -> Vec<(i32, i32)> {
    let axis: Vec<i32> = (-range..=range).step_by(step.max(1) as usize).collect();
    let mut offsets = Vec::with_capacity(axis.len() * axis.len());
    for &dx in &axis {
        for &dy in &axis {
            offsets.push((dx, dy));
        }
    }
    offsets
}

/// search for a non-overlapping spot for `overlay` near the anchor center.
///
/// each shrink attempt resizes the overlay at `ratio * scale²` (scale is
/// multiplied by `shrink_factor` after every failed attempt), then walks
/// `offsets`, clamping each candidate so the overlay stays fully inside the
/// canvas. the first candidate that overlaps nothing in `existing` is
/// composited onto `canvas` with alpha blending and returned.
///
/// returns `None`, leaving `canvas` untouched, when every shrink level and
/// offset is exhausted.
pub fn try_local_place(
    canvas: &mut RgbaImage,
    overlay: &RgbaImage,
    anchor: Rect,
    existing: &[Rect],
    ratio: f64,
    canvas_area: u64,
    shrink_factor: f64,
    max_shrink: u32,
    offsets: &[(i32, i32)],
) -> Option<Rect> {
    let (cw, ch) = canvas.dimensions();
    let (cx, cy) = anchor.center();
    let mut scale = 1.0_f64;

    for _ in 0..max_shrink {
        let (resized, (w, h)) = resize_by_area(overlay, ratio * scale * scale, canvas_area);
        if w == 0 || h == 0 || w > cw || h > ch {
            // degenerate or oversized at this level; only shrinking can help
            scale *= shrink_factor;
            continue;
        }

        for &(dx, dy) in offsets {
            let px = (cx as i64 + dx as i64 - (w / 2) as i64).clamp(0, (cw - w) as i64) as u32;
            let py = (cy as i64 + dy as i64 - (h / 2) as i64).clamp(0, (ch - h) as i64) as u32;
            let candidate = Rect::new(px, py, px + w, py + h);

            if existing.iter().all(|b| !candidate.overlaps(b)) {
                imageops::overlay(canvas, &resized, px as i64, py as i64);
                return Some(candidate);
            }
        }

        scale *= shrink_factor;
    }

    None
}
