// template-based anchor detection
//
// scans the reference image with each overlay's artwork as a template via
// normalized cross-correlation, collects every offset scoring at or above
// the threshold, and collapses overlapping hits into averaged anchor boxes.

use image::RgbaImage;
use imageproc::template_matching::{match_template, MatchTemplateMethod};

use crate::geom::Rect;

/// overlap tolerance used when collapsing raw correlation hits
const GROUP_TOLERANCE: f32 = 0.5;

/// find candidate anchor boxes for `template` inside `base`.
///
/// returns one rect per cluster of correlation hits, each of the template's
/// size. the order follows the scan order of the similarity map; callers
/// that need a single anchor take the first. an empty result means the
/// template could not be located and the run cannot proceed.
pub fn find_template_coords(base: &RgbaImage, template: &RgbaImage, threshold: f32) -> Vec<Rect> {
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > base.width() || th > base.height() {
        // an oversized or empty template can never match
        return Vec::new();
    }

    // correlation runs on luma; overlay alpha does not carry position info
    let base_gray = image::imageops::grayscale(base);
    let template_gray = image::imageops::grayscale(template);

    let scores = match_template(
        &base_gray,
        &template_gray,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );

    let mut hits = Vec::new();
    for (x, y, p) in scores.enumerate_pixels() {
        // NaN scores (zero-variance windows) fail this comparison
        if p[0] >= threshold {
            hits.push((x, y));
        }
    }

    group_hits(&hits, tw, th, GROUP_TOLERANCE)
}

/// collapse overlapping hits into representative boxes.
///
/// greedy clustering in scan order: a hit joins the first cluster whose
/// running-average corner is within `tolerance * (tw + th) / 2` pixels on
/// both axes, otherwise it starts a new cluster. minimum group size is 1,
/// so isolated hits survive. each cluster is reported at its averaged
/// corner with the template's size.
fn group_hits(hits: &[(u32, u32)], tw: u32, th: u32, tolerance: f32) -> Vec<Rect> {
    // (sum_x, sum_y, count)
    let mut clusters: Vec<(u64, u64, u64)> = Vec::new();
    let delta = tolerance * (tw + th) as f32 * 0.5;

    for &(x, y) in hits {
        let joined = clusters.iter_mut().find(|(sx, sy, n)| {
            let cx = (*sx / *n) as f32;
            let cy = (*sy / *n) as f32;
            (x as f32 - cx).abs() <= delta && (y as f32 - cy).abs() <= delta
        });
        match joined {
            Some((sx, sy, n)) => {
                *sx += x as u64;
                *sy += y as u64;
                *n += 1;
            }
            None => clusters.push((x as u64, y as u64, 1)),
        }
    }

    clusters
        .into_iter()
        .map(|(sx, sy, n)| Rect::from_xywh((sx / n) as u32, (sy / n) as u32, tw, th))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// checkerboard-ish patch with enough variance for a sharp correlation peak
    fn patterned_patch(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            let v = ((x * 37 + y * 91) % 251) as u8;
            Rgba([v, v / 2, 255 - v, 255])
        })
    }

    /// gray base with `patch` planted at (px, py)
    fn base_with_patch(w: u32, h: u32, patch: &RgbaImage, px: u32, py: u32) -> RgbaImage {
        let mut base = RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255]));
        image::imageops::replace(&mut base, patch, px as i64, py as i64);
        base
    }

    #[test]
    fn test_finds_planted_template() {
        let patch = patterned_patch(8, 8);
        let base = base_with_patch(64, 64, &patch, 20, 30);

        let boxes = find_template_coords(&base, &patch, 0.95);
        assert!(!boxes.is_empty());

        let anchor = boxes[0];
        assert_eq!(anchor.width(), 8);
        assert_eq!(anchor.height(), 8);
        // clustering averages adjacent hits, allow a couple pixels of slack
        assert!((anchor.x1 as i32 - 20).abs() <= 2, "x1 = {}", anchor.x1);
        assert!((anchor.y1 as i32 - 30).abs() <= 2, "y1 = {}", anchor.y1);
    }

    #[test]
    fn test_missing_template_yields_empty() {
        let patch = patterned_patch(8, 8);
        // uniform base: no window correlates with the patterned patch
        let base = RgbaImage::from_pixel(64, 64, Rgba([10, 10, 10, 255]));

        let boxes = find_template_coords(&base, &patch, 0.99);
        assert!(boxes.is_empty());
    }

    #[test]
    fn test_oversized_template_yields_empty() {
        let patch = patterned_patch(100, 100);
        let base = base_with_patch(64, 64, &patterned_patch(8, 8), 0, 0);
        assert!(find_template_coords(&base, &patch, 0.5).is_empty());
    }

    #[test]
    fn test_grouping_collapses_duplicate_hits() {
        // four hits within tolerance of each other plus one far away
        let hits = [(10, 10), (11, 10), (10, 12), (12, 11), (50, 50)];
        let boxes = group_hits(&hits, 8, 8, 0.5);

        assert_eq!(boxes.len(), 2);
        // first cluster averages to (10, 10) after integer division
        assert_eq!(boxes[0], Rect::from_xywh(10, 10, 8, 8));
        assert_eq!(boxes[1], Rect::from_xywh(50, 50, 8, 8));
    }

    #[test]
    fn test_grouping_keeps_isolated_hit() {
        let boxes = group_hits(&[(3, 4)], 5, 6, 0.5);
        assert_eq!(boxes, vec![Rect::from_xywh(3, 4, 5, 6)]);
    }
}
