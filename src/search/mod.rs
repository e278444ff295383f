// search driver
//
// runs a fixed budget of trials, each evaluating one sampled parameter
// vector against a fresh clone of the base canvas. the sampler proposes
// vectors adaptively from the trial history; the driver only owns the
// budget loop, the history, and the final replay.

pub mod sampler;

use image::RgbaImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::geom::Rect;
use crate::place::{shift_offsets, try_local_place};
use crate::settings::SearchSpace;

pub use sampler::{RandomSampler, Sampler, TpeSampler};

/// one sampled point of the 5-dimensional parameter space.
/// immutable once sampled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialParams {
    pub logo_ratio: f64,
    pub claim_ratio: f64,
    pub shrink_factor: f64,
    pub max_shrink: u32,
    pub shift_range: i32,
}

/// a parameter vector together with its observed score
#[derive(Clone, Copy, Debug)]
pub struct Trial {
    pub params: TrialParams,
    pub score: f64,
}

/// parameter-space bounds resolved for one run (the ratio windows depend
/// on the user-supplied base ratios)
#[derive(Clone, Copy, Debug)]
pub struct ParamBounds {
    pub logo_ratio: (f64, f64),
    pub claim_ratio: (f64, f64),
    pub shrink_factor: (f64, f64),
    pub max_shrink: (u32, u32),
    pub shift_range: (i32, i32),
}

impl ParamBounds {
    pub fn from_space(space: &SearchSpace, base_logo_ratio: f64, base_claim_ratio: f64) -> Self {
        let window = |base: f64| {
            (
                (base - space.ratio_window).max(space.ratio_floor),
                base + space.ratio_window,
            )
        };
        Self {
            logo_ratio: window(base_logo_ratio),
            claim_ratio: window(base_claim_ratio),
            shrink_factor: (space.shrink_factor_min, space.shrink_factor_max),
            max_shrink: (space.max_shrink_min, space.max_shrink_max),
            shift_range: (space.shift_range_min, space.shift_range_max),
        }
    }

    pub fn contains(&self, p: &TrialParams) -> bool {
        self.logo_ratio.0 <= p.logo_ratio
            && p.logo_ratio <= self.logo_ratio.1
            && self.claim_ratio.0 <= p.claim_ratio
            && p.claim_ratio <= self.claim_ratio.1
            && self.shrink_factor.0 <= p.shrink_factor
            && p.shrink_factor <= self.shrink_factor.1
            && self.max_shrink.0 <= p.max_shrink
            && p.max_shrink <= self.max_shrink.1
            && self.shift_range.0 <= p.shift_range
            && p.shift_range <= self.shift_range.1
    }
}

/// everything a trial needs that does not change between trials
pub struct PlacementTask<'a> {
    pub canvas: &'a RgbaImage,
    pub logo: &'a RgbaImage,
    pub claim: &'a RgbaImage,
    pub logo_anchor: Rect,
    pub claim_anchor: Rect,
    pub shift_step: i32,
}

impl PlacementTask<'_> {
    pub fn canvas_area(&self) -> u64 {
        self.canvas.width() as u64 * self.canvas.height() as u64
    }
}

/// result of evaluating one parameter vector: the composited canvas plus
/// where (if anywhere) each overlay landed
pub struct TrialLayout {
    pub canvas: RgbaImage,
    pub claim_box: Option<Rect>,
    pub logo_box: Option<Rect>,
}

impl TrialLayout {
    /// labelled boxes that actually got placed, claim first
    pub fn placed(&self) -> Vec<(&'static str, Rect)> {
        let mut out = Vec::with_capacity(2);
        if let Some(b) = self.claim_box {
            out.push(("value_claim", b));
        }
        if let Some(b) = self.logo_box {
            out.push(("brand_logo", b));
        }
        out
    }

    /// covered fraction of the canvas, with a hard 0.0 floor when either
    /// overlay failed to place. always in [0, 1].
    pub fn score(&self, canvas_area: u64) -> f64 {
        match (self.claim_box, self.logo_box) {
            (Some(claim), Some(logo)) => {
                (claim.area() + logo.area()) as f64 / canvas_area as f64
            }
            _ => 0.0,
        }
    }
}

/// evaluate one parameter vector on a fresh copy of the base canvas.
/// claim is placed first, then the logo against the claim's box.
pub fn run_trial(task: &PlacementTask<'_>, params: &TrialParams) -> TrialLayout {
    let mut canvas = task.canvas.clone();
    let canvas_area = task.canvas_area();
    let offsets = shift_offsets(params.shift_range, task.shift_step);
    let mut placed: Vec<Rect> = Vec::with_capacity(2);

    let claim_box = try_local_place(
        &mut canvas,
        task.claim,
        task.claim_anchor,
        &placed,
        params.claim_ratio,
        canvas_area,
        params.shrink_factor,
        params.max_shrink,
        &offsets,
    );
    if let Some(b) = claim_box {
        placed.push(b);
    }

    let logo_box = try_local_place(
        &mut canvas,
        task.logo,
        task.logo_anchor,
        &placed,
        params.logo_ratio,
        canvas_area,
        params.shrink_factor,
        params.max_shrink,
        &offsets,
    );

    TrialLayout {
        canvas,
        claim_box,
        logo_box,
    }
}

/// run the full trial budget and return the best observed trial.
/// returns `None` only for a zero budget.
pub fn run_search(
    task: &PlacementTask<'_>,
    sampler: &mut dyn Sampler,
    trials: u32,
) -> Option<Trial> {
    let canvas_area = task.canvas_area();
    let mut history: Vec<Trial> = Vec::with_capacity(trials as usize);

    for i in 0..trials {
        let params = sampler.propose(&history);
        let layout = run_trial(task, &params);
        let score = layout.score(canvas_area);
        debug!("trial {i}: score {score:.4} for {params:?}");

        let improved = sampler.best().map_or(true, |b| score > b.score);
        sampler.observe(params, score);
        if improved && score > 0.0 {
            info!("trial {i}: new best score {score:.4}");
        }
        history.push(Trial { params, score });
    }

    sampler.best().copied()
}
