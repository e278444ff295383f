// parameter samplers
//
// the driver talks to a `Sampler` so the proposal strategy is swappable:
// `RandomSampler` is plain uniform search, `TpeSampler` resamples around
// the elite quantile of the history with a narrowing perturbation width.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{ParamBounds, Trial, TrialParams};

/// pluggable proposal strategy for the search driver
pub trait Sampler {
    /// propose the next parameter vector, conditioned on past trials
    fn propose(&mut self, history: &[Trial]) -> TrialParams;
    /// record the score observed for a proposed vector
    fn observe(&mut self, params: TrialParams, score: f64);
    /// best observed trial so far
    fn best(&self) -> Option<&Trial>;
}

fn sample_uniform(rng: &mut Pcg32, b: &ParamBounds) -> TrialParams {
    TrialParams {
        logo_ratio: rng.random_range(b.logo_ratio.0..=b.logo_ratio.1),
        claim_ratio: rng.random_range(b.claim_ratio.0..=b.claim_ratio.1),
        shrink_factor: rng.random_range(b.shrink_factor.0..=b.shrink_factor.1),
        max_shrink: rng.random_range(b.max_shrink.0..=b.max_shrink.1),
        shift_range: rng.random_range(b.shift_range.0..=b.shift_range.1),
    }
}

fn track_best(best: &mut Option<Trial>, params: TrialParams, score: f64) {
    // strictly-better keeps the earliest trial on ties
    let improved = best.map_or(true, |b| score > b.score);
    if improved {
        *best = Some(Trial { params, score });
    }
}

/// uniform random search inside the bounds
pub struct RandomSampler {
    rng: Pcg32,
    bounds: ParamBounds,
    best: Option<Trial>,
}

impl RandomSampler {
    pub fn new(bounds: ParamBounds, seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            bounds,
            best: None,
        }
    }
}

impl Sampler for RandomSampler {
    fn propose(&mut self, _history: &[Trial]) -> TrialParams {
        sample_uniform(&mut self.rng, &self.bounds)
    }

    fn observe(&mut self, params: TrialParams, score: f64) {
        track_best(&mut self.best, params, score);
    }

    fn best(&self) -> Option<&Trial> {
        self.best.as_ref()
    }
}

/// sequential model-based sampler in the TPE spirit: after a uniform
/// warmup it picks a parent from the top `elite_fraction` of the history
/// and perturbs each dimension, narrowing the perturbation width as
/// evidence accumulates. a small exploration floor keeps proposing
/// uniform points so the elite set never traps the search.
pub struct TpeSampler {
    rng: Pcg32,
    bounds: ParamBounds,
    warmup: usize,
    elite_fraction: f64,
    best: Option<Trial>,
}

/// probability of a pure uniform proposal after warmup
const EXPLORE_FLOOR: f64 = 0.15;

impl TpeSampler {
    pub fn new(bounds: ParamBounds, seed: u64, warmup: u32, elite_fraction: f64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            bounds,
            warmup: warmup as usize,
            elite_fraction,
            best: None,
        }
    }

    fn perturb(&mut self, parent: TrialParams, width: f64) -> TrialParams {
        let b = self.bounds;
        TrialParams {
            logo_ratio: jitter_f64(&mut self.rng, parent.logo_ratio, b.logo_ratio, width),
            claim_ratio: jitter_f64(&mut self.rng, parent.claim_ratio, b.claim_ratio, width),
            shrink_factor: jitter_f64(&mut self.rng, parent.shrink_factor, b.shrink_factor, width),
            max_shrink: jitter_u32(&mut self.rng, parent.max_shrink, b.max_shrink, width),
            shift_range: jitter_i32(&mut self.rng, parent.shift_range, b.shift_range, width),
        }
    }
}

impl Sampler for TpeSampler {
    fn propose(&mut self, history: &[Trial]) -> TrialParams {
        if history.len() < self.warmup || self.rng.random::<f64>() < EXPLORE_FLOOR {
            return sample_uniform(&mut self.rng, &self.bounds);
        }

        let mut ranked: Vec<&Trial> = history.iter().collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let n_elite = ((history.len() as f64 * self.elite_fraction).ceil() as usize)
            .clamp(1, ranked.len());
        let parent = ranked[self.rng.random_range(0..n_elite)].params;

        // width starts at half the span and tightens with each trial
        let progress = (history.len() - self.warmup) as f64;
        let width = (0.5 / (1.0 + 0.25 * progress)).max(0.05);
        self.perturb(parent, width)
    }

    fn observe(&mut self, params: TrialParams, score: f64) {
        track_best(&mut self.best, params, score);
    }

    fn best(&self) -> Option<&Trial> {
        self.best.as_ref()
    }
}

fn jitter_f64(rng: &mut Pcg32, value: f64, (lo, hi): (f64, f64), width: f64) -> f64 {
    let span = (hi - lo) * width;
    if span <= 0.0 {
        return value.clamp(lo, hi);
    }
    (value + rng.random_range(-span..=span)).clamp(lo, hi)
}

fn jitter_u32(rng: &mut Pcg32, value: u32, (lo, hi): (u32, u32), width: f64) -> u32 {
    let span = (((hi - lo) as f64 * width).ceil() as i64).max(1);
    let jittered = value as i64 + rng.random_range(-span..=span);
    jittered.clamp(lo as i64, hi as i64) as u32
}

fn jitter_i32(rng: &mut Pcg32, value: i32, (lo, hi): (i32, i32), width: f64) -> i32 {
    let span = (((hi - lo) as f64 * width).ceil() as i64).max(1);
    let jittered = value as i64 + rng.random_range(-span..=span);
    jittered.clamp(lo as i64, hi as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SearchSpace;

    fn bounds() -> ParamBounds {
        ParamBounds::from_space(&SearchSpace::default(), 0.12, 0.20)
    }

    /// scripted objective: score peaks when shrink_factor is high
    fn fake_score(p: &TrialParams) -> f64 {
        p.shrink_factor
    }

    #[test]
    fn test_random_sampler_stays_in_bounds() {
        let b = bounds();
        let mut s = RandomSampler::new(b, 42);
        for _ in 0..200 {
            let p = s.propose(&[]);
            assert!(b.contains(&p), "{p:?}");
        }
    }

    #[test]
    fn test_tpe_sampler_stays_in_bounds() {
        let b = bounds();
        let mut s = TpeSampler::new(b, 42, 5, 0.25);
        let mut history = Vec::new();
        for _ in 0..100 {
            let p = s.propose(&history);
            assert!(b.contains(&p), "{p:?}");
            let score = fake_score(&p);
            s.observe(p, score);
            history.push(Trial { params: p, score });
        }
    }

    #[test]
    fn test_tpe_tracks_best() {
        let b = bounds();
        let mut s = TpeSampler::new(b, 1, 3, 0.25);
        let mut history = Vec::new();
        for _ in 0..50 {
            let p = s.propose(&history);
            let score = fake_score(&p);
            s.observe(p, score);
            history.push(Trial { params: p, score });
        }
        let best = s.best().expect("observed trials");
        let max = history.iter().map(|t| t.score).fold(f64::MIN, f64::max);
        assert_eq!(best.score, max);
    }

    #[test]
    fn test_tpe_adapts_toward_elites() {
        // with a shrink_factor-rewarding objective, late proposals should
        // average higher shrink_factor than pure uniform sampling would
        let b = bounds();
        let mut s = TpeSampler::new(b, 9, 5, 0.25);
        let mut history = Vec::new();
        let mut late = Vec::new();
        for i in 0..120 {
            let p = s.propose(&history);
            let score = fake_score(&p);
            s.observe(p, score);
            history.push(Trial { params: p, score });
            if i >= 60 {
                late.push(p.shrink_factor);
            }
        }
        let mean = late.iter().sum::<f64>() / late.len() as f64;
        let mid = (b.shrink_factor.0 + b.shrink_factor.1) / 2.0;
        assert!(mean > mid, "late mean {mean} not above midpoint {mid}");
    }

    #[test]
    fn test_same_seed_same_proposals() {
        let b = bounds();
        let mut s1 = TpeSampler::new(b, 1234, 4, 0.25);
        let mut s2 = TpeSampler::new(b, 1234, 4, 0.25);
        let mut h1 = Vec::new();
        let mut h2 = Vec::new();
        for _ in 0..30 {
            let p1 = s1.propose(&h1);
            let p2 = s2.propose(&h2);
            assert_eq!(p1, p2);
            let (a, b2) = (fake_score(&p1), fake_score(&p2));
            s1.observe(p1, a);
            s2.observe(p2, b2);
            h1.push(Trial { params: p1, score: a });
            h2.push(Trial { params: p2, score: b2 });
        }
    }

    #[test]
    fn test_best_keeps_earliest_on_tie() {
        let b = bounds();
        let mut s = RandomSampler::new(b, 5);
        let p1 = s.propose(&[]);
        let p2 = s.propose(&[]);
        s.observe(p1, 0.5);
        s.observe(p2, 0.5);
        assert_eq!(s.best().unwrap().params, p1);
    }
}
