/// run configuration for the placement search
/// every tunable the search or detector consumes lives here, so tests can
/// exercise the pipeline at different scales without touching code
use serde::{Deserialize, Serialize};

/// bounds of the 5-dimensional parameter space sampled per trial
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SearchSpace {
    /// half-width of the window searched around each requested area ratio
    pub ratio_window: f64,
    /// lower floor applied to sampled area ratios
    pub ratio_floor: f64,
    /// per-attempt linear shrink multiplier, sampled in [min, max]
    pub shrink_factor_min: f64,
    pub shrink_factor_max: f64,
    /// number of shrink attempts before giving up, sampled in [min, max]
    pub max_shrink_min: u32,
    pub max_shrink_max: u32,
    /// half-extent of the shift-offset grid in pixels, sampled in [min, max]
    pub shift_range_min: i32,
    pub shift_range_max: i32,
    /// spacing of the shift-offset grid in pixels
    pub shift_step: i32,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            ratio_window: 0.01,
            ratio_floor: 0.01,
            shrink_factor_min: 0.85,
            shrink_factor_max: 0.95,
            max_shrink_min: 2,
            max_shrink_max: 5,
            shift_range_min: 10,
            shift_range_max: 40,
            shift_step: 10,
        }
    }
}

/// top-level settings: trial budget, detection, and sampler behavior
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// total number of search trials
    pub trials: u32,
    /// seed for the sampler's RNG (placement itself is deterministic)
    pub seed: u64,
    /// minimum normalized cross-correlation score for an anchor hit
    pub detect_threshold: f32,
    /// uniform trials before the sampler starts proposing adaptively
    pub warmup_trials: u32,
    /// fraction of history treated as the elite set by the adaptive sampler
    pub elite_fraction: f64,
    pub space: SearchSpace,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trials: 30,
            seed: 0xB44DF17,
            detect_threshold: 0.75,
            warmup_trials: 8,
            elite_fraction: 0.25,
            space: SearchSpace::default(),
        }
    }
}
