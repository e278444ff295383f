mod assets;
mod detect;
mod geom;
mod place;
mod search;
mod settings;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::warn;

use crate::assets::Assets;
use crate::geom::Rect;
use crate::search::{
    run_search, run_trial, ParamBounds, PlacementTask, RandomSampler, Sampler, TpeSampler, Trial,
};
use crate::settings::Settings;

const DEFAULT_LOGO_RATIO: f64 = 0.12;
const DEFAULT_CLAIM_RATIO: f64 = 0.20;

#[derive(Parser, Debug)]
#[command(about = "Places brand logo and value-claim overlays on a canvas, tuned by randomized search")]
struct Args {
    /// Reference image the anchor positions are detected in
    #[arg(long, default_value = "original.png")]
    original: PathBuf,

    /// Background canvas the overlays are composited onto
    #[arg(long, default_value = "canvas.png")]
    canvas: PathBuf,

    /// Brand logo overlay (PNG with alpha)
    #[arg(long, default_value = "logo.png")]
    logo: PathBuf,

    /// Value-claim overlay (PNG with alpha)
    #[arg(long, default_value = "claim.png")]
    claim: PathBuf,

    /// Output path for the composited canvas
    #[arg(long, default_value = "final.png")]
    output: PathBuf,

    /// Target canvas-area fraction for the logo (falls back to 0.12 if malformed)
    #[arg(long)]
    logo_ratio: Option<String>,

    /// Target canvas-area fraction for the claim (falls back to 0.20 if malformed)
    #[arg(long)]
    claim_ratio: Option<String>,

    /// Trial budget for the placement search
    #[arg(long)]
    trials: Option<u32>,

    /// RNG seed for the parameter sampler
    #[arg(long)]
    seed: Option<u64>,

    /// Proposal strategy for the search
    #[arg(long, value_enum, default_value = "tpe")]
    sampler: SamplerKind,

    /// Optional path to write the best parameters as JSON
    #[arg(long)]
    params_out: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SamplerKind {
    /// adaptive elite-quantile resampling
    Tpe,
    /// uniform random search
    Random,
}

/// parse a user-supplied ratio, falling back to the documented default on
/// malformed or non-positive input
fn parse_ratio(raw: Option<&str>, default: f64, label: &str) -> f64 {
    match raw.map(str::trim).and_then(|s| s.parse::<f64>().ok()) {
        Some(v) if v > 0.0 => v,
        Some(v) => {
            warn!("{label} ratio {v} is not positive, using default {default}");
            default
        }
        None => {
            if raw.is_some() {
                warn!("invalid {label} ratio, using default {default}");
            }
            default
        }
    }
}

fn detect_anchor(
    assets: &Assets,
    template: &image::RgbaImage,
    label: &str,
    threshold: f32,
) -> anyhow::Result<Rect> {
    let boxes = detect::find_template_coords(&assets.reference, template, threshold);
    let anchor = boxes
        .first()
        .copied()
        .with_context(|| format!("could not detect the {label} in the reference image"))?;
    log::info!("{label} anchor detected at {anchor:?}");
    Ok(anchor)
}

fn print_report(best: &Trial, placed: &[(&'static str, Rect)], canvas_area: u64) {
    println!("Best parameters found:");
    println!("  logo_ratio: {:.4}", best.params.logo_ratio);
    println!("  claim_ratio: {:.4}", best.params.claim_ratio);
    println!("  shrink_factor: {:.4}", best.params.shrink_factor);
    println!("  max_shrink: {}", best.params.max_shrink);
    println!("  shift_range: {}", best.params.shift_range);
    println!("  score: {:.4}", best.score);

    for (label, rect) in placed {
        let area = rect.area();
        let pct = 100.0 * area as f64 / canvas_area as f64;
        println!("{label} final area = {area} px^2, i.e. {pct:.2}% of the canvas");
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = Settings::default();
    if let Some(trials) = args.trials {
        cfg.trials = trials;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }

    let base_logo_ratio = parse_ratio(args.logo_ratio.as_deref(), DEFAULT_LOGO_RATIO, "logo");
    let base_claim_ratio = parse_ratio(args.claim_ratio.as_deref(), DEFAULT_CLAIM_RATIO, "claim");

    let assets = Assets::load(&args.original, &args.canvas, &args.logo, &args.claim)?;

    // anchors come from the reference image once and never change
    let logo_anchor = detect_anchor(&assets, &assets.logo, "brand logo", cfg.detect_threshold)?;
    let claim_anchor = detect_anchor(&assets, &assets.claim, "value claim", cfg.detect_threshold)?;

    let task = PlacementTask {
        canvas: &assets.canvas,
        logo: &assets.logo,
        claim: &assets.claim,
        logo_anchor,
        claim_anchor,
        shift_step: cfg.space.shift_step,
    };

    let bounds = ParamBounds::from_space(&cfg.space, base_logo_ratio, base_claim_ratio);
    let mut sampler: Box<dyn Sampler> = match args.sampler {
        SamplerKind::Tpe => Box::new(TpeSampler::new(
            bounds,
            cfg.seed,
            cfg.warmup_trials,
            cfg.elite_fraction,
        )),
        SamplerKind::Random => Box::new(RandomSampler::new(bounds, cfg.seed)),
    };
    let best = run_search(&task, sampler.as_mut(), cfg.trials)
        .context("search finished without evaluating any trial")?;
    debug_assert!(bounds.contains(&best.params));

    // one clean replay with the winning parameters produces the saved output
    let layout = run_trial(&task, &best.params);
    layout
        .canvas
        .save(&args.output)
        .with_context(|| format!("failed to save output image {}", args.output.display()))?;
    println!("Final optimized image saved to {}", args.output.display());

    print_report(&best, &layout.placed(), task.canvas_area());

    if let Some(path) = &args.params_out {
        let json = serde_json::to_string_pretty(&best.params)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write parameters to {}", path.display()))?;
    }

    Ok(())
}
