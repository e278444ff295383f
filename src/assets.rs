// input asset loading
//
// four raster assets drive a run: the reference image (where the anchors
// are detected), the blank canvas, and the two overlays. any of them
// failing to load aborts the run.

use std::path::Path;

use anyhow::Context;
use image::RgbaImage;

pub struct Assets {
    /// reference layout the anchors are detected in
    pub reference: RgbaImage,
    /// background the overlays get composited onto
    pub canvas: RgbaImage,
    pub logo: RgbaImage,
    pub claim: RgbaImage,
}

impl Assets {
    pub fn load(
        reference: &Path,
        canvas: &Path,
        logo: &Path,
        claim: &Path,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            reference: load_rgba(reference)?,
            canvas: load_rgba(canvas)?,
            logo: load_rgba(logo)?,
            claim: load_rgba(claim)?,
        })
    }
}

fn load_rgba(path: &Path) -> anyhow::Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to load input image {}", path.display()))?;
    Ok(img.to_rgba8())
}
