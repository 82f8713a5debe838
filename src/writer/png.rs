//! Sprite-sheet images, named the way the runtime's image tables expect.
//!
//! Two-colour strips are written as 1-bit grayscale through the `png`
//! encoder; strips with alpha go through `image` unchanged.

use crate::model::ProcessedProject;
use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub const TILES_FILE: &str = "tiles-table-8-8.png";
pub const PIPE_FILE: &str = "pipe-table-8-8.png";
pub const FONT_FILE: &str = "font-table-8-8.png";

pub fn emit(project: &ProcessedProject, out_dir: &Path) -> Result<()> {
    save(&project.tiles_img, &out_dir.join(TILES_FILE))?;
    save(&project.pipe_img, &out_dir.join(PIPE_FILE))?;
    save(&project.font_img, &out_dir.join(FONT_FILE))?;
    Ok(())
}

fn save(img: &DynamicImage, path: &Path) -> Result<()> {
    // PNG cannot encode a zero-height image
    if img.height() == 0 {
        log::warn!("{} has no frames, not written", path.display());
        return Ok(());
    }
    match img {
        DynamicImage::ImageLuma8(gray) => save_1bit(gray, path),
        _ => img
            .save(path)
            .with_context(|| format!("Writing {}", path.display())),
    }
}

fn save_1bit(gray: &GrayImage, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Creating {}", path.display()))?;
    let mut enc = png::Encoder::new(BufWriter::new(file), gray.width(), gray.height());
    enc.set_color(png::ColorType::Grayscale);
    enc.set_depth(png::BitDepth::One);
    let mut writer = enc
        .write_header()
        .with_context(|| format!("PNG header for {}", path.display()))?;
    writer
        .write_image_data(&pack_bits(gray))
        .with_context(|| format!("Writing {}", path.display()))?;
    writer
        .finish()
        .with_context(|| format!("Finishing {}", path.display()))
}

/// Rows packed MSB first, each padded to a whole byte. Any non-zero
/// luminance is white.
fn pack_bits(gray: &GrayImage) -> Vec<u8> {
    let row_bytes = (gray.width() as usize).div_ceil(8);
    let mut out = vec![0u8; row_bytes * gray.height() as usize];
    for (x, y, px) in gray.enumerate_pixels() {
        if px.0[0] != 0 {
            out[y as usize * row_bytes + x as usize / 8] |= 0x80 >> (x % 8);
        }
    }
    out
}
