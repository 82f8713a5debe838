//! Sprite-sheet strips: 8 px wide, one 8×8 frame stacked under the other.
//!
//! Pixel 0 is background (white), 1 foreground (black); 2 and 3 are the
//! same colours fully transparent, and only exist in the alpha strip.

use image::{DynamicImage, GrayAlphaImage, GrayImage, LumaA};

use crate::error::{CompileError, CompileResult};
use crate::model::{FRAME_H, FRAME_PIXELS, FRAME_W};
use crate::processor::frames::PackedFrames;

/// Strip of the packed tile frames; grayscale+alpha if any frame uses it.
pub fn frame_strip(packed: &PackedFrames) -> CompileResult<DynamicImage> {
    strip(packed.unique(), packed.has_alpha())
}

/// Fixed-format strip for border pipes and font glyphs.
pub fn glyph_strip(glyphs: &[Vec<u8>]) -> CompileResult<DynamicImage> {
    strip(glyphs, false)
}

fn strip(frames: &[Vec<u8>], alpha: bool) -> CompileResult<DynamicImage> {
    for (idx, data) in frames.iter().enumerate() {
        validate(idx, data, alpha)?;
    }
    let height = FRAME_H * frames.len() as u32;

    if alpha {
        let mut img = GrayAlphaImage::new(FRAME_W, height);
        for_each_pixel(frames, |x, y, p| {
            let a = if p >= 2 { 0 } else { 0xff };
            img.put_pixel(x, y, LumaA([luminance(p), a]));
        });
        Ok(DynamicImage::ImageLumaA8(img))
    } else {
        let mut img = GrayImage::new(FRAME_W, height);
        for_each_pixel(frames, |x, y, p| {
            img.put_pixel(x, y, image::Luma([luminance(p)]));
        });
        Ok(DynamicImage::ImageLuma8(img))
    }
}

fn validate(frame: usize, data: &[u8], alpha: bool) -> CompileResult<()> {
    if data.len() != FRAME_PIXELS {
        return Err(CompileError::FrameSize {
            frame,
            len: data.len(),
        });
    }
    let max = if alpha { 3 } else { 1 };
    match data.iter().position(|&p| p > max) {
        Some(index) => Err(CompileError::BadPixel {
            frame,
            index,
            value: data[index],
        }),
        None => Ok(()),
    }
}

fn for_each_pixel(frames: &[Vec<u8>], mut put: impl FnMut(u32, u32, u8)) {
    for (n, data) in frames.iter().enumerate() {
        let top = n as u32 * FRAME_H;
        for (i, &p) in data.iter().enumerate() {
            let i = i as u32;
            put(i % FRAME_W, top + i / FRAME_W, p);
        }
    }
}

#[inline]
fn luminance(p: u8) -> u8 {
    0xff * (1 - p % 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Frame;
    use crate::processor::frames::pack;

    #[test]
    fn test_strip_dimensions_and_colours() {
        let mut dot = vec![0u8; 64];
        dot[9] = 1; // (1, 1)
        let packed = pack(&[
            Some(Frame { data: vec![0; 64] }),
            Some(Frame { data: dot }),
        ]);

        let img = frame_strip(&packed).expect("valid pixels");
        let gray = img.as_luma8().expect("no alpha used");

        assert_eq!((gray.width(), gray.height()), (8, 16));
        assert_eq!(gray.get_pixel(0, 0).0, [0xff]);
        assert_eq!(gray.get_pixel(1, 9).0, [0x00], "second frame, row 1");
        assert_eq!(gray.get_pixel(1, 1).0, [0xff]);
    }

    #[test]
    fn test_alpha_upgrades_whole_strip() {
        let mut clear = vec![1u8; 64];
        clear[0] = 2;
        clear[1] = 3;
        let packed = pack(&[Some(Frame { data: vec![1; 64] }), Some(Frame { data: clear })]);

        let img = frame_strip(&packed).expect("valid pixels");
        let la = img.as_luma_alpha8().expect("alpha strip");

        assert_eq!(la.get_pixel(0, 0).0, [0x00, 0xff]);
        assert_eq!(la.get_pixel(0, 8).0, [0xff, 0x00]);
        assert_eq!(la.get_pixel(1, 8).0, [0x00, 0x00]);
    }

    #[test]
    fn test_glyphs_reject_alpha_values() {
        let mut glyph = vec![0u8; 64];
        glyph[12] = 2;
        let err = glyph_strip(&[vec![0; 64], glyph]).unwrap_err();
        assert!(matches!(
            err,
            CompileError::BadPixel {
                frame: 1,
                index: 12,
                value: 2
            }
        ));
    }

    #[test]
    fn test_out_of_range_pixel_rejected_in_alpha_mode() {
        let packed = pack(&[Some(Frame { data: vec![3; 64] }), Some(Frame { data: vec![4; 64] })]);
        assert!(matches!(
            frame_strip(&packed),
            Err(CompileError::BadPixel { value: 4, .. })
        ));
    }

    #[test]
    fn test_wrong_frame_size() {
        assert!(matches!(
            glyph_strip(&[vec![0; 63]]),
            Err(CompileError::FrameSize { frame: 0, len: 63 })
        ));
    }
}
