//! Frame deduplication.
//!
//! Every distinct 8×8 pixel array is stored once, in first-occurrence
//! order; each original frame index maps to a 1-based packed position.

use std::collections::HashMap;

use crate::error::{CompileError, CompileResult};
use crate::model::Frame;

#[derive(Debug, Clone)]
pub struct PackedFrames {
    unique: Vec<Vec<u8>>,
    /// `remap[original]` is the 1-based packed position.
    remap: Vec<usize>,
    has_alpha: bool,
}

/// Pack the frame pool.
///
/// Absent entries alias packed position 1, which the runtime expects even
/// though it draws whatever frame happened to come first.
pub fn pack(frames: &[Option<Frame>]) -> PackedFrames {
    let mut seen = HashMap::<&[u8], usize>::new();
    let mut unique = Vec::<Vec<u8>>::new();
    let mut remap = Vec::<usize>::with_capacity(frames.len());

    for (idx, frame) in frames.iter().enumerate() {
        match frame {
            Some(frame) => {
                let pos = *seen.entry(frame.data.as_slice()).or_insert_with(|| {
                    unique.push(frame.data.clone());
                    unique.len()
                });
                remap.push(pos);
            }
            None => {
                log::warn!("frame {} is absent, aliasing packed frame 1", idx);
                remap.push(1);
            }
        }
    }

    let has_alpha = unique
        .iter()
        .any(|data| data.iter().any(|&p| p == 2 || p == 3));

    log::info!(
        "Packed {} frames into {} unique{}",
        frames.len(),
        unique.len(),
        if has_alpha { " (alpha)" } else { "" }
    );

    PackedFrames {
        unique,
        remap,
        has_alpha,
    }
}

impl PackedFrames {
    /// Unique pixel arrays in packing order.
    pub fn unique(&self) -> &[Vec<u8>] {
        &self.unique
    }

    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn position(&self, original: usize) -> Option<usize> {
        self.remap.get(original).copied()
    }

    /// Translate a tile's frame list.
    pub fn positions(&self, tile: &str, frames: &[usize]) -> CompileResult<Vec<usize>> {
        frames
            .iter()
            .map(|&frame| {
                self.position(frame).ok_or_else(|| CompileError::UnknownFrame {
                    tile: tile.to_string(),
                    frame,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(fill: u8) -> Option<Frame> {
        Some(Frame {
            data: vec![fill; 64],
        })
    }

    #[test]
    fn test_identical_frames_share_position() {
        let packed = pack(&[frame(0), frame(1), frame(0)]);

        assert_eq!(packed.unique().len(), 2);
        assert_eq!(packed.position(0), Some(1));
        assert_eq!(packed.position(1), Some(2));
        assert_eq!(packed.position(2), Some(1), "same content, same position");
        assert!(!packed.has_alpha());
    }

    #[test]
    fn test_first_occurrence_order() {
        let mut odd = vec![0u8; 64];
        odd[5] = 1;
        let odd = Some(Frame { data: odd });

        let packed = pack(&[None, frame(1), odd.clone(), frame(1), frame(0)]);

        assert_eq!(packed.unique()[0], vec![1u8; 64]);
        assert_eq!(Some(&packed.unique()[1]), odd.as_ref().map(|f| &f.data));
        assert_eq!(packed.unique()[2], vec![0u8; 64]);
        assert_eq!(packed.position(4), Some(3));
    }

    #[test]
    fn test_absent_frame_aliases_first() {
        let packed = pack(&[frame(1), None]);
        assert_eq!(packed.position(1), Some(1));
        assert_eq!(packed.unique().len(), 1);
    }

    #[test]
    fn test_alpha_detected() {
        let packed = pack(&[frame(0), frame(3)]);
        assert!(packed.has_alpha());
    }

    #[test]
    fn test_unknown_frame_is_fatal() {
        let packed = pack(&[frame(0)]);
        assert_eq!(packed.positions("wall", &[0, 0]).expect("known"), vec![1, 1]);

        let err = packed.positions("wall", &[0, 7]).unwrap_err();
        assert!(matches!(err, CompileError::UnknownFrame { frame: 7, .. }));
    }
}
