//! Flat RGBA raster of `f32` samples.
//!
//! Samples are row-major with four consecutive values per pixel (R, G, B, A).
//! Addressing is unchecked; callers bounds-check coordinates before computing indices.

use crate::error::{DitherError, Result};

/// Maximum per-pixel channel spread still treated as achromatic.
pub const ACHROMATIC_TOLERANCE: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    samples: Vec<f32>,
}

impl PixelBuffer {
    /// Wrap decoded samples. Fails when `samples.len() != width * height * 4`.
    pub fn new(width: usize, height: usize, samples: Vec<f32>) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                DitherError::InvalidConfiguration(format!(
                    "buffer dimensions {width}x{height} overflow"
                ))
            })?;
        if samples.len() != expected {
            return Err(DitherError::BufferSizeMismatch {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// Build an RGBA buffer from interleaved (luma, alpha) pairs.
    pub fn from_luma_alpha(width: usize, height: usize, la: &[f32]) -> Result<Self> {
        let samples = la
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect();
        Self::new(width, height, samples)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    #[inline(always)]
    pub fn index_of(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * 4
    }

    /// Red sample at `index`. R stands in for the whole pixel (see [`Self::ensure_achromatic`]).
    #[inline(always)]
    pub fn red(&self, index: usize) -> f32 {
        self.samples[index]
    }

    /// Set R, G and B at `index`; alpha at `index + 3` is left alone.
    #[inline(always)]
    pub fn write_rgb(&mut self, index: usize, value: f32) {
        self.samples[index] = value;
        self.samples[index + 1] = value;
        self.samples[index + 2] = value;
    }

    /// Reject buffers whose G or B channel departs from R anywhere.
    pub fn ensure_achromatic(&self) -> Result<()> {
        for (i, px) in self.samples.chunks_exact(4).enumerate() {
            let r = px[0];
            if (r - px[1]).abs() > ACHROMATIC_TOLERANCE || (r - px[2]).abs() > ACHROMATIC_TOLERANCE
            {
                return Err(DitherError::NonAchromaticInput {
                    x: i % self.width,
                    y: i / self.width,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_length_mismatch() {
        let err = PixelBuffer::new(2, 2, vec![0.0; 15]).unwrap_err();
        assert_eq!(
            err,
            DitherError::BufferSizeMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn index_is_row_major_rgba() {
        let buf = PixelBuffer::new(3, 2, vec![0.0; 24]).unwrap();
        assert_eq!(buf.index_of(0, 0), 0);
        assert_eq!(buf.index_of(2, 0), 8);
        assert_eq!(buf.index_of(0, 1), 12);
        assert_eq!(buf.index_of(2, 1), 20);
    }

    #[test]
    fn write_rgb_leaves_alpha() {
        let mut buf = PixelBuffer::new(1, 1, vec![0.2, 0.2, 0.2, 0.7]).unwrap();
        buf.write_rgb(0, 1.0);
        assert_eq!(buf.samples(), &[1.0, 1.0, 1.0, 0.7]);
    }

    #[test]
    fn luma_alpha_expands_to_rgba() {
        let buf = PixelBuffer::from_luma_alpha(2, 1, &[0.25, 1.0, 0.5, 0.0]).unwrap();
        assert_eq!(buf.samples(), &[0.25, 0.25, 0.25, 1.0, 0.5, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn color_pixel_is_reported_with_coordinates() {
        let mut samples = vec![0.5; 2 * 2 * 4];
        samples[3 * 4 + 2] = 0.9;
        let buf = PixelBuffer::new(2, 2, samples).unwrap();
        assert_eq!(
            buf.ensure_achromatic(),
            Err(DitherError::NonAchromaticInput { x: 1, y: 1 })
        );
    }

    #[test]
    fn empty_buffer_is_valid() {
        let buf = PixelBuffer::new(0, 5, Vec::new()).unwrap();
        assert!(buf.ensure_achromatic().is_ok());
    }
}
