//! In-place error diffusion.
//!
//! Pixels are visited in raster order (rows top to bottom, left to right within a
//! row). Each pixel's red sample is quantized, the result is written to R, G and B,
//! and the quantization error is added to forward neighbours in the same buffer.
//! Later pixels therefore see error pushed by earlier ones; the scan must stay
//! sequential for results to be reproducible.

use crate::buffer::PixelBuffer;
use crate::error::{DitherError, Result};
use crate::kernel::DiffusionKernel;

#[derive(Clone, Copy, Debug, PartialEq)]
struct PropEntry {
    dx: i32,
    dy: i32,
    fraction: f32,
}

/// Per-offset error fractions, computed once per pass.
#[derive(Clone, Debug, PartialEq)]
pub struct FractionTable {
    entries: Vec<PropEntry>,
}

impl FractionTable {
    /// Fractions `weight / kernel.total` using the kernel's declared weights.
    pub fn new(kernel: &DiffusionKernel) -> Self {
        Self::build(kernel, kernel.offsets.iter().map(|o| o.weight))
    }

    /// Fractions for `weights` placed on the kernel's offsets (shape unchanged).
    /// `weights` must have one entry per offset.
    pub fn with_weights(kernel: &DiffusionKernel, weights: &[u32]) -> Result<Self> {
        if weights.len() != kernel.offsets.len() {
            return Err(DitherError::InvalidConfiguration(format!(
                "{} weights given for a kernel with {} offsets",
                weights.len(),
                kernel.offsets.len()
            )));
        }
        Ok(Self::build(kernel, weights.iter().copied()))
    }

    fn build(kernel: &DiffusionKernel, weights: impl Iterator<Item = u32>) -> Self {
        let total = kernel.total as f32;
        let entries = kernel
            .offsets
            .iter()
            .zip(weights)
            .map(|(o, w)| PropEntry {
                dx: o.dx,
                dy: o.dy,
                fraction: w as f32 / total,
            })
            .collect();
        Self { entries }
    }

    /// Share of a pixel's error handed to its neighbours.
    pub fn total_fraction(&self) -> f32 {
        self.entries.iter().map(|e| e.fraction).sum()
    }
}

/// Nearest level on the grid `{0, 1/factor, …, 1}`, ties to even.
#[inline(always)]
pub fn quantize(value: f32, factor: u32) -> f32 {
    let f = factor as f32;
    (f * value).round_ties_even().clamp(0.0, f) / f
}

/// True when the kernel offset `(dx, dy)` from `(x, y)` must be skipped.
#[inline(always)]
fn out_of_bounds(x: usize, y: usize, dx: i32, dy: i32, width: usize, height: usize) -> bool {
    if dx > 0 && x + dx as usize >= width {
        return true;
    }
    if dx < 0 && x <= dx.unsigned_abs() as usize {
        return true;
    }
    dy > 0 && y + dy as usize >= height
}

pub fn diffuse(buf: &mut PixelBuffer, factor: u32, table: &FractionTable) {
    let (width, height) = (buf.width(), buf.height());
    for y in 0..height {
        for x in 0..width {
            let i = buf.index_of(x, y);
            let value = buf.red(i);
            let quantized = quantize(value, factor);
            buf.write_rgb(i, quantized);

            let err = value - quantized;
            for entry in &table.entries {
                if out_of_bounds(x, y, entry.dx, entry.dy, width, height) {
                    continue;
                }
                let nx = (x as isize + entry.dx as isize) as usize;
                let ny = y + entry.dy as usize;
                let ni = buf.index_of(nx, ny);
                let v = buf.red(ni) + err * entry.fraction;
                buf.write_rgb(ni, v);
            }
        }
    }
}
