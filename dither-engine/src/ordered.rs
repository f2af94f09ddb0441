//! Ordered dithering with a recursively built Bayer-style threshold matrix.
//!
//! `build(1)` is `[[0]]`. For `n > 1`, with `M = build(n / 2)`, the quadrants are
//!
//! ```text
//!   n²·M + 0 | n²·M + 2
//!   ---------+---------
//!   n²·M + 3 | n²·M + 1
//! ```
//!
//! and every entry of the assembled matrix is divided by `n²`. Entries are distinct
//! and lie in `[0, 1)`.

use crate::buffer::PixelBuffer;
use crate::error::{DitherError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMatrix {
    n: usize,
    cells: Vec<f32>,
}

/// Largest accepted matrix order; 1024² thresholds take 4 MiB.
pub const MAX_MATRIX_ORDER: usize = 1024;

/// Reject orders that are not a power of two or exceed [`MAX_MATRIX_ORDER`].
pub fn check_order(n: usize) -> Result<()> {
    if !n.is_power_of_two() {
        return Err(DitherError::InvalidConfiguration(format!(
            "ordered matrix order {n} is not a power of two"
        )));
    }
    if n > MAX_MATRIX_ORDER {
        return Err(DitherError::InvalidConfiguration(format!(
            "ordered matrix order {n} exceeds {MAX_MATRIX_ORDER}"
        )));
    }
    Ok(())
}

impl OrderedMatrix {
    /// Build the `n`×`n` matrix. `n` must be a power of two no larger than
    /// [`MAX_MATRIX_ORDER`].
    pub fn build(n: usize) -> Result<Self> {
        check_order(n)?;
        Ok(Self::build_unchecked(n))
    }

    fn build_unchecked(n: usize) -> Self {
        if n == 1 {
            return Self {
                n: 1,
                cells: vec![0.0],
            };
        }
        let half = Self::build_unchecked(n / 2);
        let h = half.n;
        let scale = (n * n) as f32;
        let mut cells = vec![0.0f32; n * n];
        for row in 0..h {
            for col in 0..h {
                let base = scale * half.cells[row * h + col];
                cells[row * n + col] = base / scale;
                cells[row * n + col + h] = (base + 2.0) / scale;
                cells[(row + h) * n + col] = (base + 3.0) / scale;
                cells[(row + h) * n + col + h] = (base + 1.0) / scale;
            }
        }
        Self { n, cells }
    }

    /// Side length.
    pub fn order(&self) -> usize {
        self.n
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.cells[row * self.n + col]
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }
}

/// Threshold every pixel against the tiled matrix: R above `matrix[x mod n][y mod n]`
/// becomes white (1), anything else black (0). Alpha is untouched.
pub fn ordered_dither(buf: &mut PixelBuffer, matrix: &OrderedMatrix) {
    let n = matrix.order();
    for x in 0..buf.width() {
        for y in 0..buf.height() {
            let i = x % n;
            let j = y % n;
            let idx = buf.index_of(x, y);
            let value = if buf.red(idx) > matrix.get(i, j) {
                1.0
            } else {
                0.0
            };
            buf.write_rgb(idx, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> PixelBuffer {
        let mut samples = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                let v = f(x, y);
                samples.extend([v, v, v, 0.5]);
            }
        }
        PixelBuffer::new(width, height, samples).unwrap()
    }

    #[test]
    fn order_one_is_zero() {
        let m = OrderedMatrix::build(1).unwrap();
        assert_eq!(m.cells(), &[0.0]);
    }

    #[test]
    fn order_two_is_canonical() {
        let m = OrderedMatrix::build(2).unwrap();
        assert_eq!(m.get(0, 0), 0.0);
        assert_eq!(m.get(0, 1), 0.5);
        assert_eq!(m.get(1, 0), 0.75);
        assert_eq!(m.get(1, 1), 0.25);
    }

    #[test]
    fn order_four_matches_recursion() {
        let m = OrderedMatrix::build(4).unwrap();
        #[rustfmt::skip]
        let expected = [
            0.0,    0.5,    0.125,  0.625,
            0.75,   0.25,   0.875,  0.375,
            0.1875, 0.6875, 0.0625, 0.5625,
            0.9375, 0.4375, 0.8125, 0.3125,
        ];
        assert_eq!(m.cells(), &expected);
    }

    #[test]
    fn entries_are_distinct_and_in_unit_range() {
        for n in [1usize, 2, 4, 8, 16, 32] {
            let m = OrderedMatrix::build(n).unwrap();
            assert_eq!(m.cells().len(), n * n);
            let mut sorted = m.cells().to_vec();
            assert!(sorted.iter().all(|&v| (0.0..1.0).contains(&v)), "n={n}");
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            sorted.dedup();
            assert_eq!(sorted.len(), n * n, "n={n} has duplicate thresholds");
        }
    }

    #[test]
    fn non_power_of_two_is_rejected() {
        for n in [0usize, 3, 6, 12] {
            assert!(matches!(
                OrderedMatrix::build(n),
                Err(DitherError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn orders_above_limit_are_rejected() {
        for n in [MAX_MATRIX_ORDER * 2, 1 << 31, 1 << 40] {
            assert!(matches!(
                OrderedMatrix::build(n),
                Err(DitherError::InvalidConfiguration(_))
            ));
        }
        assert!(check_order(MAX_MATRIX_ORDER).is_ok());
    }

    #[test]
    fn output_is_binary_and_alpha_kept() {
        let mut buf = gray(13, 7, |x, y| ((x * 7 + y * 3) % 11) as f32 / 10.0);
        let m = OrderedMatrix::build(4).unwrap();
        ordered_dither(&mut buf, &m);
        for px in buf.samples().chunks_exact(4) {
            assert!(px[0] == 0.0 || px[0] == 1.0);
            assert_eq!(px[0], px[1]);
            assert_eq!(px[0], px[2]);
            assert_eq!(px[3], 0.5);
        }
    }

    #[test]
    fn threshold_uses_x_as_first_index() {
        // 0.6 clears (0,1)=0.5 but not (1,0)=0.75.
        let mut buf = gray(2, 2, |_, _| 0.6);
        let m = OrderedMatrix::build(2).unwrap();
        ordered_dither(&mut buf, &m);
        let r = |x, y| buf.red(buf.index_of(x, y));
        assert_eq!(r(0, 0), 1.0);
        assert_eq!(r(0, 1), 1.0);
        assert_eq!(r(1, 0), 0.0);
        assert_eq!(r(1, 1), 1.0);
    }

    #[test]
    fn second_pass_is_idempotent() {
        let mut buf = gray(9, 9, |x, y| (x + y) as f32 / 16.0);
        let m = OrderedMatrix::build(8).unwrap();
        ordered_dither(&mut buf, &m);
        let once = buf.clone();
        ordered_dither(&mut buf, &m);
        assert_eq!(buf, once);
    }

    #[test]
    fn matrix_tiles_over_larger_buffers() {
        let mut buf = gray(6, 6, |_, _| 0.3);
        let m = OrderedMatrix::build(2).unwrap();
        ordered_dither(&mut buf, &m);
        for y in 0..6 {
            for x in 0..6 {
                let a = buf.red(buf.index_of(x, y));
                let b = buf.red(buf.index_of(x % 2, y % 2));
                assert_eq!(a, b);
            }
        }
    }
}
