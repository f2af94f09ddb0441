//! Request validation and dispatch to the ordered or error-diffusion engine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::buffer::PixelBuffer;
use crate::diffusion::{FractionTable, diffuse};
use crate::error::{DitherError, Result};
use crate::kernel::Algorithm;
use crate::ordered::{OrderedMatrix, check_order, ordered_dither};
use crate::perturb::perturb_kernel;

#[derive(Debug, Clone, PartialEq)]
pub struct DitherRequest {
    pub algorithm: Algorithm,
    /// Quantization levels for diffusion kernels, matrix order for `ordered`.
    pub factor: u32,
    pub randomize_weights: bool,
    /// Seed for weight perturbation; `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl DitherRequest {
    /// Parse and validate raw parameters as they arrive from config or the CLI.
    pub fn new(algorithm: &str, factor: i64, randomize_weights: bool) -> Result<Self> {
        let algorithm: Algorithm = algorithm.parse()?;
        let factor = match u32::try_from(factor) {
            Ok(f) if f > 0 => f,
            _ => return Err(DitherError::InvalidFactor(factor)),
        };
        let req = Self {
            algorithm,
            factor,
            randomize_weights,
            seed: None,
        };
        req.validate()?;
        Ok(req)
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.factor == 0 {
            return Err(DitherError::InvalidFactor(0));
        }
        if self.algorithm == Algorithm::Ordered {
            check_order(self.factor as usize)?;
        }
        Ok(())
    }
}

/// Dither `buf` in place and hand it back for chaining.
///
/// All preconditions are checked before the first pixel is written; on error the
/// buffer is unchanged.
pub fn dither_image<'a>(
    buf: &'a mut PixelBuffer,
    request: &DitherRequest,
) -> Result<&'a mut PixelBuffer> {
    match request.seed {
        Some(seed) => dither_image_with_rng(buf, request, &mut StdRng::seed_from_u64(seed)),
        None => dither_image_with_rng(buf, request, &mut rand::rng()),
    }
}

/// [`dither_image`] with an injected random source for weight perturbation.
pub fn dither_image_with_rng<'a, R: Rng + ?Sized>(
    buf: &'a mut PixelBuffer,
    request: &DitherRequest,
    rng: &mut R,
) -> Result<&'a mut PixelBuffer> {
    request.validate()?;
    buf.ensure_achromatic()?;
    tracing::debug!(
        algorithm = %request.algorithm,
        factor = request.factor,
        randomize = request.randomize_weights,
        width = buf.width(),
        height = buf.height(),
        "dithering buffer"
    );
    let Some(kernel) = request.algorithm.kernel() else {
        let matrix = OrderedMatrix::build(request.factor as usize)?;
        ordered_dither(buf, &matrix);
        return Ok(buf);
    };
    let table = if request.randomize_weights {
        let weights = perturb_kernel(request.algorithm, kernel, rng)?;
        FractionTable::with_weights(kernel, &weights)?
    } else {
        FractionTable::new(kernel)
    };
    diffuse(buf, request.factor, &table);
    Ok(buf)
}
