//! Random redistribution of a kernel's weight budget across its fixed offsets.

use rand::Rng;

use crate::error::{DitherError, Result};
use crate::kernel::{Algorithm, DiffusionKernel};

/// Upper bound for a single drawn weight.
pub const MAX_SINGLE_WEIGHT: u32 = 8;

/// Split `budget` into `count` weights, each at least 1, summing exactly to `budget`.
///
/// Offsets are visited in order. Once the remaining budget no longer exceeds the
/// number of offsets still to fill, each of them gets 1. Otherwise a weight is drawn
/// uniformly from `1..=min(remaining - 1, MAX_SINGLE_WEIGHT)`, further capped so every
/// later offset can still receive 1. The last offset takes whatever budget is left.
pub fn random_weights<R: Rng + ?Sized>(budget: u32, count: usize, rng: &mut R) -> Result<Vec<u32>> {
    let slots = u32::try_from(count)
        .map_err(|_| DitherError::InvalidConfiguration(format!("{count} offsets is too many")))?;
    if budget < slots {
        return Err(DitherError::InvalidConfiguration(format!(
            "weight budget {budget} cannot give {count} offsets a weight of at least 1"
        )));
    }
    let mut weights = Vec::with_capacity(count);
    let mut remaining = budget;
    for idx in 0..slots {
        let left = slots - idx;
        if remaining <= left {
            weights.extend(std::iter::repeat_n(1, left as usize));
            break;
        }
        if left == 1 {
            weights.push(remaining);
            break;
        }
        let hi = (remaining - 1)
            .min(MAX_SINGLE_WEIGHT)
            .min(remaining - (left - 1));
        let w = rng.random_range(1..=hi);
        weights.push(w);
        remaining -= w;
    }
    Ok(weights)
}

/// Perturbed weights for `algorithm`'s kernel.
///
/// The budget is the declared weight sum, i.e. the kernel total minus 2 for Atkinson,
/// so a perturbed kernel diffuses the same share of error as the fixed one.
pub fn perturb_kernel<R: Rng + ?Sized>(
    algorithm: Algorithm,
    kernel: &DiffusionKernel,
    rng: &mut R,
) -> Result<Vec<u32>> {
    let budget = match algorithm {
        Algorithm::Atkinson => kernel.total - 2,
        _ => kernel.total,
    };
    let weights = random_weights(budget, kernel.offsets.len(), rng)?;
    tracing::trace!(algorithm = %algorithm, budget, weights = ?weights, "perturbed kernel weights");
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn weights_are_positive_and_sum_to_budget() {
        let mut rng = StdRng::seed_from_u64(7);
        for count in 1..=12usize {
            for budget in count as u32..=64 {
                for _ in 0..20 {
                    let w = random_weights(budget, count, &mut rng).unwrap();
                    assert_eq!(w.len(), count);
                    assert!(w.iter().all(|&v| v >= 1), "{w:?}");
                    assert_eq!(w.iter().sum::<u32>(), budget, "{w:?}");
                }
            }
        }
    }

    #[test]
    fn tight_budget_gives_all_ones() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_weights(6, 6, &mut rng).unwrap(), vec![1; 6]);
        assert_eq!(random_weights(1, 1, &mut rng).unwrap(), vec![1]);
    }

    #[test]
    fn draws_respect_single_weight_cap() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let w = random_weights(48, 12, &mut rng).unwrap();
            let (last, head) = w.split_last().unwrap();
            assert!(head.iter().all(|&v| v <= MAX_SINGLE_WEIGHT), "{w:?}");
            assert!(*last >= 1);
        }
    }

    #[test]
    fn budget_below_count_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            random_weights(3, 4, &mut rng),
            Err(DitherError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn same_seed_same_weights() {
        let kernel = Algorithm::Stucki.kernel().unwrap();
        let a = perturb_kernel(Algorithm::Stucki, kernel, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = perturb_kernel(Algorithm::Stucki, kernel, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn atkinson_budget_is_reduced() {
        let kernel = Algorithm::Atkinson.kernel().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let w = perturb_kernel(Algorithm::Atkinson, kernel, &mut rng).unwrap();
        assert_eq!(w.iter().sum::<u32>(), 6);
    }
}
