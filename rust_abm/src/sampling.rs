//! Randomised selection helpers. Everything here is a pure function of its
//! inputs and the generator, so seeded runs are reproducible.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a worker walks a list of vacancies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMethod {
    /// Uniform random permutation.
    Random,
    /// Highest wage first.
    Ordered,
}

impl std::str::FromStr for AccessMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Random" | "random" => Ok(AccessMethod::Random),
            "Ordered" | "ordered" => Ok(AccessMethod::Ordered),
            other => Err(format!("unknown access method '{other}'")),
        }
    }
}

/// Bernoulli draw. Rates at or above 1 always pass, at or below 0 never do.
pub fn bernoulli<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> bool {
    let r: f64 = rng.gen();
    r < rate
}

/// Pick an index with probability proportional to `weights`.
///
/// Negative and non-finite weights count as zero. When every weight is zero
/// the choice is uniform; an empty slice yields `None`. Weights whose total
/// overflows are rescaled by the largest one first.
pub fn weighted_choice<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let mut cleaned: Vec<f64> = weights
        .iter()
        .map(|&w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
        .collect();

    let total: f64 = cleaned.iter().sum();
    if !total.is_finite() {
        let largest = cleaned.iter().copied().fold(0.0, f64::max);
        for w in cleaned.iter_mut() {
            *w /= largest;
        }
    }

    match WeightedIndex::new(&cleaned) {
        Ok(dist) => Some(dist.sample(rng)),
        Err(_) => Some(rng.gen_range(0..weights.len())),
    }
}

/// Visiting order over `wages` for the given access method.
pub fn access_order<R: Rng + ?Sized>(rng: &mut R, method: AccessMethod, wages: &[f64]) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..wages.len()).collect();
    match method {
        AccessMethod::Random => perm.shuffle(rng),
        AccessMethod::Ordered => {
            perm.sort_by(|&a, &b| wages[b].total_cmp(&wages[a]));
        }
    }
    perm
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn bernoulli_extremes() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(bernoulli(&mut rng, 1.0));
            assert!(!bernoulli(&mut rng, 0.0));
        }
    }

    #[test]
    fn weighted_choice_empty_is_none() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(weighted_choice(&mut rng, &[]), None);
    }

    #[test]
    fn weighted_choice_never_picks_zero_weight() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let pick = weighted_choice(&mut rng, &[0.0, 5.0, 0.0, 1.0]).unwrap();
            assert!(pick == 1 || pick == 3);
        }
    }

    #[test]
    fn weighted_choice_all_zero_falls_back_to_uniform() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut seen = [false; 3];
        for _ in 0..300 {
            seen[weighted_choice(&mut rng, &[0.0, 0.0, f64::NAN]).unwrap()] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn weighted_choice_survives_overflowing_total() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 2];
        for _ in 0..200 {
            seen[weighted_choice(&mut rng, &[f64::MAX, f64::MAX]).unwrap()] = true;
        }
        assert_eq!(seen, [true, true]);

        for _ in 0..200 {
            let pick = weighted_choice(&mut rng, &[f64::MAX, 0.0, f64::MAX / 2.0]).unwrap();
            assert_ne!(pick, 1);
        }
    }

    #[test]
    fn ordered_access_is_wage_descending() {
        let mut rng = StdRng::seed_from_u64(5);
        let order = access_order(&mut rng, AccessMethod::Ordered, &[10.0, 20.0, 15.0]);
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn random_access_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut order = access_order(&mut rng, AccessMethod::Random, &[1.0; 8]);
        order.sort_unstable();
        assert_eq!(order, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_permutation() {
        let wages = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0];
        let a = access_order(&mut StdRng::seed_from_u64(9), AccessMethod::Random, &wages);
        let b = access_order(&mut StdRng::seed_from_u64(9), AccessMethod::Random, &wages);
        assert_eq!(a, b);
    }
}
