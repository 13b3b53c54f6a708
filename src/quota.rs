use std::{cmp::Ordering, collections::{BTreeMap, HashSet}};

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::debug;

use crate::{
    error::{GraderError, Result},
    types::Quota,
};

/// Grader names in the order they were given. Never empty, never repeats a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraderSet {
    graders: Vec<String>,
}

impl GraderSet {
    pub fn new(graders: Vec<String>) -> Result<Self> {
        if graders.is_empty() {
            return Err(GraderError::NoGraders);
        }
        let mut seen = HashSet::new();
        for grader in graders.iter() {
            if !seen.insert(grader.as_str()) {
                return Err(GraderError::DuplicateGrader(grader.clone()));
            }
        }
        Ok(GraderSet { graders })
    }

    pub fn names(&self) -> &[String] {
        &self.graders
    }

    pub fn len(&self) -> usize {
        self.graders.len()
    }
}

pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Splits `n` between `graders`. Unweighted quotas differ by at most one;
/// weighted quotas use largest-remainder apportionment.
pub fn compute_quota(
    graders: &[String],
    n: usize,
    weights: Option<&BTreeMap<String, f64>>,
    seed: Option<u64>,
) -> Result<Quota> {
    let graders = GraderSet::new(graders.to_vec())?;
    compute_quota_with(&mut rng_from_seed(seed), &graders, n, weights)
}

pub(crate) fn compute_quota_with<R: Rng>(
    rng: &mut R,
    graders: &GraderSet,
    n: usize,
    weights: Option<&BTreeMap<String, f64>>,
) -> Result<Quota> {
    let weights = match weights {
        Some(w) => resolve_weights(graders, w)?,
        None => None,
    };
    let counts = match weights {
        Some(w) => largest_remainder(rng, &w, n),
        None => even_split(rng, graders.len(), n),
    };

    let total: usize = counts.iter().sum();
    if total != n {
        return Err(GraderError::QuotaMismatch {
            expected: n,
            actual: total,
        });
    }

    let quota = Quota::new(graders.names().iter().cloned().zip(counts).collect());
    debug!(students = n, ?quota, "computed grader quota");
    Ok(quota)
}

/// Weights aligned to grader order. `None` when every weight is zero.
fn resolve_weights(
    graders: &GraderSet,
    weights: &BTreeMap<String, f64>,
) -> Result<Option<Vec<f64>>> {
    for (grader, weight) in weights.iter() {
        if !weight.is_finite() || *weight < 0.0 {
            return Err(GraderError::InvalidWeight {
                grader: grader.clone(),
                weight: *weight,
            });
        }
    }
    let aligned: Vec<f64> = graders
        .names()
        .iter()
        .map(|g| weights.get(g).copied().unwrap_or(0.0))
        .collect();
    let largest = aligned.iter().copied().fold(0.0, f64::max);
    if largest <= 0.0 {
        return Ok(None);
    }
    // Scaled to at most 1 so the sum stays finite for weights near f64::MAX.
    Ok(Some(aligned.iter().map(|w| w / largest).collect()))
}

fn even_split<R: Rng>(rng: &mut R, k: usize, n: usize) -> Vec<usize> {
    let (q, r) = (n / k, n % k);
    let mut order: Vec<usize> = (0..k).collect();
    order.shuffle(rng);
    let mut counts = vec![q; k];
    for i in order.into_iter().take(r) {
        counts[i] += 1;
    }
    counts
}

fn largest_remainder<R: Rng>(rng: &mut R, weights: &[f64], n: usize) -> Vec<usize> {
    let total: f64 = weights.iter().sum();
    let expected: Vec<f64> = weights.iter().map(|w| w / total * n as f64).collect();
    let mut counts: Vec<usize> = expected.iter().map(|e| e.floor() as usize).collect();
    let remainders: Vec<f64> = expected
        .iter()
        .zip(counts.iter())
        .map(|(e, b)| e - *b as f64)
        .collect();
    // One draw per grader, taken before sorting so the sequence never depends on ties.
    let tiebreak: Vec<f64> = (0..weights.len()).map(|_| rng.gen::<f64>()).collect();

    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|a, b| match remainders[*b].total_cmp(&remainders[*a]) {
        Ordering::Equal => tiebreak[*b].total_cmp(&tiebreak[*a]),
        other => other,
    });

    let seats = n.saturating_sub(counts.iter().sum());
    for i in order.into_iter().take(seats) {
        counts[i] += 1;
    }
    counts
}
