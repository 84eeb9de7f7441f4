// Train/test index splits for cross-validation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// One cross-validation split.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// K-fold splits over `n` samples.
///
/// Without a seed the folds are contiguous blocks in sample order. The first
/// `n % k` folds get one extra sample so fold sizes differ by at most one.
pub fn k_fold(n: usize, k: usize, shuffle_seed: Option<u64>) -> Vec<Split> {
    let k = k.clamp(1, n.max(1));
    let mut indices: Vec<usize> = (0..n).collect();
    if let Some(seed) = shuffle_seed {
        indices.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    let base = n / k;
    let extra = n % k;
    let mut splits = Vec::with_capacity(k);
    let mut start = 0;

    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        let test = indices[start..end].to_vec();
        let train = indices[..start]
            .iter()
            .chain(indices[end..].iter())
            .copied()
            .collect();
        splits.push(Split { train, test });
        start = end;
    }
    splits
}

/// K-fold splits that keep each fold's class balance close to the whole set.
///
/// Each class is shuffled and dealt round-robin across the folds.
pub fn stratified_k_fold(labels: &[f64], k: usize, seed: u64) -> Vec<Split> {
    let n = labels.len();
    let k = k.clamp(1, n.max(1));
    let mut rng = StdRng::seed_from_u64(seed);

    let mut positives: Vec<usize> = (0..n).filter(|&i| labels[i] > 0.5).collect();
    let mut negatives: Vec<usize> = (0..n).filter(|&i| labels[i] <= 0.5).collect();
    positives.shuffle(&mut rng);
    negatives.shuffle(&mut rng);

    let mut fold_of = vec![0usize; n];
    for (j, &i) in positives.iter().chain(negatives.iter()).enumerate() {
        fold_of[i] = j % k;
    }

    (0..k)
        .map(|fold| Split {
            train: (0..n).filter(|&i| fold_of[i] != fold).collect(),
            test: (0..n).filter(|&i| fold_of[i] == fold).collect(),
        })
        .collect()
}

/// A single shuffled holdout split with `test_fraction` of the samples held
/// out (at least one, at most `n - 1` when `n > 1`).
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Split {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let n_test = ((n as f64) * test_fraction.clamp(0.0, 1.0)).round() as usize;
    let n_test = if n > 1 { n_test.clamp(1, n - 1) } else { n_test.min(n) };

    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    Split { train, test }
}
