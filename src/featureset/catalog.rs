// The feature-set expressions a full sweep evaluates.

use std::collections::HashSet;

use super::{ExprError, FeatureSet};

/// Expressions evaluated with every non-topic method.
pub const DATASETS: &[&str] = &[
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description * 10 + meta-keywords * 5",
    "max(all) + boilerplate * 10",
    "max(all) + meta-description * 10",
    "max(h1, title)",
    "title",
    "h1",
    "other",
    "meta-description",
    "meta-keywords",
    "h2",
    "h3",
    "img",
    "a",
    "boilerplate",
    "max(all)",
    "max(boilerplate, meta-description)",
    "max(boilerplate, meta-description, meta-keywords)",
    "max(all) + h1 * 5",
    "max(all) + title * 5",
    "max(all) + other * 5",
    "max(all) + meta-description * 5",
    "max(all) + boilerplate * 5",
    "max(all) + h1 * 10",
    "max(all) + title * 10",
    "max(all) + other * 10",
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description + meta-keywords + img + a + boilerplate",
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description + meta-keywords * 5 + img + a + boilerplate",
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description + meta-keywords * 10 + img + a + boilerplate",
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description + meta-keywords * 10 + a + boilerplate",
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description + meta-keywords * 10 + boilerplate",
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description * 10 + meta-keywords + boilerplate",
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description * 10 + meta-keywords * 10 + boilerplate * 0.5",
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description * 10 + meta-keywords * 10",
    "max(title, h1) * 10 + meta-description * 10 + meta-keywords * 10",
];

/// Expressions small enough to be worth fitting a topic model on.
pub const LDA_DATASETS: &[&str] = &[
    "max(all) + boilerplate * 10",
    "max(all) + meta-description * 10",
    "max(h1, title)",
    "max(title, h1) * 10 + max(title, h1, h2) + max(title, h1, h2, h3) + meta-description * 10 + meta-keywords * 10 + boilerplate * 5",
];

/// Every expression a full sweep visits, parsed, with duplicates dropped.
///
/// LDA_DATASETS entries missing from DATASETS are appended so that their
/// non-topic scores exist alongside the LDA ones.
pub fn sweep_datasets() -> Result<Vec<FeatureSet>, ExprError> {
    let mut seen = HashSet::new();
    let mut sets = Vec::new();
    for expr in DATASETS.iter().chain(LDA_DATASETS) {
        let set = FeatureSet::parse(expr)?;
        if seen.insert(set.to_string()) {
            sets.push(set);
        }
    }
    Ok(sets)
}
