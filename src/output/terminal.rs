// Colored terminal output for score tables and single evaluations.
//
// main.rs delegates all score formatting here.

use colored::Colorize;

use crate::db::models::{ScoreRecord, ScoreTier};
use crate::evaluate::CvOutcome;

/// Widest name shown before truncating.
const NAME_WIDTH: usize = 90;

/// Display the ranked score table.
pub fn display_score_table(scores: &[ScoreRecord]) {
    if scores.is_empty() {
        println!("No scores stored yet. Run `evergreen sweep` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Score Report ({} results) ===", scores.len()).bold()
    );
    println!();

    println!(
        "  {:>4}  {:>7}  {:<8}  {:>15}  {:>8}  {}",
        "Rank".dimmed(),
        "AUC".dimmed(),
        "Tier".dimmed(),
        "Folds".dimmed(),
        "Features".dimmed(),
        "Name".dimmed(),
    );
    println!("  {}", "-".repeat(78).dimmed());

    for (i, score) in scores.iter().enumerate() {
        let tier = ScoreTier::from_auc(score.auc);
        println!(
            "  {:>4}. {:>7.4}  {:<8}  {:>6.4} ± {:<6.4}  {:>8}  {}",
            i + 1,
            score.auc,
            colorize_tier(tier),
            score.fold_mean,
            score.fold_std,
            score.n_features,
            super::truncate_chars(&score.name, NAME_WIDTH),
        );
    }

    println!();

    let strong = scores
        .iter()
        .filter(|s| ScoreTier::from_auc(s.auc) == ScoreTier::Strong)
        .count();
    if strong > 0 {
        println!("  {} {} strong results (AUC >= 0.88)", "**".green().bold(), strong);
    }
}

/// Display the result of a single cross-validated evaluation.
pub fn display_evaluation(name: &str, n_features: usize, outcome: &CvOutcome) {
    println!("\n{}", format!("=== {name} ===").bold());
    println!(
        "  AUC: {:.4} ({})",
        outcome.auc,
        colorize_tier(ScoreTier::from_auc(outcome.auc))
    );
    println!(
        "  Folds: {:.4} ± {:.4} over {} folds",
        outcome.fold_mean,
        outcome.fold_std,
        outcome.fold_aucs.len()
    );
    println!("  Features: {n_features}");

    let folds: Vec<String> = outcome
        .fold_aucs
        .iter()
        .map(|auc| format!("{auc:.3}"))
        .collect();
    println!("  Per fold: {}", folds.join(" ").dimmed());
}

/// Colorize a score tier.
fn colorize_tier(tier: ScoreTier) -> colored::ColoredString {
    let label = tier.as_str();
    match tier {
        ScoreTier::Strong => label.green().bold(),
        ScoreTier::Good => label.green(),
        ScoreTier::Fair => label.yellow(),
        ScoreTier::Weak => label.dimmed(),
    }
}
