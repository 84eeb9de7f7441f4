// System status display: data readiness, extraction cache, stored scores.

use anyhow::Result;

use crate::config::Config;
use crate::db::{self, queries};
use crate::pipeline::sweep::LAST_SWEEP_KEY;

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    println!("Data directory: {}", config.data_dir.display());

    let train = config.train_path();
    let test = config.test_path();
    println!(
        "  train.tsv: {}",
        if train.exists() { "present" } else { "missing" }
    );
    println!(
        "  test.tsv: {}",
        if test.exists() { "present" } else { "missing" }
    );

    let content_dir = config.raw_content_dir();
    match std::fs::read_dir(&content_dir) {
        Ok(entries) => println!("  raw_content: {} files", entries.count()),
        Err(_) => println!("  raw_content: missing (pages fall back to boilerplate text)"),
    }

    let cache = config.extracted_cache_path();
    match std::fs::metadata(&cache) {
        Ok(meta) => println!(
            "Extraction cache: {} ({})",
            cache.display(),
            format_bytes(meta.len())
        ),
        Err(_) => {
            println!("Extraction cache: not built");
            println!("  Run `evergreen extract` to build it");
        }
    }

    if !config.db_path.exists() {
        println!("Database: not initialized");
        println!("\nRun `evergreen init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&config.db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", config.db_path.display(), file_size);

    let conn = db::open(&config.db_path)?;
    let count = queries::score_count(&conn)?;
    println!("Stored scores: {count}");

    if let Some(best) = queries::get_ranked_scores(&conn, Some(1))?.first() {
        println!("Best score: {:.4} {}", best.auc, best.name);
    }

    match queries::get_run_state(&conn, LAST_SWEEP_KEY)? {
        Some(at) => println!("Last sweep: {at}"),
        None => println!("Last sweep: never"),
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
