use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use evergreen::config::Config;
use evergreen::data::Corpus;
use evergreen::db::{self, queries};
use evergreen::evaluate::CvParams;
use evergreen::extract::cache::load_or_extract;
use evergreen::extract::ExtractedPage;
use evergreen::featureset::catalog;
use evergreen::featureset::FeatureSet;
use evergreen::output::{export, terminal};
use evergreen::pipeline::method::Method;
use evergreen::pipeline::{self, blend, sweep};

/// Evergreen: feature-set sweeps for evergreen vs. ephemeral web pages.
///
/// Extracts tag-level text from raw HTML, combines it through feature-set
/// expressions, and scores each combination with cross-validated logistic
/// regression.
#[derive(Parser)]
#[command(name = "evergreen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the score database
    Init,

    /// Parse the raw HTML pages into the extraction cache
    Extract {
        /// Re-parse even if a matching cache exists
        #[arg(long)]
        refresh: bool,
    },

    /// Evaluate every dataset expression with every method
    Sweep {
        /// Number of cross-validation folds (default: EVERGREEN_FOLDS or 10)
        #[arg(long)]
        folds: Option<usize>,

        /// Comma-separated methods (default: raw,tfidf,nostem,svd50,svd100,lda)
        #[arg(long, value_delimiter = ',')]
        methods: Option<Vec<String>>,

        /// Restrict the sweep to these expressions (repeatable)
        #[arg(long = "dataset")]
        datasets: Vec<String>,

        /// Use class-balanced shuffled folds
        #[arg(long)]
        stratified: bool,
    },

    /// Evaluate a single method on a single dataset expression
    Evaluate {
        /// Method: raw, tfidf, nostem, svd<k> or lda[<k>]
        #[arg(long)]
        method: String,

        /// Feature-set expression, e.g. "max(title, h1) * 10 + boilerplate"
        #[arg(long)]
        dataset: String,

        /// Store the result in the score database
        #[arg(long)]
        save: bool,

        /// Number of cross-validation folds
        #[arg(long)]
        folds: Option<usize>,

        /// Use class-balanced shuffled folds
        #[arg(long)]
        stratified: bool,
    },

    /// Show the ranked score table
    Report {
        /// Only show the best N results
        #[arg(long)]
        top: Option<u32>,

        /// Also write the full table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Write a submission file from one stored score
    Submit {
        /// Stored score name, e.g. "tfidf:max(all)"
        #[arg(long)]
        name: String,

        /// Output CSV path
        #[arg(long)]
        out: PathBuf,
    },

    /// Stack several stored scores into one submission
    Blend {
        /// Stored score names (repeatable)
        #[arg(long = "name", required = true)]
        names: Vec<String>,

        /// Output CSV path
        #[arg(long)]
        out: PathBuf,
    },

    /// Show system status (data, cache, stored scores)
    Status,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("evergreen=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing Evergreen database...");
            let conn = db::initialize(&config.db_path)?;
            let table_count = db::schema::table_count(&conn)?;
            println!("Database initialized at: {}", config.db_path.display());
            println!("Tables created: {table_count}");
            println!(
                "\nPlace train.tsv, test.tsv and raw_content/ under {}",
                config.raw_dir().display()
            );
            println!("\nThen run: evergreen extract");
        }

        Commands::Extract { refresh } => {
            let (corpus, pages) = load_pages(&config, refresh)?;
            let with_html = pages
                .iter()
                .filter(|p| !p.field("other").is_empty() || !p.field("title").is_empty())
                .count();
            println!(
                "Extracted {} pages ({} train, {} test), {} with HTML content",
                pages.len(),
                corpus.train.len(),
                corpus.test.len(),
                with_html,
            );
            println!("Cache: {}", config.extracted_cache_path().display());
        }

        Commands::Sweep {
            folds,
            methods,
            datasets,
            stratified,
        } => {
            let methods = match methods {
                Some(names) => names
                    .iter()
                    .map(|m| m.parse())
                    .collect::<Result<Vec<Method>>>()?,
                None => Method::sweep_defaults(),
            };
            let datasets = if datasets.is_empty() {
                catalog::sweep_datasets()?
            } else {
                datasets
                    .iter()
                    .map(|d| FeatureSet::parse(d).with_context(|| format!("Invalid dataset {d:?}")))
                    .collect::<Result<Vec<_>>>()?
            };

            let params = cv_params(&config, folds, stratified)?;
            let (corpus, pages) = load_pages(&config, false)?;
            let conn = db::initialize(&config.db_path)?;

            println!(
                "Sweeping {} datasets x {} methods ({} folds)...",
                datasets.len(),
                methods.len(),
                params.folds
            );
            let summary = sweep::run(&conn, &pages, &corpus.labels(), &datasets, &methods, &params)?;

            println!(
                "\n{}",
                format!(
                    "Sweep complete: {} evaluated, {} already stored, {} failed",
                    summary.evaluated, summary.skipped, summary.failed
                )
                .bold()
            );
            if summary.ineligible > 0 {
                println!(
                    "{}",
                    format!("  {} LDA pairs skipped (not in the LDA list)", summary.ineligible)
                        .dimmed()
                );
            }

            let top = queries::get_ranked_scores(&conn, Some(10))?;
            terminal::display_score_table(&top);
        }

        Commands::Evaluate {
            method,
            dataset,
            save,
            folds,
            stratified,
        } => {
            let method: Method = method.parse()?;
            let featureset = FeatureSet::parse(&dataset)
                .with_context(|| format!("Invalid dataset {dataset:?}"))?;
            let params = cv_params(&config, folds, stratified)?;
            let (corpus, pages) = load_pages(&config, false)?;

            let (features, outcome) =
                pipeline::evaluate_one(&pages, &corpus.labels(), &featureset, method, &params)?;
            let name = pipeline::score_name(method, &featureset);
            terminal::display_evaluation(&name, features.ncols(), &outcome);

            if save {
                let conn = db::initialize(&config.db_path)?;
                pipeline::save_outcome(&conn, method, &featureset, &features, &outcome)?;
                println!("\nSaved as {}", name.bold());
            }
        }

        Commands::Report { top, csv } => {
            let conn = db::open(&config.db_path)?;
            let scores = queries::get_ranked_scores(&conn, top)?;
            terminal::display_score_table(&scores);

            if let Some(path) = csv {
                let all = queries::get_ranked_scores(&conn, None)?;
                export::write_score_report(&path, &all)?;
                println!("Report written to {}", path.display());
            }
        }

        Commands::Submit { name, out } => {
            let conn = db::open(&config.db_path)?;
            let score = queries::get_score(&conn, &name)?
                .with_context(|| format!("No stored score named {name:?}"))?;
            let corpus = Corpus::load(&config)?;
            let urlids: Vec<u64> = corpus.test.iter().map(|p| p.urlid).collect();

            export::write_submission(&out, &urlids, &score.test_predictions)?;
            println!(
                "Wrote {} predictions from {} (AUC {:.4}) to {}",
                urlids.len(),
                name,
                score.auc,
                out.display()
            );
        }

        Commands::Blend { names, out } => {
            let conn = db::open(&config.db_path)?;
            let components = blend::load_components(&conn, &names)?;
            let corpus = Corpus::load(&config)?;
            let params = cv_params(&config, None, false)?;

            let outcome = blend::blend(&components, &corpus.labels(), &params)?;
            let urlids: Vec<u64> = corpus.test.iter().map(|p| p.urlid).collect();
            export::write_submission(&out, &urlids, &outcome.predictions)?;

            println!(
                "\n{}",
                format!("Blend of {} scores: AUC {:.4}", components.len(), outcome.auc).bold()
            );
            for component in &components {
                println!("  {:.4}  {}", component.auc, component.name.dimmed());
            }
            println!("Submission written to {}", out.display());
        }

        Commands::Status => {
            evergreen::status::show(&config)?;
        }
    }

    Ok(())
}

/// Load the tables and the extracted page text, rebuilding the cache if needed.
fn load_pages(config: &Config, refresh: bool) -> Result<(Corpus, Vec<ExtractedPage>)> {
    let corpus = Corpus::load(config)?;
    let pages = load_or_extract(config, &corpus, refresh)?;
    Ok((corpus, pages))
}

/// Cross-validation settings from config, overridden by command-line flags.
fn cv_params(config: &Config, folds: Option<usize>, stratified: bool) -> Result<CvParams> {
    let folds = folds.unwrap_or(config.folds);
    if folds < 2 {
        anyhow::bail!("--folds must be at least 2, got {folds}");
    }
    Ok(CvParams {
        folds,
        stratified,
        seed: config.seed,
        ..CvParams::default()
    })
}
