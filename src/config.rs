use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;

/// Default number of cross-validation folds.
pub const DEFAULT_FOLDS: usize = 10;

/// Default RNG seed for shuffling, SVD projections and LDA sampling.
pub const DEFAULT_SEED: u64 = 4;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// value has a default so a fresh checkout with a `./data` directory works
/// without any configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the data layout: `raw/` holds the competition inputs,
    /// `processed/` holds everything we derive from them.
    pub data_dir: PathBuf,
    /// SQLite score store (defaults to `<data>/processed/evergreen.db`)
    pub db_path: PathBuf,
    /// Number of cross-validation folds
    pub folds: usize,
    /// Seed for every random step in the pipeline
    pub seed: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let data_dir = env::var("EVERGREEN_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let db_path = env::var("EVERGREEN_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("processed").join("evergreen.db"));

        let folds = match env::var("EVERGREEN_FOLDS") {
            Ok(v) => v
                .parse()
                .map_err(|_| anyhow::anyhow!("EVERGREEN_FOLDS must be an integer, got {v:?}"))?,
            Err(_) => DEFAULT_FOLDS,
        };
        if folds < 2 {
            anyhow::bail!("EVERGREEN_FOLDS must be at least 2, got {folds}");
        }

        let seed = match env::var("EVERGREEN_SEED") {
            Ok(v) => v
                .parse()
                .map_err(|_| anyhow::anyhow!("EVERGREEN_SEED must be an integer, got {v:?}"))?,
            Err(_) => DEFAULT_SEED,
        };

        Ok(Self {
            data_dir,
            db_path,
            folds,
            seed,
        })
    }

    /// Build a config rooted at an explicit directory (used by tests).
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            db_path: data_dir.join("processed").join("evergreen.db"),
            data_dir,
            folds: DEFAULT_FOLDS,
            seed: DEFAULT_SEED,
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn train_path(&self) -> PathBuf {
        self.raw_dir().join("train.tsv")
    }

    pub fn test_path(&self) -> PathBuf {
        self.raw_dir().join("test.tsv")
    }

    /// Directory of raw HTML files, one per page, named by urlid.
    pub fn raw_content_dir(&self) -> PathBuf {
        self.raw_dir().join("raw_content")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    pub fn extracted_cache_path(&self) -> PathBuf {
        self.processed_dir().join("extracted_text.jsonl")
    }

    /// Check that the train and test tables exist.
    /// Call this before any command that loads the corpus.
    pub fn require_raw_tables(&self) -> Result<()> {
        for path in [self.train_path(), self.test_path()] {
            if !path.is_file() {
                anyhow::bail!(
                    "Raw table not found at {}\n\
                     Download train.tsv and test.tsv from the competition page into {}\n\
                     or point EVERGREEN_DATA_DIR at an existing data directory.",
                    path.display(),
                    self.raw_dir().display()
                );
            }
        }
        Ok(())
    }

    /// Check that the raw HTML directory exists.
    /// Only needed when the extraction cache has to be (re)built.
    pub fn require_raw_content(&self) -> Result<()> {
        let dir = self.raw_content_dir();
        if !dir.is_dir() {
            anyhow::bail!(
                "Raw HTML directory not found at {}\n\
                 Unpack raw_content.zip there before running `evergreen extract`.",
                dir.display()
            );
        }
        Ok(())
    }
}
