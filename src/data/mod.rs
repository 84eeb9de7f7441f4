// Raw data loading: the competition's train/test tables.
//
// Each row describes one page: its URL, a numeric urlid that names the raw
// HTML file on disk, a JSON "boilerplate" blob with pre-extracted title and
// body text, and (for training rows) the evergreen label.

pub mod table;
pub mod url;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;

/// Pre-extracted text supplied with the dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Boilerplate {
    pub title: String,
    pub url: String,
    pub body: String,
}

/// One page from either table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub urlid: u64,
    pub url: String,
    /// Registered domain, e.g. `bbc.co.uk`
    pub domain: String,
    /// `alchemy_category`, `?` when unknown
    pub category: String,
    pub boilerplate: Boilerplate,
    /// 1 = evergreen, 0 = ephemeral; `None` for test rows
    pub label: Option<u8>,
}

/// Train and test pages, in file order.
///
/// Everything downstream indexes documents as "train rows first, then test
/// rows", so `pages()` and the feature matrices built from it share that order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub train: Vec<Page>,
    pub test: Vec<Page>,
}

impl Corpus {
    /// Load both tables from the configured data directory.
    pub fn load(config: &Config) -> Result<Self> {
        config.require_raw_tables()?;
        let train = table::load_table(&config.train_path())?;
        let test = table::load_table(&config.test_path())?;

        if train.is_empty() {
            anyhow::bail!("Training table {} has no rows", config.train_path().display());
        }
        if let Some(page) = train.iter().find(|p| p.label.is_none()) {
            anyhow::bail!("Training row for urlid {} has no label", page.urlid);
        }

        info!(train = train.len(), test = test.len(), "Loaded raw tables");
        Ok(Self { train, test })
    }

    /// Training labels as 0.0 / 1.0, in training-row order.
    pub fn labels(&self) -> Vec<f64> {
        self.train
            .iter()
            .map(|p| f64::from(p.label.unwrap_or(0)))
            .collect()
    }

    /// All pages, train rows followed by test rows.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.train.iter().chain(self.test.iter())
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
