// Tab-separated table reader.

use std::path::Path;

use anyhow::{Context, Result};
use deunicode::deunicode;
use serde::Deserialize;
use tracing::warn;

use super::url::extract_domain;
use super::{Boilerplate, Page};

/// Columns we read from train.tsv / test.tsv. Every other column is ignored.
#[derive(Debug, Deserialize)]
struct RawRow {
    url: String,
    urlid: u64,
    boilerplate: String,
    #[serde(default)]
    alchemy_category: String,
    #[serde(default)]
    label: Option<u8>,
}

/// The boilerplate blob as it appears in the tables: any key may be
/// missing or null.
#[derive(Debug, Default, Deserialize)]
struct RawBoilerplate {
    title: Option<String>,
    url: Option<String>,
    body: Option<String>,
}

/// Parse a boilerplate JSON string, transliterating every field to ASCII.
///
/// Malformed JSON is not fatal: the page keeps an empty boilerplate and the
/// raw HTML still contributes its tag text.
pub fn parse_boilerplate(json: &str) -> Boilerplate {
    let raw: RawBoilerplate = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Malformed boilerplate JSON, using empty boilerplate");
            RawBoilerplate::default()
        }
    };

    let clean = |field: Option<String>| field.map(|s| deunicode(&s)).unwrap_or_default();

    Boilerplate {
        title: clean(raw.title),
        url: clean(raw.url),
        body: clean(raw.body),
    }
}

/// Load one table. Test tables have no `label` column.
pub fn load_table(path: &Path) -> Result<Vec<Page>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open table {}", path.display()))?;

    let mut pages = Vec::new();
    for (line, row) in reader.deserialize::<RawRow>().enumerate() {
        let row = row.with_context(|| {
            format!("Failed to parse row {} of {}", line + 2, path.display())
        })?;
        pages.push(page_from_row(row));
    }
    Ok(pages)
}

fn page_from_row(row: RawRow) -> Page {
    Page {
        domain: extract_domain(&row.url),
        boilerplate: parse_boilerplate(&row.boilerplate),
        category: row.alchemy_category,
        urlid: row.urlid,
        url: row.url,
        label: row.label,
    }
}
