// Extraction driver and its JSON-lines cache.
//
// Parsing ~10k HTML files takes a while, so the result is written to
// processed/extracted_text.jsonl (one ExtractedPage per line, train rows
// first). Any problem reading the cache falls back to a full re-parse.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use super::html::{boilerplate_only, extract_page};
use super::ExtractedPage;
use crate::config::Config;
use crate::data::{Corpus, Page};

/// Load the extraction cache, rebuilding it when it is missing, unreadable,
/// or out of step with the corpus.
pub fn load_or_extract(config: &Config, corpus: &Corpus, refresh: bool) -> Result<Vec<ExtractedPage>> {
    let cache_path = config.extracted_cache_path();

    if !refresh {
        match read_cache(&cache_path) {
            Ok(pages) if matches_corpus(&pages, corpus) => {
                info!(pages = pages.len(), path = %cache_path.display(), "Loaded extraction cache");
                return Ok(pages);
            }
            Ok(pages) => {
                warn!(
                    cached = pages.len(),
                    expected = corpus.len(),
                    "Extraction cache does not match the corpus, re-parsing"
                );
            }
            Err(e) => {
                info!(error = %e, "No usable extraction cache, parsing raw HTML");
            }
        }
    }

    config.require_raw_content()?;
    let pages: Vec<&Page> = corpus.pages().collect();
    let extracted = extract_pages(&pages, &config.raw_content_dir());
    write_cache(&cache_path, &extracted)?;
    info!(pages = extracted.len(), path = %cache_path.display(), "Wrote extraction cache");

    Ok(extracted)
}

/// Parse every page's raw HTML file. Output order matches input order.
pub fn extract_pages(pages: &[&Page], raw_dir: &Path) -> Vec<ExtractedPage> {
    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Parsing [{bar:30}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let extracted: Vec<ExtractedPage> = pages
        .par_iter()
        .map(|page| {
            let path = raw_dir.join(page.urlid.to_string());
            let mut result = match fs::read(&path) {
                Ok(bytes) => {
                    let html = String::from_utf8_lossy(&bytes);
                    extract_page(page.urlid, &html, &page.boilerplate)
                }
                Err(e) => {
                    warn!(urlid = page.urlid, error = %e, "Could not read raw HTML, using boilerplate only");
                    boilerplate_only(page.urlid, &page.boilerplate)
                }
            };
            result.add_page_fields(page);
            pb.inc(1);
            result
        })
        .collect();

    pb.finish_and_clear();
    extracted
}

/// Read a JSON-lines cache file.
pub fn read_cache(path: &Path) -> Result<Vec<ExtractedPage>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open extraction cache {}", path.display()))?;

    let mut pages = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let page: ExtractedPage = serde_json::from_str(&line)
            .with_context(|| format!("Corrupt extraction cache at line {}", i + 1))?;
        pages.push(page);
    }
    Ok(pages)
}

/// Write a JSON-lines cache file, creating its directory if needed.
pub fn write_cache(path: &Path, pages: &[ExtractedPage]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create extraction cache {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for page in pages {
        serde_json::to_writer(&mut out, page)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn matches_corpus(pages: &[ExtractedPage], corpus: &Corpus) -> bool {
    pages.len() == corpus.len()
        && pages
            .iter()
            .zip(corpus.pages())
            .all(|(extracted, page)| extracted.urlid == page.urlid)
}
