// Raw-HTML tag extraction: per-tag text lists for every page.
//
// Each page's HTML is reduced to a map from field name (title, h1, ...,
// meta-description, other, boilerplate) to the cleaned strings found there.
// Feature-set expressions then pick and weight these fields.

pub mod cache;
pub mod html;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::Page;

/// Field holding the dataset's own title/body text.
pub const BOILERPLATE_FIELD: &str = "boilerplate";

/// The boilerplate's `url` component (the URL already split into words).
pub const BOILERPLATE_URL_FIELD: &str = "boilerplate-url";

/// Registered domain of the page URL, e.g. `bbc.co.uk`.
pub const DOMAIN_FIELD: &str = "domain";

/// The table's `alchemy_category` label.
pub const CATEGORY_FIELD: &str = "category";

/// Fields an expression may name that `all` does not expand to.
pub const EXTRA_FIELDS: [&str; 3] = [BOILERPLATE_URL_FIELD, DOMAIN_FIELD, CATEGORY_FIELD];

/// Prefix for meta tag fields, e.g. `meta-description`.
pub const META_PREFIX: &str = "meta-";

/// Every field `all` expands to in a feature-set expression.
pub const CANONICAL_FIELDS: [&str; 10] = [
    "title",
    "h1",
    "h2",
    "h3",
    "meta-description",
    "meta-keywords",
    "img",
    "a",
    "other",
    "boilerplate",
];

/// Extracted text of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub urlid: u64,
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ExtractedPage {
    /// Strings of one field; empty when the page has none.
    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All strings of one field joined into a single text.
    pub fn field_text(&self, name: &str) -> String {
        self.field(name).join(" ")
    }

    /// Add the fields that come from the table row instead of the HTML.
    /// The `?` category the tables use for unknown pages is left out.
    pub fn add_page_fields(&mut self, page: &Page) {
        let domain = clean_string(&page.domain);
        let category = clean_string(&page.category);

        let mut domains = Vec::new();
        if !domain.is_empty() {
            domains.push(domain);
        }
        let mut categories = Vec::new();
        if !category.is_empty() && category != "?" {
            categories.push(category);
        }

        self.fields.insert(DOMAIN_FIELD.to_string(), domains);
        self.fields.insert(CATEGORY_FIELD.to_string(), categories);
    }
}

/// Lowercase, collapse runs of whitespace and trim.
pub fn clean_string(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
