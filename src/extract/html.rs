// Tag extraction from a single HTML document.
//
// Mirrors the "extract the element once it has been read" approach: every
// text node belongs to at most one field, the first one in claim order that
// contains it. A heading inside a link therefore counts as heading text and
// not as anchor text, and whatever nobody claimed ends up in `other`.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

use super::{clean_string, ExtractedPage, BOILERPLATE_FIELD, BOILERPLATE_URL_FIELD, META_PREFIX};
use crate::data::Boilerplate;

// Selectors are compile-time constants; Selector::parse only fails on
// invalid CSS, so the unwraps below cannot fire at runtime.
static NON_TEXT: Lazy<Selector> = Lazy::new(|| Selector::parse("script, style").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static H3: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());
static META: Lazy<Selector> = Lazy::new(|| Selector::parse("meta").unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Extract every field of one page.
pub fn extract_page(urlid: u64, html: &str, boilerplate: &Boilerplate) -> ExtractedPage {
    let document = Html::parse_document(html);
    let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();

    // Script and style text is claimed up front so no field ever sees it.
    let mut claimed = HashSet::new();
    for el in document.select(&NON_TEXT) {
        for node in el.descendants() {
            claimed.insert(node.id());
        }
    }

    // Collect the not-yet-claimed text under an element and claim it. Nodes
    // are concatenated as-is so inline markup does not split words.
    let mut take_text = |el: ElementRef| -> String {
        let mut parts = Vec::new();
        for node in el.descendants() {
            if let Node::Text(text) = node.value() {
                if claimed.insert(node.id()) {
                    parts.push(&**text);
                }
            }
        }
        clean_string(&parts.concat())
    };

    for (name, selector) in [("title", &TITLE), ("h1", &H1), ("h2", &H2), ("h3", &H3)] {
        let texts: Vec<String> = document.select(selector).map(&mut take_text).collect();
        push_field(&mut fields, name, texts);
    }

    for el in document.select(&META) {
        let attrs = el.value();
        let Some(key) = attrs.attr("property").or_else(|| attrs.attr("name")) else {
            continue;
        };
        let Some(content) = attrs.attr("content") else {
            continue;
        };
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }

        let values: Vec<String> = if key == "keywords" {
            content.split(',').map(clean_string).collect()
        } else {
            vec![clean_string(content)]
        };
        push_field(&mut fields, &format!("{META_PREFIX}{key}"), values);
    }

    let img_texts: Vec<String> = document
        .select(&IMG)
        .flat_map(|el| {
            let attrs = el.value();
            [attrs.attr("alt"), attrs.attr("title")]
        })
        .flatten()
        .map(clean_string)
        .collect();
    push_field(&mut fields, "img", img_texts);

    let anchors: Vec<String> = document.select(&ANCHOR).map(&mut take_text).collect();
    push_field(&mut fields, "a", anchors);

    // Whatever no tag claimed is the page's residual text.
    let mut residual = Vec::new();
    for node in document.tree.root().descendants() {
        if let Node::Text(text) = node.value() {
            if !claimed.contains(&node.id()) {
                residual.push(&**text);
            }
        }
    }
    push_field(&mut fields, "other", vec![clean_string(&residual.concat())]);

    push_boilerplate(&mut fields, boilerplate);
    ExtractedPage { urlid, fields }
}

/// Page with only its boilerplate, for pages whose HTML could not be read.
pub fn boilerplate_only(urlid: u64, boilerplate: &Boilerplate) -> ExtractedPage {
    let mut fields = BTreeMap::new();
    push_boilerplate(&mut fields, boilerplate);
    ExtractedPage { urlid, fields }
}

/// The dataset's title and body, plus its url component as a field of its own.
fn push_boilerplate(fields: &mut BTreeMap<String, Vec<String>>, boilerplate: &Boilerplate) {
    push_field(
        fields,
        BOILERPLATE_FIELD,
        vec![
            clean_string(&boilerplate.title),
            clean_string(&boilerplate.body),
        ],
    );
    push_field(fields, BOILERPLATE_URL_FIELD, vec![clean_string(&boilerplate.url)]);
}

/// Append non-empty strings to a field. Fields with nothing to add are
/// still created so every page reports the same tag fields.
fn push_field(fields: &mut BTreeMap<String, Vec<String>>, name: &str, values: Vec<String>) {
    let entry = fields.entry(name.to_string()).or_default();
    entry.extend(values.into_iter().filter(|v| !v.is_empty()));
}
