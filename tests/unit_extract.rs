// Unit tests for HTML tag extraction and the extraction cache.
//
// Tests the claim order (title, headings, meta, img, anchors, residual),
// script/style stripping, meta key handling, the boilerplate field, and the
// JSONL cache round trip through a temp directory.

use evergreen::config::Config;
use evergreen::data::{Boilerplate, Corpus, Page};
use evergreen::extract::cache::{extract_pages, load_or_extract, read_cache, write_cache};
use evergreen::extract::html::{boilerplate_only, extract_page};
use evergreen::extract::{clean_string, ExtractedPage};

fn bp(title: &str, body: &str) -> Boilerplate {
    Boilerplate {
        title: title.to_string(),
        url: String::new(),
        body: body.to_string(),
    }
}

fn page(urlid: u64, label: Option<u8>) -> Page {
    Page {
        urlid,
        url: format!("http://www.example.com/{urlid}"),
        domain: "example.com".to_string(),
        category: "business".to_string(),
        boilerplate: bp(&format!("title {urlid}"), "some body text"),
        label,
    }
}

const PAGE: &str = r#"
<html>
  <head>
    <title>Best  Banana Bread</title>
    <meta name="description" content="A moist loaf">
    <meta name="Keywords" content="baking, bread ,bananas">
    <meta property="og:title" content="Banana Bread Recipe">
    <style>.x { color: red }</style>
    <script>var tracking = true;</script>
  </head>
  <body>
    <h1>Banana Bread</h1>
    <h2>Ingredients</h2>
    <a href="/h"><h3>Linked heading</h3></a>
    <p>Mash the bananas.</p>
    <img src="a.jpg" alt="Sliced loaf" title="Loaf">
    <a href="/more">More recipes</a>
  </body>
</html>
"#;

// ============================================================
// clean_string
// ============================================================

#[test]
fn clean_string_lowercases_and_collapses_whitespace() {
    assert_eq!(clean_string("  Hello \n\t World  "), "hello world");
}

// ============================================================
// extract_page: tag fields
// ============================================================

#[test]
fn title_and_headings_are_extracted_and_cleaned() {
    let p = extract_page(1, PAGE, &Boilerplate::default());
    assert_eq!(p.field("title"), ["best banana bread"]);
    assert_eq!(p.field("h1"), ["banana bread"]);
    assert_eq!(p.field("h2"), ["ingredients"]);
    assert_eq!(p.field("h3"), ["linked heading"]);
}

#[test]
fn heading_inside_link_is_not_anchor_text() {
    let p = extract_page(1, PAGE, &Boilerplate::default());
    assert_eq!(p.field("a"), ["more recipes"]);
}

#[test]
fn meta_tags_use_property_or_name() {
    let p = extract_page(1, PAGE, &Boilerplate::default());
    assert_eq!(p.field("meta-description"), ["a moist loaf"]);
    assert_eq!(p.field("meta-og:title"), ["banana bread recipe"]);
}

#[test]
fn meta_keywords_are_split_on_commas() {
    let p = extract_page(1, PAGE, &Boilerplate::default());
    assert_eq!(p.field("meta-keywords"), ["baking", "bread", "bananas"]);
}

#[test]
fn img_contributes_alt_and_title() {
    let p = extract_page(1, PAGE, &Boilerplate::default());
    assert_eq!(p.field("img"), ["sliced loaf", "loaf"]);
}

#[test]
fn other_holds_only_unclaimed_text() {
    let p = extract_page(1, PAGE, &Boilerplate::default());
    let other = p.field_text("other");
    assert!(other.contains("mash the bananas."));
    assert!(!other.contains("banana bread"));
    assert!(!other.contains("more recipes"));
}

#[test]
fn script_and_style_are_discarded() {
    let p = extract_page(1, PAGE, &Boilerplate::default());
    let everything: String = p
        .fields
        .values()
        .flatten()
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    assert!(!everything.contains("tracking"));
    assert!(!everything.contains("color"));
}

#[test]
fn boilerplate_field_is_title_then_body() {
    let p = extract_page(7, "<p>x</p>", &bp("Evergreen Title", "Body Text"));
    assert_eq!(p.urlid, 7);
    assert_eq!(p.field("boilerplate"), ["evergreen title", "body text"]);
}

#[test]
fn empty_fields_are_absent() {
    let p = extract_page(1, "<html><body></body></html>", &Boilerplate::default());
    assert!(p.field("title").is_empty());
    assert!(p.field("other").is_empty());
    assert!(p.field("boilerplate").is_empty());
}

#[test]
fn boilerplate_url_is_its_own_field() {
    let mut boilerplate = bp("Cake", "Mix flour");
    boilerplate.url = "Example com  Cake Recipes".to_string();
    let p = extract_page(1, "<p>x</p>", &boilerplate);
    assert_eq!(p.field("boilerplate-url"), ["example com cake recipes"]);
    assert_eq!(p.field("boilerplate"), ["cake", "mix flour"]);
}

#[test]
fn boilerplate_only_page_has_no_tag_fields() {
    let p = boilerplate_only(3, &bp("Title", ""));
    let names: Vec<&str> = p.fields.keys().map(String::as_str).collect();
    assert_eq!(names, ["boilerplate", "boilerplate-url"]);
    assert_eq!(p.field("boilerplate"), ["title"]);
}

#[test]
fn inline_markup_does_not_split_words() {
    let html = "<h1>Ban<em>ana</em> Bread</h1><p><span>T</span>he garden</p>";
    let p = extract_page(1, html, &Boilerplate::default());
    assert_eq!(p.field("h1"), ["banana bread"]);
    assert_eq!(p.field("other"), ["the garden"]);
}

// ============================================================
// Corpus extraction and cache
// ============================================================

#[test]
fn missing_html_falls_back_to_boilerplate() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("1"), "<title>Has HTML</title>").unwrap();

    let pages = [page(1, Some(1)), page(2, None)];
    let refs: Vec<&Page> = pages.iter().collect();
    let extracted = extract_pages(&refs, dir.path());

    assert_eq!(extracted.len(), 2);
    assert_eq!(extracted[0].urlid, 1);
    assert_eq!(extracted[0].field("title"), ["has html"]);
    assert_eq!(extracted[1].urlid, 2);
    assert!(extracted[1].field("title").is_empty());
    assert_eq!(extracted[1].field("boilerplate")[0], "title 2");
}

#[test]
fn page_fields_come_from_the_table_row() {
    let dir = tempfile::tempdir().unwrap();
    let mut unknown = page(2, None);
    unknown.category = "?".to_string();
    let pages = [page(1, Some(1)), unknown];
    let refs: Vec<&Page> = pages.iter().collect();
    let extracted = extract_pages(&refs, dir.path());

    assert_eq!(extracted[0].field("domain"), ["example.com"]);
    assert_eq!(extracted[0].field("category"), ["business"]);
    assert!(extracted[1].field("category").is_empty());
}

#[test]
fn cache_roundtrip_preserves_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processed").join("extracted_text.jsonl");
    let pages = vec![
        extract_page(1, PAGE, &bp("a", "b")),
        ExtractedPage::default(),
    ];

    write_cache(&path, &pages).unwrap();
    assert_eq!(read_cache(&path).unwrap(), pages);
}

#[test]
fn stale_cache_is_rebuilt() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_data_dir(dir.path());
    std::fs::create_dir_all(config.raw_content_dir()).unwrap();
    std::fs::write(config.raw_content_dir().join("10"), "<h1>Fresh</h1>").unwrap();

    // A cache for a different corpus
    write_cache(&config.extracted_cache_path(), &[ExtractedPage::default()]).unwrap();

    let corpus = Corpus {
        train: vec![page(10, Some(0))],
        test: vec![page(11, None)],
    };
    let pages = load_or_extract(&config, &corpus, false).unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].field("h1"), ["fresh"]);
    assert_eq!(read_cache(&config.extracted_cache_path()).unwrap(), pages);
}

#[test]
fn matching_cache_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_data_dir(dir.path());
    let corpus = Corpus {
        train: vec![page(5, Some(1))],
        test: vec![],
    };

    let mut cached = boilerplate_only(5, &bp("cached", ""));
    cached.fields.insert("h1".into(), vec!["from cache".into()]);
    write_cache(&config.extracted_cache_path(), &[cached.clone()]).unwrap();

    // No raw_content directory exists, so this only succeeds via the cache
    let pages = load_or_extract(&config, &corpus, false).unwrap();
    assert_eq!(pages, vec![cached]);
}
