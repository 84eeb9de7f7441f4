// Unit tests for feature-set expressions.
//
// Covers the parser (precedence, whitespace, max groups, weights), the
// canonical Display form used in score names, error cases, and combine()
// semantics on hand-built term counts.

use std::collections::BTreeMap;

use evergreen::featureset::catalog::{sweep_datasets, DATASETS, LDA_DATASETS};
use evergreen::featureset::{ExprError, FeatureSet, Source, TermCounts};

fn counts(pairs: &[(&str, f64)]) -> TermCounts {
    pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
}

fn doc(fields: &[(&str, &[(&str, f64)])]) -> BTreeMap<String, TermCounts> {
    fields
        .iter()
        .map(|(name, pairs)| (name.to_string(), counts(pairs)))
        .collect()
}

// ============================================================
// Parsing
// ============================================================

#[test]
fn parses_single_field() {
    let set = FeatureSet::parse("title").unwrap();
    assert_eq!(set.terms().len(), 1);
    assert_eq!(set.terms()[0].source, Source::Field("title".into()));
    assert_eq!(set.terms()[0].weight, 1.0);
}

#[test]
fn parses_weighted_sum_of_max_groups() {
    let set = FeatureSet::parse("max(title, h1) * 10 + meta-description * 0.5").unwrap();
    assert_eq!(set.terms().len(), 2);
    assert_eq!(
        set.terms()[0].source,
        Source::Max(vec!["title".into(), "h1".into()])
    );
    assert_eq!(set.terms()[0].weight, 10.0);
    assert_eq!(set.terms()[1].source, Source::Field("meta-description".into()));
    assert_eq!(set.terms()[1].weight, 0.5);
}

#[test]
fn whitespace_is_insignificant() {
    let tight = FeatureSet::parse("max(title,h1)*10+boilerplate").unwrap();
    let loose = FeatureSet::parse("  max( title , h1 ) *  10 +   boilerplate ").unwrap();
    assert_eq!(tight, loose);
}

#[test]
fn field_names_are_case_insensitive() {
    let set = FeatureSet::parse("TITLE + Meta-Description").unwrap();
    assert_eq!(set.to_string(), "title + meta-description");
}

#[test]
fn arbitrary_meta_fields_are_accepted() {
    let set = FeatureSet::parse("meta-og:title * 2").unwrap();
    assert_eq!(set.fields(), vec!["meta-og:title".to_string()]);
}

// ============================================================
// Canonical Display
// ============================================================

#[test]
fn display_drops_unit_weights() {
    let set = FeatureSet::parse("title * 1 + h1 * 5").unwrap();
    assert_eq!(set.to_string(), "title + h1 * 5");
}

#[test]
fn bare_all_shares_the_max_all_name() {
    let bare = FeatureSet::parse("all + title").unwrap();
    let maxed = FeatureSet::parse("max(all) + title").unwrap();
    assert_eq!(bare, maxed);
    assert_eq!(bare.to_string(), "max(all) + title");
}

#[test]
fn negative_zero_weight_displays_as_zero() {
    let set = FeatureSet::parse("title * -0 + h1").unwrap();
    assert_eq!(set.to_string(), "title * 0 + h1");
    assert!(set.terms()[0].weight.is_sign_positive());
}

#[test]
fn display_is_a_fixed_point() {
    for expr in DATASETS {
        let once = FeatureSet::parse(expr).unwrap().to_string();
        let twice = FeatureSet::parse(&once).unwrap().to_string();
        assert_eq!(once, twice, "canonical form of {expr:?} is unstable");
    }
}

#[test]
fn catalog_entries_are_already_canonical() {
    for expr in DATASETS.iter().chain(LDA_DATASETS) {
        assert_eq!(FeatureSet::parse(expr).unwrap().to_string(), *expr);
    }
}

#[test]
fn sweep_datasets_are_unique_and_include_lda_list() {
    let sets = sweep_datasets().unwrap();
    let names: Vec<String> = sets.iter().map(|s| s.to_string()).collect();
    for (i, name) in names.iter().enumerate() {
        assert!(!names[i + 1..].contains(name), "{name} listed twice");
    }
    for expr in LDA_DATASETS {
        assert!(names.iter().any(|n| n == expr), "{expr} missing from sweep");
    }
}

// ============================================================
// Errors
// ============================================================

#[test]
fn empty_input_is_rejected() {
    assert_eq!(FeatureSet::parse("   "), Err(ExprError::Empty));
}

#[test]
fn unknown_field_is_rejected() {
    assert_eq!(
        FeatureSet::parse("title + body"),
        Err(ExprError::UnknownField("body".into()))
    );
}

#[test]
fn empty_max_is_rejected() {
    assert_eq!(FeatureSet::parse("max()"), Err(ExprError::EmptyMax));
}

#[test]
fn negative_weight_is_rejected() {
    assert!(matches!(
        FeatureSet::parse("title * -2"),
        Err(ExprError::InvalidWeight(_)) | Err(ExprError::UnexpectedChar { .. })
    ));
}

#[test]
fn non_numeric_weight_is_rejected() {
    assert!(FeatureSet::parse("title * lots").is_err());
}

#[test]
fn trailing_plus_is_rejected() {
    assert!(matches!(
        FeatureSet::parse("title +"),
        Err(ExprError::UnexpectedEnd { .. })
    ));
}

#[test]
fn unclosed_max_is_rejected() {
    assert!(FeatureSet::parse("max(title, h1").is_err());
}

// ============================================================
// fields()
// ============================================================

#[test]
fn fields_expand_all_and_deduplicate() {
    let set = FeatureSet::parse("max(all) + title * 5").unwrap();
    let fields = set.fields();
    assert_eq!(fields.len(), 10);
    assert_eq!(fields.iter().filter(|f| *f == "title").count(), 1);
    assert!(fields.contains(&"boilerplate".to_string()));
}

// ============================================================
// combine()
// ============================================================

#[test]
fn combine_takes_elementwise_max_within_group() {
    let set = FeatureSet::parse("max(title, h1)").unwrap();
    let d = doc(&[
        ("title", &[("news", 2.0), ("daily", 1.0)]),
        ("h1", &[("news", 1.0), ("recipe", 3.0)]),
    ]);
    let out = set.combine(&d);
    assert_eq!(out["news"], 2.0);
    assert_eq!(out["daily"], 1.0);
    assert_eq!(out["recipe"], 3.0);
}

#[test]
fn combine_sums_weighted_terms() {
    let set = FeatureSet::parse("title * 10 + h1").unwrap();
    let d = doc(&[("title", &[("cake", 1.0)]), ("h1", &[("cake", 2.0)])]);
    assert_eq!(set.combine(&d)["cake"], 12.0);
}

#[test]
fn combine_ignores_missing_fields() {
    let set = FeatureSet::parse("title + meta-keywords * 5").unwrap();
    let d = doc(&[("title", &[("cake", 1.0)])]);
    let out = set.combine(&d);
    assert_eq!(out.len(), 1);
    assert_eq!(out["cake"], 1.0);
}

#[test]
fn combine_drops_zero_weight_terms() {
    let set = FeatureSet::parse("title * 0").unwrap();
    let d = doc(&[("title", &[("cake", 4.0)])]);
    assert!(set.combine(&d).is_empty());
}
