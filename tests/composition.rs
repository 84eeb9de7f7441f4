// Composition tests: verify that independently-tested modules produce
// correct results when wired together.
//
// These run the pipeline end to end on a small synthetic corpus whose
// evergreen and ephemeral pages use disjoint vocabularies: feature sets are
// turned into matrices, cross-validated, persisted, swept with resume, and
// finally blended into a submission file.

use evergreen::db;
use evergreen::db::queries;
use evergreen::evaluate::CvParams;
use evergreen::extract::ExtractedPage;
use evergreen::featureset::catalog::LDA_DATASETS;
use evergreen::featureset::FeatureSet;
use evergreen::model::FeatureMatrix;
use evergreen::output::export;
use evergreen::pipeline::method::Method;
use evergreen::pipeline::{self, blend, sweep};

const EVERGREEN_WORDS: [&str; 6] = ["recipe", "bread", "banana", "garden", "baking", "soup"];
const EPHEMERAL_WORDS: [&str; 6] = ["election", "scoreboard", "match", "stocks", "breaking", "traffic"];

const N_TRAIN: usize = 40;
const N_TEST: usize = 6;

/// Alternating evergreen (even) and ephemeral (odd) pages, test rows last.
fn corpus() -> (Vec<ExtractedPage>, Vec<f64>) {
    let pages = (0..N_TRAIN + N_TEST)
        .map(|i| {
            let words = if i % 2 == 0 { EVERGREEN_WORDS } else { EPHEMERAL_WORDS };
            let title = format!("{} {} portal", words[i % 6], words[(i + 1) % 6]);
            let h1 = format!("{} {}", words[(i + 2) % 6], words[(i + 3) % 6]);
            let mut page = ExtractedPage {
                urlid: 1000 + i as u64,
                ..ExtractedPage::default()
            };
            page.fields.insert("title".into(), vec![title]);
            page.fields.insert("h1".into(), vec![h1]);
            page
        })
        .collect();
    let labels = (0..N_TRAIN).map(|i| if i % 2 == 0 { 1.0 } else { 0.0 }).collect();
    (pages, labels)
}

fn params() -> CvParams {
    CvParams {
        folds: 5,
        ..CvParams::default()
    }
}

// ============================================================
// Feature matrices per method
// ============================================================

#[test]
fn every_method_yields_one_row_per_page() {
    let (pages, _) = corpus();
    let set = FeatureSet::parse("max(title, h1)").unwrap();

    for method in [Method::Raw, Method::TfIdf, Method::NoStem, Method::Svd(3), Method::Lda(4)] {
        let m = pipeline::build_matrix(&pages, &set, method, 4).unwrap();
        assert_eq!(m.nrows(), N_TRAIN + N_TEST, "{method}");
    }
}

#[test]
fn svd_and_lda_produce_dense_embeddings() {
    let (pages, _) = corpus();
    let set = FeatureSet::parse("title + h1").unwrap();

    match pipeline::build_matrix(&pages, &set, Method::Svd(3), 4).unwrap() {
        FeatureMatrix::Dense(m) => assert_eq!(m.ncols(), 3),
        FeatureMatrix::Sparse(_) => panic!("svd should be dense"),
    }

    match pipeline::build_matrix(&pages, &set, Method::Lda(4), 4).unwrap() {
        FeatureMatrix::Dense(m) => {
            assert_eq!(m.ncols(), 4);
            for row in m.rows() {
                assert!((row.sum() - 1.0).abs() < 1e-9);
            }
        }
        FeatureMatrix::Sparse(_) => panic!("lda should be dense"),
    }
}

// ============================================================
// Evaluate and persist
// ============================================================

#[test]
fn evaluate_then_save_roundtrips_through_store() {
    let (pages, labels) = corpus();
    let set = FeatureSet::parse("title * 10 + h1").unwrap();
    let dir = tempfile::tempdir().unwrap();
    let conn = db::initialize(&dir.path().join("scores.db")).unwrap();

    let (features, outcome) =
        pipeline::evaluate_one(&pages, &labels, &set, Method::TfIdf, &params()).unwrap();
    assert!(outcome.auc > 0.99);

    let record = pipeline::save_outcome(&conn, Method::TfIdf, &set, &features, &outcome).unwrap();
    assert_eq!(record.name, "tfidf:title * 10 + h1");

    let stored = queries::get_score(&conn, &record.name).unwrap().unwrap();
    assert_eq!(stored.n_folds, 5);
    assert_eq!(stored.oof_predictions.len(), N_TRAIN);
    assert_eq!(stored.test_predictions.len(), N_TEST);
    assert_eq!(stored.n_features as usize, features.ncols());

    let (method, parsed) = pipeline::parse_score_name(&stored.name).unwrap();
    assert_eq!(method, Method::TfIdf);
    assert_eq!(parsed, set);
}

// ============================================================
// Sweep with resume, then blend
// ============================================================

#[test]
fn sweep_resumes_and_feeds_blend() {
    let (pages, labels) = corpus();
    let dir = tempfile::tempdir().unwrap();
    let conn = db::initialize(&dir.path().join("scores.db")).unwrap();

    let lda_set = FeatureSet::parse(LDA_DATASETS[2]).unwrap();
    let datasets = vec![FeatureSet::parse("title").unwrap(), lda_set];
    let methods = vec![Method::TfIdf, Method::Lda(4)];

    let first = sweep::run(&conn, &pages, &labels, &datasets, &methods, &params()).unwrap();
    // lda on "title" is not in the LDA list
    assert_eq!(first.ineligible, 1);
    assert_eq!(first.evaluated + first.failed, 3);
    assert!(queries::get_run_state(&conn, sweep::LAST_SWEEP_KEY).unwrap().is_some());

    let second = sweep::run(&conn, &pages, &labels, &datasets, &methods, &params()).unwrap();
    assert_eq!(second.evaluated, 0);
    assert_eq!(second.skipped, first.evaluated);

    let ranked = queries::get_ranked_scores(&conn, None).unwrap();
    assert_eq!(ranked.len(), first.evaluated);
    assert!(ranked.windows(2).all(|w| w[0].auc >= w[1].auc));

    let names: Vec<String> = vec!["tfidf:title".into(), "tfidf:max(h1, title)".into()];
    let components = blend::load_components(&conn, &names).unwrap();
    let outcome = blend::blend(&components, &labels, &params()).unwrap();

    assert!(outcome.auc > 0.9);
    assert_eq!(outcome.predictions.len(), N_TEST);
    let min = outcome.predictions.iter().copied().fold(f64::INFINITY, f64::min);
    let max = outcome.predictions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(min, 0.0);
    assert_eq!(max, 1.0);

    let out = dir.path().join("submission.csv");
    let urlids: Vec<u64> = pages[N_TRAIN..].iter().map(|p| p.urlid).collect();
    export::write_submission(&out, &urlids, &outcome.predictions).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    let mut lines = written.lines();
    assert_eq!(lines.next(), Some("urlid,label"));
    assert_eq!(lines.count(), N_TEST);
}

#[test]
fn blend_rejects_unknown_names() {
    let dir = tempfile::tempdir().unwrap();
    let conn = db::initialize(&dir.path().join("scores.db")).unwrap();
    let err = blend::load_components(&conn, &["tfidf:title".to_string()]).unwrap_err();
    assert!(err.to_string().contains("No stored score"));
}
