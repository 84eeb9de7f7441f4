// Data models - Rust structs that map to database rows.
//
// Kept apart from the queries so the pipeline and output modules can use
// them without touching rusqlite.

use serde::{Deserialize, Serialize};

/// One evaluated method/dataset pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// `"{method}:{dataset}"`
    pub name: String,
    pub method: String,
    pub dataset: String,
    /// ROC-AUC of the pooled out-of-fold predictions
    pub auc: f64,
    pub fold_mean: f64,
    pub fold_std: f64,
    pub n_folds: u32,
    pub n_features: u32,
    /// Out-of-fold predictions for the training rows (JSON in the DB)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub oof_predictions: Vec<f64>,
    /// Final-model predictions for the test rows (JSON in the DB)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub test_predictions: Vec<f64>,
    pub created_at: String,
}

/// Quality band of an AUC, used for colouring reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    Strong,
    Good,
    Fair,
    Weak,
}

impl ScoreTier {
    pub fn from_auc(auc: f64) -> Self {
        match auc {
            a if a >= 0.88 => ScoreTier::Strong,
            a if a >= 0.85 => ScoreTier::Good,
            a if a >= 0.80 => ScoreTier::Fair,
            _ => ScoreTier::Weak,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTier::Strong => "Strong",
            ScoreTier::Good => "Good",
            ScoreTier::Fair => "Fair",
            ScoreTier::Weak => "Weak",
        }
    }
}

impl std::fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
