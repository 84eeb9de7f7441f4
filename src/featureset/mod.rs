// Feature-set expressions: which tag fields make up a document, and how much
// each one counts.
//
// `max(title, h1) * 10 + meta-description * 5` reads as: take the element-wise
// maximum of the title and h1 term counts, scale it by 10, and add the
// meta-description counts scaled by 5.

pub mod catalog;
pub mod parser;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::extract::{CANONICAL_FIELDS, EXTRA_FIELDS, META_PREFIX};

/// Per-document term weights (term → count or weighted count).
pub type TermCounts = HashMap<String, f64>;

/// Name that expands to every canonical field.
pub const ALL_FIELDS: &str = "all";

/// Errors from parsing a feature-set expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("Empty feature-set expression")]
    Empty,

    #[error("Unexpected character {ch:?} at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("Unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("Unknown field {0:?}")]
    UnknownField(String),

    #[error("Invalid weight {0:?}: weights must be non-negative numbers")]
    InvalidWeight(String),

    #[error("max() needs at least one field")]
    EmptyMax,
}

/// Where a term's counts come from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A single field. A bare `all` parses as `Max(["all"])`
    Field(String),
    /// Element-wise maximum over the listed fields
    Max(Vec<String>),
}

/// One `source * weight` summand.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub source: Source,
    pub weight: f64,
}

/// A parsed feature-set expression: a weighted sum of sources.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    terms: Vec<Term>,
}

impl FeatureSet {
    /// Parse an expression such as `max(all) + boilerplate * 10`.
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        let terms = parser::parse(input)?;
        Ok(Self { terms })
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Every field the expression reads, with `all` expanded, deduplicated,
    /// in first-use order.
    pub fn fields(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for term in &self.terms {
            let names: &[String] = match &term.source {
                Source::Field(name) => std::slice::from_ref(name),
                Source::Max(names) => names,
            };
            for name in names {
                for field in expand(name) {
                    if !out.iter().any(|f| f == field) {
                        out.push(field.to_string());
                    }
                }
            }
        }
        out
    }

    /// Combine one document's per-field term counts.
    ///
    /// Fields missing from `doc` contribute nothing. Terms whose combined
    /// weight is zero are dropped so the result stays sparse.
    pub fn combine(&self, doc: &BTreeMap<String, TermCounts>) -> TermCounts {
        let mut out = TermCounts::new();

        for term in &self.terms {
            let names: &[String] = match &term.source {
                Source::Field(name) => std::slice::from_ref(name),
                Source::Max(names) => names,
            };

            let mut maxed = TermCounts::new();
            for field in names.iter().flat_map(|n| expand(n)) {
                if let Some(counts) = doc.get(field) {
                    for (token, &count) in counts {
                        let slot = maxed.entry(token.clone()).or_insert(0.0);
                        if count > *slot {
                            *slot = count;
                        }
                    }
                }
            }

            for (token, count) in maxed {
                *out.entry(token).or_insert(0.0) += count * term.weight;
            }
        }

        out.retain(|_, v| *v != 0.0);
        out
    }
}

impl std::str::FromStr for FeatureSet {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical form: single spaces, weights only when not 1.
impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            match &term.source {
                Source::Field(name) => write!(f, "{name}")?,
                Source::Max(names) => write!(f, "max({})", names.join(", "))?,
            }
            if term.weight != 1.0 {
                write!(f, " * {}", term.weight)?;
            }
        }
        Ok(())
    }
}

/// Whether a name is a field an expression may reference.
pub fn is_known_field(name: &str) -> bool {
    name == ALL_FIELDS
        || CANONICAL_FIELDS.contains(&name)
        || EXTRA_FIELDS.contains(&name)
        || (name.len() > META_PREFIX.len() && name.starts_with(META_PREFIX))
}

fn expand(name: &str) -> Vec<&str> {
    if name == ALL_FIELDS {
        CANONICAL_FIELDS.to_vec()
    } else {
        vec![name]
    }
}
