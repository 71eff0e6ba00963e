//! Label strategy: caller-supplied extra label dimensions.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use reqprom_core::error::{ReqPromError, Result};

use super::collectors::{COUNTER_LABELS, HISTOGRAM_LABELS};
use super::request::RequestInfo;

/// Maps an in-flight request to extra label values.
pub type Labeler = Arc<dyn Fn(&RequestInfo) -> HashMap<String, String> + Send + Sync>;

/// The active labeler plus the label names it declared.
#[derive(Clone, Default)]
pub struct LabelStrategy {
    labeler: Option<Labeler>,
    declared: Vec<String>,
}

impl LabelStrategy {
    /// Strategy that adds no labels.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build a strategy, rejecting duplicate or reserved declared names.
    pub fn new(labeler: Labeler, declared: Vec<String>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for name in &declared {
            if COUNTER_LABELS.contains(&name.as_str()) || HISTOGRAM_LABELS.contains(&name.as_str()) {
                return Err(ReqPromError::BadRequest(format!(
                    "label name {name:?} is reserved"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ReqPromError::BadRequest(format!(
                    "label name {name:?} declared twice"
                )));
            }
        }
        Ok(Self {
            labeler: Some(labeler),
            declared,
        })
    }

    pub fn declared_names(&self) -> &[String] {
        &self.declared
    }

    pub fn is_set(&self) -> bool {
        self.labeler.is_some()
    }

    /// Extra labels for `req`.
    ///
    /// With `strict`, the returned key set must equal the declared names.
    /// Without it the mapping is returned verbatim and any mismatch surfaces
    /// from the instrument layer instead.
    pub fn labels_for(&self, req: &RequestInfo, strict: bool) -> Result<HashMap<String, String>> {
        let Some(labeler) = &self.labeler else {
            return Ok(HashMap::new());
        };
        let labels = labeler(req);
        if strict {
            let got: BTreeSet<&str> = labels.keys().map(String::as_str).collect();
            let want: BTreeSet<&str> = self.declared.iter().map(String::as_str).collect();
            if got != want {
                return Err(ReqPromError::LabelMismatch {
                    declared: want.into_iter().map(str::to_string).collect(),
                    got: got.into_iter().map(str::to_string).collect(),
                });
            }
        }
        Ok(labels)
    }
}
