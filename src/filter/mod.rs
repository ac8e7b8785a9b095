//! Composable filter pipeline over one snapshot.
//!
//! A [`FilterSet`] is a request-local value: it borrows the shared
//! snapshot and owns its predicates exclusively. It must never be shared
//! between concurrent requests — query isolation depends on each request
//! holding its own instance.

pub mod params;
pub mod visibility;

pub use params::{add_common_filters, CommonParams};
pub use visibility::visibility_predicate;

use crate::error::Result;
use crate::models::Advisory;
use crate::store::{AdvisoryRecord, Snapshot};

/// A pure boolean test over one advisory. May close over request-scoped
/// parameters; must not mutate anything.
pub type Predicate = Box<dyn Fn(&Advisory) -> Result<bool> + Send>;

/// An ordered set of predicates bound to one snapshot.
///
/// Predicates combine with logical AND in registration order and
/// evaluation short-circuits per record. Evaluation consumes the
/// predicates (single use): whether it succeeds or fails, the set is
/// empty afterwards, so an aborted request cannot leak predicates into
/// a later evaluation.
pub struct FilterSet<'a> {
    snapshot: &'a Snapshot,
    predicates: Vec<Predicate>,
}

impl<'a> FilterSet<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            snapshot,
            predicates: Vec::new(),
        }
    }

    /// Append a predicate. Nothing is evaluated yet.
    pub fn add(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    /// Drop all registered predicates. Idempotent. Callers that abort a
    /// request between `add` and `evaluate` use this to discard state.
    pub fn reset(&mut self) {
        self.predicates.clear();
    }

    /// Apply all predicates to every record in the snapshot.
    ///
    /// A record is included only if every predicate returns true. The
    /// first predicate error aborts the whole evaluation; no partial
    /// result is returned.
    pub fn evaluate(&mut self) -> Result<Vec<&'a AdvisoryRecord>> {
        // taking the predicates up front clears the set on every exit
        // path, including errors
        let predicates = std::mem::take(&mut self.predicates);

        let mut matched = Vec::new();
        for record in self.snapshot.records() {
            let mut included = true;
            for predicate in &predicates {
                if !predicate(&record.advisory)? {
                    included = false;
                    break;
                }
            }
            if included {
                matched.push(record);
            }
        }

        tracing::debug!(matched = matched.len(), "filter pipeline evaluated");
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::TlpLabel;
    use std::path::PathBuf;

    fn record(title: &str, label: &str) -> AdvisoryRecord {
        let raw = serde_json::json!({
            "document": {
                "category": "csaf_security_advisory",
                "title": title,
                "publisher": { "name": "p", "namespace": "ns", "category": "vendor" },
                "tracking": {
                    "id": format!("ID-{title}"),
                    "status": "final",
                    "initial_release_date": "2024-01-01T00:00:00Z"
                },
                "distribution": { "tlp": { "label": label } }
            }
        });
        AdvisoryRecord {
            advisory: serde_json::from_value(raw).unwrap(),
            path: PathBuf::from(format!("{title}.json")),
            hashes: Default::default(),
            signature: None,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(vec![
            record("Alpha", "WHITE"),
            record("Beta", "GREEN"),
            record("Gamma", "WHITE"),
        ])
    }

    fn title_contains(needle: &'static str) -> Predicate {
        Box::new(move |advisory| Ok(advisory.document.title.contains(needle)))
    }

    #[test]
    fn test_no_predicates_matches_everything() {
        let snapshot = snapshot();
        let mut filters = FilterSet::new(&snapshot);
        assert_eq!(filters.evaluate().unwrap().len(), 3);
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let snapshot = snapshot();
        let mut filters = FilterSet::new(&snapshot);
        filters.add(title_contains("a"));
        filters.add(Box::new(|advisory| {
            Ok(advisory.label() == TlpLabel::White)
        }));
        let matched = filters.evaluate().unwrap();
        let titles: Vec<_> = matched
            .iter()
            .map(|r| r.advisory.document.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Alpha", "Gamma"]);
    }

    #[test]
    fn test_included_set_ignores_predicate_order() {
        let snapshot = snapshot();

        let mut forward = FilterSet::new(&snapshot);
        forward.add(title_contains("a"));
        forward.add(title_contains("m"));
        let a: Vec<_> = forward
            .evaluate()
            .unwrap()
            .iter()
            .map(|r| r.advisory.document.title.clone())
            .collect();

        let mut reversed = FilterSet::new(&snapshot);
        reversed.add(title_contains("m"));
        reversed.add(title_contains("a"));
        let b: Vec<_> = reversed
            .evaluate()
            .unwrap()
            .iter()
            .map(|r| r.advisory.document.title.clone())
            .collect();

        assert_eq!(a, b);
    }

    #[test]
    fn test_first_error_aborts_with_no_partial_result() {
        let snapshot = snapshot();
        let mut filters = FilterSet::new(&snapshot);
        // predicate order is fixed here: the error fires on the first
        // record before the second predicate can run
        filters.add(Box::new(|_| {
            Err(AppError::BadRequest("broken expression".to_string()))
        }));
        filters.add(title_contains("Alpha"));
        assert!(filters.evaluate().is_err());
    }

    #[test]
    fn test_evaluate_clears_predicates_on_success() {
        let snapshot = snapshot();
        let mut filters = FilterSet::new(&snapshot);
        filters.add(title_contains("Alpha"));
        assert_eq!(filters.evaluate().unwrap().len(), 1);
        // single use: a second evaluation sees no predicates
        assert_eq!(filters.evaluate().unwrap().len(), 3);
    }

    #[test]
    fn test_evaluate_clears_predicates_on_error() {
        let snapshot = snapshot();
        let mut filters = FilterSet::new(&snapshot);
        filters.add(Box::new(|_| Err(AppError::BadRequest("boom".to_string()))));
        assert!(filters.evaluate().is_err());
        assert_eq!(filters.evaluate().unwrap().len(), 3);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let snapshot = snapshot();
        let mut filters = FilterSet::new(&snapshot);
        filters.add(title_contains("Alpha"));
        filters.reset();
        filters.reset();
        assert_eq!(filters.evaluate().unwrap().len(), 3);
    }

    #[test]
    fn test_short_circuit_skips_later_predicates_for_excluded_records() {
        let snapshot = snapshot();
        let mut filters = FilterSet::new(&snapshot);
        // matches only "Beta"; the erroring predicate never runs for it
        filters.add(title_contains("Beta"));
        filters.add(Box::new(|advisory| {
            if advisory.document.title == "Beta" {
                Ok(true)
            } else {
                Err(AppError::BadRequest("must not be reached".to_string()))
            }
        }));
        let matched = filters.evaluate().unwrap();
        assert_eq!(matched.len(), 1);
    }
}
