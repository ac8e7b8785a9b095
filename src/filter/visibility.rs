//! Visibility gating: the one predicate every query pipeline is seeded
//! with before anything else.

use super::Predicate;
use crate::models::TlpLabel;

/// Build the visibility predicate from a caller's permitted label set.
///
/// Matches an advisory iff its label is a member of `permitted`; an
/// empty set matches nothing.
pub fn visibility_predicate(permitted: Vec<TlpLabel>) -> Predicate {
    Box::new(move |advisory| Ok(permitted.contains(&advisory.label())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Advisory;
    use strum::IntoEnumIterator;

    fn advisory(label: &str) -> Advisory {
        let raw = serde_json::json!({
            "document": {
                "category": "csaf_security_advisory",
                "title": "t",
                "publisher": { "name": "p", "namespace": "ns", "category": "vendor" },
                "tracking": {
                    "id": "ID-1",
                    "status": "final",
                    "initial_release_date": "2024-01-01T00:00:00Z"
                },
                "distribution": { "tlp": { "label": label } }
            }
        });
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_matches_iff_label_is_permitted() {
        for label in TlpLabel::iter() {
            for permitted in [
                vec![],
                vec![TlpLabel::White],
                vec![TlpLabel::White, TlpLabel::Red],
                TlpLabel::iter().collect::<Vec<_>>(),
            ] {
                let predicate = visibility_predicate(permitted.clone());
                let advisory = advisory(&label.to_string());
                assert_eq!(
                    predicate(&advisory).unwrap(),
                    permitted.contains(&label),
                    "label {label}, permitted {permitted:?}"
                );
            }
        }
    }

    #[test]
    fn test_empty_permitted_set_matches_nothing() {
        let predicate = visibility_predicate(vec![]);
        for label in TlpLabel::iter() {
            assert!(!predicate(&advisory(&label.to_string())).unwrap());
        }
    }
}
