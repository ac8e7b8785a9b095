//! Document path evaluation.
//!
//! A small JSONPath subset over `serde_json::Value`:
//!
//! - `$` — root
//! - `.name` / `['name']` — child member
//! - `[0]`, `[-1]` — array index (negative counts from the end)
//! - `[*]` / `.*` — wildcard over array elements or object members
//! - `..name` — recursive descent to every member named `name`
//!
//! Evaluation collects all matching nodes; a single match stays scalar,
//! several matches collapse to a JSON array. No match, or a malformed
//! expression, fails with [`MatchError::PathNotFound`] — callers decide
//! whether that means non-match or automatic match.

use serde_json::Value;

use super::MatchError;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Child(String),
    Index(i64),
    Wildcard,
    Descendant(String),
}

/// Evaluate `path` against `document`.
pub fn evaluate_path(document: &Value, path: &str) -> Result<Value, MatchError> {
    let segments = parse(path).ok_or_else(|| MatchError::PathNotFound(path.to_string()))?;

    let mut current: Vec<&Value> = vec![document];
    for segment in &segments {
        let mut next = Vec::new();
        for node in current {
            apply(segment, node, &mut next);
        }
        if next.is_empty() {
            return Err(MatchError::PathNotFound(path.to_string()));
        }
        current = next;
    }

    if current.len() == 1 {
        Ok(current[0].clone())
    } else {
        Ok(Value::Array(current.into_iter().cloned().collect()))
    }
}

fn apply<'a>(segment: &Segment, node: &'a Value, out: &mut Vec<&'a Value>) {
    match segment {
        Segment::Child(name) => {
            if let Some(child) = node.as_object().and_then(|o| o.get(name)) {
                out.push(child);
            }
        }
        Segment::Index(index) => {
            if let Some(items) = node.as_array() {
                let len = items.len() as i64;
                let resolved = if *index < 0 { len + index } else { *index };
                if (0..len).contains(&resolved) {
                    out.push(&items[resolved as usize]);
                }
            }
        }
        Segment::Wildcard => match node {
            Value::Array(items) => out.extend(items.iter()),
            Value::Object(members) => out.extend(members.values()),
            _ => {}
        },
        Segment::Descendant(name) => collect_descendants(name, node, out),
    }
}

/// Pre-order walk collecting every member named `name` at any depth
fn collect_descendants<'a>(name: &str, node: &'a Value, out: &mut Vec<&'a Value>) {
    match node {
        Value::Object(members) => {
            for (key, value) in members {
                if key == name {
                    out.push(value);
                }
                collect_descendants(name, value, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_descendants(name, item, out);
            }
        }
        _ => {}
    }
}

/// Parse a path expression. None means malformed.
fn parse(path: &str) -> Option<Vec<Segment>> {
    let rest = path.strip_prefix('$')?;
    let mut chars = rest.chars().peekable();
    let mut segments = Vec::new();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if chars.peek() == Some(&'.') {
                    chars.next();
                    let name = take_name(&mut chars)?;
                    segments.push(Segment::Descendant(name));
                } else if chars.peek() == Some(&'*') {
                    chars.next();
                    segments.push(Segment::Wildcard);
                } else {
                    let name = take_name(&mut chars)?;
                    segments.push(Segment::Child(name));
                }
            }
            '[' => {
                let mut body = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(inner) => body.push(inner),
                        None => return None,
                    }
                }
                segments.push(parse_bracket(&body)?);
            }
            _ => return None,
        }
    }

    Some(segments)
}

/// Bare member names: letters, digits, `_` and `-`
fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

fn parse_bracket(body: &str) -> Option<Segment> {
    let body = body.trim();
    if body == "*" {
        return Some(Segment::Wildcard);
    }
    for quote in ['\'', '"'] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|b| b.strip_suffix(quote))
        {
            if inner.is_empty() {
                return None;
            }
            return Some(Segment::Child(inner.to_string()));
        }
    }
    body.parse::<i64>().ok().map(Segment::Index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "document": {
                "title": "Router firmware fix",
                "publisher": { "name": "Example Corp" }
            },
            "vulnerabilities": [
                { "cve": "CVE-2024-0001", "scores": [ { "cvss_v3": { "baseScore": 8.1 } } ] },
                { "cve": "CVE-2024-0002" }
            ],
            "product_tree": {
                "branches": [
                    { "product": { "product_id": "P-1" } },
                    { "branches": [ { "product": { "product_id": "P-2" } } ] }
                ]
            }
        })
    }

    #[test]
    fn test_dot_navigation() {
        let value = evaluate_path(&sample(), "$.document.title").unwrap();
        assert_eq!(value, json!("Router firmware fix"));
    }

    #[test]
    fn test_bracket_navigation() {
        let value = evaluate_path(&sample(), "$.document['publisher'].name").unwrap();
        assert_eq!(value, json!("Example Corp"));
    }

    #[test]
    fn test_array_index() {
        let value = evaluate_path(&sample(), "$.vulnerabilities[0].cve").unwrap();
        assert_eq!(value, json!("CVE-2024-0001"));
    }

    #[test]
    fn test_negative_index_counts_from_end() {
        let value = evaluate_path(&sample(), "$.vulnerabilities[-1].cve").unwrap();
        assert_eq!(value, json!("CVE-2024-0002"));
    }

    #[test]
    fn test_wildcard_collapses_to_array() {
        let value = evaluate_path(&sample(), "$.vulnerabilities[*].cve").unwrap();
        assert_eq!(value, json!(["CVE-2024-0001", "CVE-2024-0002"]));
    }

    #[test]
    fn test_recursive_descent() {
        let value = evaluate_path(&sample(), "$..product_id").unwrap();
        assert_eq!(value, json!(["P-1", "P-2"]));
    }

    #[test]
    fn test_single_match_stays_scalar() {
        let value = evaluate_path(&sample(), "$..baseScore").unwrap();
        assert_eq!(value, json!(8.1));
    }

    #[test]
    fn test_missing_member_is_path_not_found() {
        assert!(matches!(
            evaluate_path(&sample(), "$.document.revision"),
            Err(MatchError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_index_out_of_bounds_is_path_not_found() {
        assert!(matches!(
            evaluate_path(&sample(), "$.vulnerabilities[7]"),
            Err(MatchError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_malformed_expressions_are_path_not_found() {
        for path in ["document.title", "$.", "$[", "$.document[''].x", "$x"] {
            assert!(
                matches!(
                    evaluate_path(&sample(), path),
                    Err(MatchError::PathNotFound(_))
                ),
                "path {path:?} should be rejected"
            );
        }
    }
}
