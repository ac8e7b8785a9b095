//! Stateless matching primitives: string-matching modes, numeric range
//! expressions, document path evaluation and JSON value-kind
//! classification.

pub mod numeric;
pub mod path;

pub use numeric::match_numeric_range;
pub use path::evaluate_path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use strum::{Display, EnumString};
use thiserror::Error;

/// Matching primitive failures. All of these are caller mistakes and map
/// to BadRequest at the API boundary.
#[derive(Error, Debug)]
pub enum MatchError {
    /// Unknown matching-mode token
    #[error("matching parameter value {0} is unknown")]
    InvalidMode(String),

    /// Regular-expression pattern failed to compile
    #[error("invalid match pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Numeric range expression failed to parse or evaluate
    #[error("invalid numeric range expression {0}")]
    InvalidExpression(String),

    /// Path expression matched no node or is malformed
    #[error("path expression {0} matched no node")]
    PathNotFound(String),
}

/// String-matching modes. Tokens are kebab-case and case-sensitive; an
/// unset mode defaults to `exact`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MatchMode {
    #[default]
    Exact,
    Regex,
    BeginsWith,
    EndsWith,
    Contains,
}

impl MatchMode {
    /// Parse an optional mode token from a query parameter. Absent or
    /// empty means `exact`; anything unrecognized is an error.
    pub fn parse_param(token: Option<&str>) -> Result<Self, MatchError> {
        match token {
            None | Some("") => Ok(MatchMode::Exact),
            Some(t) => MatchMode::from_str(t).map_err(|_| MatchError::InvalidMode(t.to_string())),
        }
    }
}

/// Test `subject` against `pattern` under the given mode.
///
/// `regex` compiles the pattern per call and tests it against the
/// subject; the other modes are literal byte comparisons.
pub fn match_string(subject: &str, pattern: &str, mode: MatchMode) -> Result<bool, MatchError> {
    match mode {
        MatchMode::Exact => Ok(subject == pattern),
        MatchMode::Regex => {
            let re = Regex::new(pattern).map_err(|e| MatchError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            Ok(re.is_match(subject))
        }
        MatchMode::BeginsWith => Ok(subject.starts_with(pattern)),
        MatchMode::EndsWith => Ok(subject.ends_with(pattern)),
        MatchMode::Contains => Ok(subject.contains(pattern)),
    }
}

/// Semantic kind of a decoded JSON value, determined by structural
/// inspection of the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Object,
    Array,
    Boolean,
    Null,
}

impl ValueKind {
    /// Classify a decoded value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Object(_) => ValueKind::Object,
            Value::Array(_) => ValueKind::Array,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Null => ValueKind::Null,
        }
    }

    /// Parse a kind token from a query. Only the five addressable kinds
    /// are recognized; `null` is not a requestable kind.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "string" => Some(ValueKind::String),
            "number" => Some(ValueKind::Number),
            "object" => Some(ValueKind::Object),
            "array" => Some(ValueKind::Array),
            "boolean" => Some(ValueKind::Boolean),
            _ => None,
        }
    }
}

/// Whether `value` is of the kind named by `token`. Unknown tokens never
/// match.
pub fn value_has_kind(value: &Value, token: &str) -> bool {
    ValueKind::from_token(token).is_some_and(|kind| ValueKind::of(value) == kind)
}
