//! Numeric range evaluation.
//!
//! A range is a list of comparison expressions like `">7"` or `"<=9.5"`.
//! The value under test is formatted as a decimal string and concatenated
//! with each expression; the result must parse as `NUMBER OP NUMBER` and
//! every expression must hold.

use super::MatchError;

/// Test `value` against a list of comparison expressions.
///
/// All expressions must hold (AND); an empty list is vacuously true. Any
/// expression that fails to parse or evaluate aborts with
/// [`MatchError::InvalidExpression`].
///
/// # Example
///
/// `match_numeric_range(8.0, &[">7".into(), "<9".into()])` is `Ok(true)`.
pub fn match_numeric_range(value: f64, expressions: &[String]) -> Result<bool, MatchError> {
    for expression in expressions {
        let concatenated = format!("{value}{expression}");
        if !eval_comparison(&concatenated)
            .ok_or_else(|| MatchError::InvalidExpression(expression.clone()))?
        {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Evaluate a `NUMBER OP NUMBER` comparison. Returns None if the
/// expression does not have exactly that shape.
fn eval_comparison(expr: &str) -> Option<bool> {
    let expr = expr.trim();

    // The left operand is produced by formatting a float, so the first
    // comparison character always starts the operator. A leading sign on
    // the left operand is part of the number, not an operator.
    let op_start = expr
        .char_indices()
        .skip(1)
        .find(|(_, c)| matches!(c, '<' | '>' | '=' | '!'))
        .map(|(i, _)| i)?;

    let (lhs, rest) = expr.split_at(op_start);
    let op_len = if rest.starts_with("<=")
        || rest.starts_with(">=")
        || rest.starts_with("==")
        || rest.starts_with("!=")
    {
        2
    } else {
        1
    };
    let (op, rhs) = rest.split_at(op_len);

    let lhs: f64 = lhs.trim().parse().ok()?;
    let rhs: f64 = rhs.trim().parse().ok()?;

    match op {
        "<" => Some(lhs < rhs),
        "<=" => Some(lhs <= rhs),
        ">" => Some(lhs > rhs),
        ">=" => Some(lhs >= rhs),
        "==" => Some(lhs == rhs),
        "!=" => Some(lhs != rhs),
        _ => None,
    }
}

/// Split a comma-separated range parameter (`">7,<9"`) into expressions.
/// An empty parameter yields no expressions.
pub fn split_range_param(param: &str) -> Vec<String> {
    if param.is_empty() {
        return Vec::new();
    }
    param.split(',').map(str::to_string).collect()
}
