use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

use super::auth::Permissions;
use super::response::{respond, DocumentResponse};
use super::AppState;
use crate::error::{AppError, Result};
use crate::filter::{add_common_filters, visibility_predicate, CommonParams, FilterSet};
use crate::matching::{
    evaluate_path, match_numeric_range, match_string, numeric::split_range_param, value_has_kind,
    MatchError, MatchMode,
};
use crate::models::{
    IdentificationHelper, ProductStatusCategory, RemediationCategory,
};
use crate::product::{
    extract_all_products, find_vulnerabilities_for_product, has_remediation, helpers_match,
};

/// Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Routing fallback: unknown path
pub async fn not_found() -> AppError {
    AppError::NotFound("route not found".to_string())
}

/// Routing fallback: known path, wrong method
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Exact match on publisher namespace and tracking id
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(permissions): Extension<Permissions>,
    Path((publisher_namespace, tracking_id)): Path<(String, String)>,
) -> Result<Response> {
    let snapshot = state.store.snapshot();
    let mut filters = FilterSet::new(&snapshot);
    filters.add(visibility_predicate(permissions.0));

    filters.add(Box::new(move |advisory| {
        Ok(advisory.document.publisher.namespace == publisher_namespace
            && advisory.document.tracking.id == tracking_id)
    }));

    let matched = filters.evaluate()?;
    respond(&DocumentResponse::new(matched, false, false))
}

#[derive(Debug, Default, Deserialize)]
pub struct TitleParams {
    pub matching: Option<String>,

    #[serde(flatten)]
    pub common: CommonParams,
}

/// Match on the document title under the requested matching mode
pub async fn get_by_title(
    State(state): State<AppState>,
    Extension(permissions): Extension<Permissions>,
    Path(title): Path<String>,
    Query(params): Query<TitleParams>,
) -> Result<Response> {
    let mode = MatchMode::parse_param(params.matching.as_deref())?;

    let snapshot = state.store.snapshot();
    let mut filters = FilterSet::new(&snapshot);
    filters.add(visibility_predicate(permissions.0));
    add_common_filters(&mut filters, &params.common)?;

    filters.add(Box::new(move |advisory| {
        Ok(match_string(&advisory.document.title, &title, mode)?)
    }));

    let matched = filters.evaluate()?;
    respond(&DocumentResponse::new(
        matched,
        params.common.wants_hashes(),
        params.common.wants_signature(),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct PublisherParams {
    pub matching: Option<String>,
    pub publisher_namespace: Option<String>,
    pub publisher_category: Option<String>,

    #[serde(flatten)]
    pub common: CommonParams,
}

/// Match on the publisher name; namespace and category narrow exactly
pub async fn get_by_publisher(
    State(state): State<AppState>,
    Extension(permissions): Extension<Permissions>,
    Path(publisher_name): Path<String>,
    Query(params): Query<PublisherParams>,
) -> Result<Response> {
    let mode = MatchMode::parse_param(params.matching.as_deref())?;

    let snapshot = state.store.snapshot();
    let mut filters = FilterSet::new(&snapshot);
    filters.add(visibility_predicate(permissions.0));
    add_common_filters(&mut filters, &params.common)?;

    filters.add(Box::new(move |advisory| {
        Ok(match_string(
            &advisory.document.publisher.name,
            &publisher_name,
            mode,
        )?)
    }));

    if let Some(namespace) = params.publisher_namespace.clone() {
        filters.add(Box::new(move |advisory| {
            Ok(advisory.document.publisher.namespace == namespace)
        }));
    }

    if let Some(category) = params.publisher_category.clone() {
        filters.add(Box::new(move |advisory| {
            Ok(advisory.document.publisher.category == category)
        }));
    }

    let matched = filters.evaluate()?;
    respond(&DocumentResponse::new(
        matched,
        params.common.wants_hashes(),
        params.common.wants_signature(),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct MatchPropertyParams {
    pub path: Option<String>,

    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub value: Option<String>,

    pub matching: Option<String>,

    /// Presence-only: treat an unmatched path as an automatic match
    pub include_missing: Option<String>,

    #[serde(flatten)]
    pub common: CommonParams,
}

/// Single attribute-path match: evaluate the path, then check the node's
/// kind and/or value
pub async fn match_property(
    State(state): State<AppState>,
    Extension(permissions): Extension<Permissions>,
    Query(params): Query<MatchPropertyParams>,
) -> Result<Response> {
    let Some(path) = params.path.clone() else {
        return Err(AppError::BadRequest(
            "missing required parameter 'path'".to_string(),
        ));
    };
    if params.kind.is_none() && params.value.is_none() {
        return Err(AppError::BadRequest(
            "at least one of 'type' and 'value' is required".to_string(),
        ));
    }
    let mode = MatchMode::parse_param(params.matching.as_deref())?;
    let include_missing = params.include_missing.is_some();
    let kind = params.kind.clone();
    let value = params.value.clone();

    let snapshot = state.store.snapshot();
    let mut filters = FilterSet::new(&snapshot);
    filters.add(visibility_predicate(permissions.0));
    add_common_filters(&mut filters, &params.common)?;

    filters.add(Box::new(move |advisory| {
        let raw = serde_json::to_value(advisory)?;
        let evaluated = match evaluate_path(&raw, &path) {
            Ok(node) => node,
            Err(MatchError::PathNotFound(_)) => return Ok(include_missing),
            Err(err) => return Err(err.into()),
        };

        let kind_ok = match &kind {
            Some(kind) => value_has_kind(&evaluated, kind),
            None => true,
        };
        if !kind_ok {
            return Ok(false);
        }

        match &value {
            Some(wanted) => match evaluated.as_str() {
                // only string nodes are matchable against the string
                // parameter of a GET query
                Some(node) => Ok(match_string(node, wanted, mode)?),
                None => Ok(false),
            },
            None => Ok(true),
        }
    }));

    let matched = filters.evaluate()?;
    respond(&DocumentResponse::new(
        matched,
        params.common.wants_hashes(),
        params.common.wants_signature(),
    ))
}

/// Combination operator for a batch of matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOperator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MatchSpec {
    pub path: String,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub value: Option<serde_json::Value>,

    #[serde(default)]
    pub matching: Option<MatchMode>,

    #[serde(default)]
    pub include_missing: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvancedMatchingRequest {
    #[serde(default)]
    pub matching_default: Option<MatchMode>,

    #[serde(default)]
    pub operator: MatchOperator,

    #[validate(length(min = 1, message = "matches must not be empty"))]
    pub matches: Vec<MatchSpec>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WithParams {
    pub with_hashes: Option<String>,
    pub with_signature: Option<String>,
}

/// Batch attribute-path match: per-item match counts combined with
/// and/or
pub async fn match_properties(
    State(state): State<AppState>,
    Extension(permissions): Extension<Permissions>,
    Query(params): Query<WithParams>,
    body: std::result::Result<Json<AdvancedMatchingRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    request.validate()?;

    let operator = request.operator;
    let default_mode = request.matching_default.unwrap_or_default();
    let matches = request.matches;

    let snapshot = state.store.snapshot();
    let mut filters = FilterSet::new(&snapshot);
    filters.add(visibility_predicate(permissions.0));

    filters.add(Box::new(move |advisory| {
        let raw = serde_json::to_value(advisory)?;

        let mut matched = 0usize;
        for spec in &matches {
            let evaluated = match evaluate_path(&raw, &spec.path) {
                Ok(node) => node,
                Err(MatchError::PathNotFound(_)) => {
                    if spec.include_missing {
                        matched += 1;
                    }
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            if let Some(kind) = &spec.kind {
                if !value_has_kind(&evaluated, kind) {
                    continue;
                }
            }

            match &spec.value {
                None => matched += 1,
                Some(wanted) => {
                    let mode = spec.matching.unwrap_or(default_mode);
                    let item_matches = match (evaluated.as_str(), wanted.as_str()) {
                        (Some(node), Some(wanted)) => match_string(node, wanted, mode)?,
                        // non-string values compare structurally
                        _ => evaluated == *wanted,
                    };
                    if item_matches {
                        matched += 1;
                    }
                }
            }
        }

        Ok(match operator {
            MatchOperator::And => matched == matches.len(),
            MatchOperator::Or => matched > 0,
        })
    }));

    let matched = filters.evaluate()?;
    respond(&DocumentResponse::new(
        matched,
        params.with_hashes.is_some(),
        params.with_signature.is_some(),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeviceListParams {
    pub product_status: Option<String>,
    pub cvssv3: Option<String>,
    pub cvssv2: Option<String>,
    pub remediation_category: Option<String>,

    #[serde(flatten)]
    pub common: CommonParams,
}

/// Device-list match: product extraction, identity equivalence and
/// vulnerability filtering
pub async fn from_device_list(
    State(state): State<AppState>,
    Extension(permissions): Extension<Permissions>,
    Query(params): Query<DeviceListParams>,
    body: std::result::Result<Json<Vec<IdentificationHelper>>, JsonRejection>,
) -> Result<Response> {
    let Json(devices) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let statuses: Vec<ProductStatusCategory> = match &params.product_status {
        None => Vec::new(),
        Some(token) => vec![ProductStatusCategory::from_str(token).map_err(|_| {
            AppError::BadRequest(format!("product status {token} is not supported"))
        })?],
    };
    let remediation = match &params.remediation_category {
        None => None,
        Some(token) => Some(RemediationCategory::from_str(token).map_err(|_| {
            AppError::BadRequest(format!("remediation category {token} is not supported"))
        })?),
    };
    let cvssv3 = params.cvssv3.as_deref().map(split_range_param).unwrap_or_default();
    let cvssv2 = params.cvssv2.as_deref().map(split_range_param).unwrap_or_default();

    let snapshot = state.store.snapshot();
    let mut filters = FilterSet::new(&snapshot);
    filters.add(visibility_predicate(permissions.0));
    add_common_filters(&mut filters, &params.common)?;

    filters.add(Box::new(move |advisory| {
        for product in extract_all_products(advisory) {
            let Some(helper) = &product.product_identification_helper else {
                // no identification helper, nothing to compare against
                continue;
            };
            if !devices.iter().any(|device| helpers_match(helper, device)) {
                continue;
            }

            for vulnerability in find_vulnerabilities_for_product(advisory, product, &statuses) {
                if !cvssv3.is_empty() || !cvssv2.is_empty() {
                    // a record without scores cannot be assessed and is
                    // retained; a record with scores needs at least one
                    // score inside the requested range
                    if !vulnerability.scores.is_empty() {
                        let mut any_score_matches = false;
                        for score in &vulnerability.scores {
                            if !cvssv3.is_empty() {
                                if let Some(cvss) = &score.cvss_v3 {
                                    if match_numeric_range(cvss.base_score, &cvssv3)? {
                                        any_score_matches = true;
                                        break;
                                    }
                                }
                            }
                            if !cvssv2.is_empty() {
                                if let Some(cvss) = &score.cvss_v2 {
                                    if match_numeric_range(cvss.base_score, &cvssv2)? {
                                        any_score_matches = true;
                                        break;
                                    }
                                }
                            }
                        }
                        if !any_score_matches {
                            continue;
                        }
                    }
                }

                if let Some(category) = remediation {
                    if !has_remediation(vulnerability, &[category]) {
                        continue;
                    }
                }

                // one vulnerability record survived all filters for a
                // matched device
                return Ok(true);
            }
        }
        Ok(false)
    }));

    let matched = filters.evaluate()?;
    respond(&DocumentResponse::new(
        matched,
        params.common.wants_hashes(),
        params.common.wants_signature(),
    ))
}
