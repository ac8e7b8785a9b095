//! Shared query-parameter filters: release-date bounds, profile and
//! tracking status. Most query routes accept these alongside their own
//! parameters.

use chrono::DateTime;
use serde::Deserialize;
use std::str::FromStr;

use super::FilterSet;
use crate::error::{AppError, Result};
use crate::models::TrackingStatus;

/// Optional parameters shared by most query routes. The `with_*` flags
/// are presence-only and control the response envelope, not filtering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommonParams {
    /// RFC 3339 upper bound on the initial release date (exclusive)
    pub before: Option<String>,

    /// RFC 3339 lower bound on the initial release date (exclusive)
    pub after: Option<String>,

    /// Exact match on the document category
    pub profile: Option<String>,

    /// Exact match on the tracking status (draft|final|interim)
    pub tracking_status: Option<String>,

    /// Include content hashes in the response envelope
    pub with_hashes: Option<String>,

    /// Include the detached signature in the response envelope
    pub with_signature: Option<String>,
}

impl CommonParams {
    pub fn wants_hashes(&self) -> bool {
        self.with_hashes.is_some()
    }

    pub fn wants_signature(&self) -> bool {
        self.with_signature.is_some()
    }
}

/// Register the filters for every common parameter that is set.
/// Parameter syntax errors surface immediately; document-side date
/// parsing happens inside the predicates.
pub fn add_common_filters(filters: &mut FilterSet<'_>, params: &CommonParams) -> Result<()> {
    if let Some(before) = &params.before {
        let bound = parse_rfc3339("before", before)?;
        filters.add(Box::new(move |advisory| {
            Ok(release_date(advisory)? < bound)
        }));
    }

    if let Some(after) = &params.after {
        let bound = parse_rfc3339("after", after)?;
        filters.add(Box::new(move |advisory| {
            Ok(release_date(advisory)? > bound)
        }));
    }

    if let Some(profile) = params.profile.clone() {
        filters.add(Box::new(move |advisory| {
            Ok(advisory.document.category == profile)
        }));
    }

    if let Some(token) = &params.tracking_status {
        let status = TrackingStatus::from_str(token).map_err(|_| {
            AppError::BadRequest(format!("tracking status {token} is not supported"))
        })?;
        filters.add(Box::new(move |advisory| {
            Ok(advisory.document.tracking.status == status)
        }));
    }

    Ok(())
}

fn parse_rfc3339(name: &str, value: &str) -> Result<DateTime<chrono::FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|err| {
        AppError::BadRequest(format!("parameter {name} is not an RFC 3339 timestamp: {err}"))
    })
}

fn release_date(advisory: &crate::models::Advisory) -> Result<DateTime<chrono::FixedOffset>> {
    let raw = &advisory.document.tracking.initial_release_date;
    DateTime::parse_from_rfc3339(raw).map_err(|err| {
        AppError::BadRequest(format!(
            "advisory {} has unparseable initial release date: {err}",
            advisory.document.tracking.id
        ))
    })
}
