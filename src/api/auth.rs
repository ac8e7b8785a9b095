//! Bearer-token authentication.
//!
//! Resolves the caller's permitted TLP label set and attaches it to the
//! request. Every caller may read WHITE documents; a valid token adds
//! the labels its credential has clearance for. A presented-but-unknown
//! token is rejected outright so callers can tell "not authenticated"
//! from "malformed request".

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::TlpLabel;

/// Permitted label set for this request, set by the auth middleware
#[derive(Debug, Clone)]
pub struct Permissions(pub Vec<TlpLabel>);

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let permissions = match header_value {
        None => vec![TlpLabel::White],
        Some(value) => {
            let token = value.strip_prefix("Bearer ").ok_or(AppError::AuthInvalid)?;
            let entry = state
                .auth
                .iter()
                .find(|entry| entry.token == token)
                .ok_or(AppError::AuthInvalid)?;

            let mut permitted = vec![TlpLabel::White];
            for label in &entry.allowed_tlp_labels {
                if !permitted.contains(label) {
                    permitted.push(*label);
                }
            }
            permitted
        }
    };

    request.extensions_mut().insert(Permissions(permissions));
    Ok(next.run(request).await)
}
