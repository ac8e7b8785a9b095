//! The success envelope: no error, a match count and the document list,
//! each entry optionally annotated with its hashes and signature.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Advisory, ContentHashes};
use crate::store::AdvisoryRecord;

#[derive(Debug, Serialize)]
pub struct DocumentResponse<'a> {
    /// Always null on success; errors use the error envelope instead
    pub error: Option<()>,

    pub documents_found: usize,

    pub documents: Vec<ResponseDocument<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ResponseDocument<'a> {
    pub content: &'a Advisory,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashes: Option<&'a ContentHashes>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<&'a str>,
}

impl<'a> DocumentResponse<'a> {
    pub fn new(records: Vec<&'a AdvisoryRecord>, with_hashes: bool, with_signature: bool) -> Self {
        let documents = records
            .into_iter()
            .map(|record| ResponseDocument {
                content: &record.advisory,
                hashes: with_hashes.then_some(&record.hashes),
                signature: if with_signature {
                    record.signature.as_deref()
                } else {
                    None
                },
            })
            .collect::<Vec<_>>();

        Self {
            error: None,
            documents_found: documents.len(),
            documents,
        }
    }
}

/// Serialize the envelope. A serialization failure surfaces as a generic
/// server error rather than a half-written body.
pub fn respond(response: &DocumentResponse<'_>) -> Result<Response> {
    let body = serde_json::to_vec(response)?;
    Ok((
        [(header::CONTENT_TYPE, "application/json; charset=UTF-8")],
        body,
    )
        .into_response())
}
