//! Structural validation seam.
//!
//! The store does not decide what an advisory looks like; it asks an
//! [`AdvisoryValidator`]. The production implementation checks documents
//! against an embedded JSON schema describing the required structure.
//! Documents that fail are not errors — directory trees routinely mix
//! advisories with feed indexes and other JSON files sharing the
//! extension.

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::Value;

/// Outcome of classifying one parsed JSON document
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Structurally a security advisory; safe to decode
    Accepted,

    /// Not an advisory; diagnostics say what was missing
    NotAnAdvisory(Vec<String>),
}

/// Classifies parsed JSON documents as advisories or not
pub trait AdvisoryValidator: Send + Sync {
    fn classify(&self, document: &Value) -> Classification;
}

static SCHEMA_JSON: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("advisory_schema.json"))
        .expect("embedded advisory schema is valid JSON")
});

static COMPILED_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::compile(&SCHEMA_JSON).expect("embedded advisory schema compiles")
});

/// Schema-backed validator over the embedded structural schema
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl AdvisoryValidator for SchemaValidator {
    fn classify(&self, document: &Value) -> Classification {
        let result = COMPILED_SCHEMA.validate(document);
        match result {
            Ok(()) => Classification::Accepted,
            Err(errors) => {
                let diagnostics = errors
                    .map(|error| format!("{}: {error}", error.instance_path))
                    .collect();
                Classification::NotAnAdvisory(diagnostics)
            }
        }
    }
}
