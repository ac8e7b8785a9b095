//! Role-gated structured query API over security-advisory documents.
//!
//! At startup the [`store::DocumentStore`] walks the configured document
//! tree and builds one immutable snapshot. Each request seeds a private
//! [`filter::FilterSet`] with the caller's visibility predicate, adds
//! query-specific predicates built from the matching primitives and the
//! product-tree index, and evaluates the pipeline over the shared
//! snapshot.

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod matching;
pub mod models;
pub mod product;
pub mod store;
