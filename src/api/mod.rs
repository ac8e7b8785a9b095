pub mod auth;
pub mod handlers;
pub mod response;
pub mod routes;

pub use routes::*;

use crate::config::AuthEntry;
use crate::store::DocumentStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub auth: Arc<Vec<AuthEntry>>,
}

impl AppState {
    pub fn new(store: Arc<DocumentStore>, auth: Vec<AuthEntry>) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
        }
    }
}
