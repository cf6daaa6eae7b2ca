//! HTTP API
//!
//! Exposes the network operations over JSON. The caller identity comes from
//! the `x-caller` header; every call locks the whole network so mutations are
//! applied one at a time.

pub mod error;
pub mod handlers;

use axum::{
    http::HeaderMap,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::airlines::types::AirlineId;
use crate::journal::JournalSink;
use crate::network::NetworkState;

pub use error::ApiError;

pub const CALLER_HEADER: &str = "x-caller";

/// Network plus the optional file its journal is mirrored to
pub struct SharedNetwork {
    pub network: NetworkState,
    pub sink: Option<JournalSink>,
}

impl SharedNetwork {
    /// Mirror new journal entries to disk, then release written entries
    /// beyond the sink's retention from memory. The state change has already
    /// happened, so a write failure is logged and retried on the next call.
    /// Without a sink the in-memory journal is the only record and is kept
    /// whole.
    pub fn persist(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            match sink.sync(self.network.journal()) {
                Ok(_) => {
                    let keep_from = sink.keep_from(self.network.journal());
                    self.network.discard_journal_before(keep_from);
                }
                Err(e) => error!("Failed to write journal to {:?}: {}", sink.path(), e),
            }
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    shared: Arc<Mutex<SharedNetwork>>,
}

impl AppState {
    pub fn new(network: NetworkState, sink: Option<JournalSink>) -> Self {
        let mut shared = SharedNetwork { network, sink };
        shared.persist();
        Self {
            shared: Arc::new(Mutex::new(shared)),
        }
    }

    pub fn shared(&self) -> &Arc<Mutex<SharedNetwork>> {
        &self.shared
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/operational",
            get(handlers::is_operational).put(handlers::set_operating_status),
        )
        .route("/airlines", post(handlers::register_airline))
        .route("/airlines/fund", post(handlers::fund))
        .route("/airlines/count", get(handlers::count_of_registered_airlines))
        .route("/airlines/:id", get(handlers::get_airline))
        .route("/airlines/:id/registered", get(handlers::is_airline_registered))
        .route("/proposals/:candidate", get(handlers::get_proposal))
        .route("/journal", get(handlers::journal))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(state)
}

/// Identity the request is made on behalf of
pub fn caller_from_headers(headers: &HeaderMap) -> Result<AirlineId, ApiError> {
    let raw = headers
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingCaller)?;

    Ok(AirlineId::parse(raw)?)
}
