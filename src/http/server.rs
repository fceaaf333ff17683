//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeouts, body limit, CORS, request ID)
//! - Bind server to listener and stop on the shutdown signal

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    map_response_body::MapResponseBodyLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::blockchain::{ChainClient, TokenReader, TransactionPipeline};
use crate::config::GatewayConfig;
use crate::events::EventAggregator;
use crate::http::handlers;
use crate::http::request::{request_span, track_metrics};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ChainClient>,
    pub pipeline: Arc<TransactionPipeline>,
    pub aggregator: Arc<EventAggregator>,
    pub reader: Arc<TokenReader>,
    /// Wait used by the confirmation endpoint when the caller gives none.
    pub confirmation_wait: Duration,
    /// Upper bound on a caller-supplied confirmation wait.
    pub max_confirmation_wait: Duration,
}

impl AppState {
    pub fn new(
        client: Arc<dyn ChainClient>,
        pipeline: TransactionPipeline,
        aggregator: EventAggregator,
        reader: TokenReader,
    ) -> Self {
        Self {
            client,
            pipeline: Arc::new(pipeline),
            aggregator: Arc::new(aggregator),
            reader: Arc::new(reader),
            confirmation_wait: Duration::from_secs(30),
            max_confirmation_wait: Duration::from_secs(55),
        }
    }

    /// Default and maximum confirmation waits.
    pub fn with_confirmation_wait(mut self, default: Duration, max: Duration) -> Self {
        self.max_confirmation_wait = max;
        self.confirmation_wait = default.min(max);
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("confirmation_wait", &self.confirmation_wait)
            .field("max_confirmation_wait", &self.max_confirmation_wait)
            .finish_non_exhaustive()
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let cors = if config.security.permissive_cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/tokendetails", get(handlers::token_details))
        .route("/balance/{address}", get(handlers::balance))
        .route("/transferWithDetails", post(handlers::transfer_with_details))
        .route("/mint", post(handlers::mint))
        .route("/burn", post(handlers::burn))
        .route("/tokentransactiondetails", get(handlers::recorded_by_index))
        .route("/gtd", get(handlers::recorded_all))
        .route("/contract/transactions", get(handlers::contract_transactions))
        .route("/getTransactionDetails/{tx_hash}", get(handlers::transaction_details))
        .route("/transactions/{tx_hash}/confirmation", get(handlers::confirmation))
        .route("/accounts/{address}/history", get(handlers::account_history))
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(request_span))
                .layer(cors)
                .layer(MapResponseBodyLayer::new(axum::body::Body::new))
                .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
}

/// HTTP server for the token gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over prepared state.
    pub fn new(config: &GatewayConfig, state: AppState) -> Self {
        Self {
            router: build_router(state, config),
        }
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
