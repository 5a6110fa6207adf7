//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, request ID, timeout, access log, route lookup)
//! - Serve on a connection-limited listener
//! - Graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use hyper_util::{client::legacy::{connect::HttpConnector, Client}, rt::TokioExecutor};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::LookupConfig;
use crate::http::access_log::access_log_middleware;
use crate::http::proxy::{proxy_handler, HttpClient};
use crate::net::BoundedListener;
use crate::observability::metrics::MetricsReporter;
use crate::registry::Registry;
use crate::routing::lookup::{lookup_middleware, LookupHandler};

/// HTTP server for the lookup proxy.
pub struct HttpServer {
    router: Router,
    max_connections: usize,
}

impl HttpServer {
    /// Create a new HTTP server resolving routes against `registry`.
    pub fn new(
        config: LookupConfig,
        registry: Arc<dyn Registry>,
        reporter: Arc<dyn MetricsReporter>,
    ) -> Self {
        let lookup = Arc::new(LookupHandler::new(registry, reporter));
        let client: HttpClient = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let router = Self::build_router(&config, lookup, client);
        Self {
            router,
            max_connections: config.listener.max_connections,
        }
    }

    /// Build the Axum router with all middleware layers.
    /// Layers run outermost-last: trace, request ID, timeout, access log, lookup.
    #[allow(deprecated)]
    fn build_router(config: &LookupConfig, lookup: Arc<LookupHandler>, client: HttpClient) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(client)
            .layer(middleware::from_fn_with_state(lookup, lookup_middleware))
            .layer(middleware::from_fn(access_log_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    ///
    /// At most `listener.max_connections` connections are served at once.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_connections = self.max_connections,
            "HTTP server starting"
        );

        let listener = BoundedListener::new(listener, self.max_connections);
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
