//! # HTTP Server
//!
//! Combines the service and database routers behind CORS, a body limit and
//! per-request logging.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::Method,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::observability::{Event, Logger};
use crate::store::{DatabaseConfig, DocumentStore, MemoryStore};

use super::config::HttpServerConfig;
use super::db_routes::{db_routes, SharedStore};
use super::health_routes::health_routes;

/// HTTP server for the proxy
pub struct HttpServer {
    config: HttpServerConfig,
    env_id: String,
    router: Router,
}

impl HttpServer {
    /// Serve `store` for the database environment in `database`
    pub fn new(config: HttpServerConfig, database: &DatabaseConfig, store: SharedStore) -> Self {
        let router = Self::build_router(&config, database, store);
        Self {
            config,
            env_id: database.env_id.clone(),
            router,
        }
    }

    /// Serve an in-process [`MemoryStore`]
    pub fn with_memory_store(config: HttpServerConfig, database: &DatabaseConfig) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new(database));
        Self::new(config, database, store)
    }

    fn build_router(
        config: &HttpServerConfig,
        database: &DatabaseConfig,
        store: SharedStore,
    ) -> Router {
        // Outermost first
        let layers = ServiceBuilder::new()
            .layer(cors_layer(&config.cors_origins))
            .layer(middleware::from_fn(log_request))
            .layer(DefaultBodyLimit::max(config.body_limit_bytes));

        Router::new()
            .merge(health_routes(&database.env_id))
            .nest("/db", db_routes(store))
            .layer(layers)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the listener fails
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;
        let addr_text = addr.to_string();

        Logger::info(
            Event::ServerStarting,
            &[("addr", &addr_text), ("env", &self.env_id)],
        );

        let listener = TcpListener::bind(addr).await?;
        Logger::info(Event::ServerReady, &[("addr", &addr_text)]);

        if let Err(e) = axum::serve(listener, self.router).await {
            Logger::error(Event::ServerFailed, &[("error", &e.to_string())]);
            return Err(e);
        }
        Ok(())
    }
}

/// Empty `origins` mirrors the caller's origin so credentials stay allowed
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|s| s.parse().ok()).collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::list([Method::GET, Method::POST, Method::OPTIONS]))
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let elapsed_ms = started.elapsed().as_millis().to_string();
    Logger::info(
        Event::HttpRequest,
        &[
            ("elapsed_ms", &elapsed_ms),
            ("method", &method),
            ("path", &path),
            ("status", response.status().as_str()),
        ],
    );
    response
}
