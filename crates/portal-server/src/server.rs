use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware, routing::get};
use portal_db_memory::create_storage;
use portal_notifications::NotificationService;
use portal_ratelimit::ANONYMOUS_IDENTIFIER;
use portal_storage::DynStorage;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    handlers,
    middleware as app_middleware,
    routes::{admin_routes, auth_routes, collaborator_routes, innovator_routes},
    state::AppState,
};

pub struct PortalServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        .merge(collaborator_routes(&state))
        .merge(innovator_routes(&state))
        .merge(admin_routes(&state))
        .merge(auth_routes(&state))
        // Middleware stack, last added runs first:
        // request id -> cors -> compression -> trace -> body limit
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(app_middleware::request_id))
        .with_state(state)
}

pub struct ServerBuilder {
    config: AppConfig,
    storage: Option<DynStorage>,
    notifications: Option<Arc<NotificationService>>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            storage: None,
            notifications: None,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    pub fn with_storage(mut self, storage: DynStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_notifications(mut self, notifications: Arc<NotificationService>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Wires services and starts the cache sweeper.
    pub fn build(self) -> anyhow::Result<PortalServer> {
        let cfg = self.config;
        cfg.validate().map_err(anyhow::Error::msg)?;

        let storage = self.storage.unwrap_or_else(create_storage);
        let notifications = match self.notifications {
            Some(notifications) => notifications,
            None => Arc::new(NotificationService::from_config(
                &cfg.notifications,
                cfg.base_url(),
            )?),
        };

        let state = AppState::new(&cfg, storage, notifications);
        state.cache.start_sweeper(cfg.cache.sweep_interval);
        tracing::warn!(
            bucket = ANONYMOUS_IDENTIFIER,
            "requests without x-forwarded-for share one rate limit bucket; \
             run behind a proxy that sets it"
        );

        Ok(PortalServer {
            addr: cfg.addr(),
            app: build_app(state.clone()),
            state,
        })
    }
}

impl PortalServer {
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.state.cache.destroy();
        tracing::info!("cache released, server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
