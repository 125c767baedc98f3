//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the axum Router with all six routes
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Share the registry, cache, compiler and compile pool with handlers
//! - Serve plain TCP or TLS until a shutdown signal arrives
//!
//! All routes are installed before the listener starts accepting, so a
//! request can never observe a half-wired server.

use axum::routing::get;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::cache::ResultCache;
use crate::compiler::{CompilePool, Compiler};
use crate::config::schema::ServerSettings;
use crate::http::handlers;
use crate::http::request::RequestIdLayer;
use crate::registry::ConfigRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: ConfigRegistry,
    pub cache: ResultCache,
    pub compiler: Arc<dyn Compiler>,
    pub pool: CompilePool,
}

/// The compilation coordination server.
pub struct HttpServer {
    router: Router,
    settings: ServerSettings,
}

impl HttpServer {
    /// Create a new server over the given collaborators.
    pub fn new(
        settings: ServerSettings,
        registry: ConfigRegistry,
        cache: ResultCache,
        compiler: Arc<dyn Compiler>,
    ) -> Self {
        let state = AppState {
            registry,
            cache,
            compiler,
            pool: CompilePool::new(settings.compile.max_concurrent),
        };
        let router = Self::build_router(&settings, state);
        Self { router, settings }
    }

    /// Build the axum router with all middleware layers.
    fn build_router(settings: &ServerSettings, state: AppState) -> Router {
        Router::new()
            .route("/compile", get(handlers::compile).post(handlers::compile))
            .route("/externs", get(handlers::externs))
            .route("/input", get(handlers::input))
            .route("/size", get(handlers::size))
            .route("/sourcemap", get(handlers::source_map))
            .route("/view", get(handlers::view))
            .with_state(state)
            .layer(axum::middleware::from_fn(handlers::track_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(
                settings.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve plain HTTP on the given listener until shutdown.
    ///
    /// Does not return under normal operation; in-flight requests are
    /// drained once the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on the given address until shutdown.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let handle = axum_server::Handle::new();
        {
            let handle = handle.clone();
            tokio::spawn(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining requests");
                handle.graceful_shutdown(Some(Duration::from_secs(30)));
            });
        }

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the settings.
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }
}
