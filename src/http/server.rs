//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build relay endpoints from configuration
//! - Create the Axum router with every handler
//! - Wire up middleware (CORS, request ID, tracing, panic guard)
//! - Serve until told to stop

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::HeaderName,
    routing::{get, MethodRouter},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::schema::FixedRouteConfig;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, RelayConfig};
use crate::http::handlers::{self, AppState};
use crate::http::request::{RelayRequestId, X_REQUEST_ID};
use crate::http::response::panic_response;
use crate::relay::{HeaderPolicy, RelayEndpoint, RelayError, TargetSource, UpstreamClient};

/// Errors that stop the server from being built.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("fixed route {path}: {source}")]
    Route {
        path: String,
        #[source]
        source: RelayError,
    },

    #[error("fixed route {path}: environment variable {var} is not set")]
    MissingSecret { path: String, var: String },

    #[error("invalid proxy user agent: {0}")]
    UserAgent(#[source] RelayError),
}

/// HTTP server for the relay. Owns its router; nothing is global.
pub struct RelayServer {
    router: Router,
    config: Arc<RelayConfig>,
}

impl RelayServer {
    /// Build every endpoint described by `config`. Invalid configuration is
    /// reported before any route is mounted.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let client = UpstreamClient::new()?;
        let user_agent = config.proxy.user_agent.as_str();
        let proxy_timeout = Duration::from_secs(config.timeouts.upstream_secs);

        let proxy_get = RelayEndpoint {
            name: format!("GET {}", config.proxy.path),
            target: TargetSource::CallerSupplied,
            headers: HeaderPolicy::proxy_get(user_agent).map_err(ServerError::UserAgent)?,
            timeout: proxy_timeout,
        };
        let proxy_post = RelayEndpoint {
            name: format!("POST {}", config.proxy.path),
            target: TargetSource::CallerSupplied,
            headers: HeaderPolicy::proxy_post(user_agent).map_err(ServerError::UserAgent)?,
            timeout: proxy_timeout,
        };

        let fixed = config
            .fixed_routes
            .iter()
            .map(|route| fixed_endpoint(route, &config))
            .collect::<Result<Vec<_>, _>>()?;

        let mut endpoints = vec!["GET /health".to_string()];
        if config.proxy.enabled {
            endpoints.push(format!("GET {}?url=<target_url>", config.proxy.path));
            endpoints.push(format!("POST {}", config.proxy.path));
        }
        endpoints.extend(fixed.iter().map(|(path, _)| format!("GET {}", path)));

        let state = AppState {
            client,
            proxy_get: Arc::new(proxy_get),
            proxy_post: Arc::new(proxy_post),
            health_message: config.health.message.as_str().into(),
            liveness_message: config.liveness.message.as_str().into(),
            endpoints: endpoints.into(),
        };

        let router = Self::build_router(&config, state, fixed);
        Ok(Self {
            router,
            config: Arc::new(config),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &RelayConfig,
        state: AppState,
        fixed: Vec<(String, Arc<RelayEndpoint>)>,
    ) -> Router {
        let mut router = Router::new()
            .route("/", with_not_found(get(handlers::liveness)))
            .route("/health", with_not_found(get(handlers::health)));

        if config.proxy.enabled {
            router = router.route(
                &config.proxy.path,
                with_not_found(get(handlers::proxy_get).post(handlers::proxy_post)),
            );
        }

        for (path, endpoint) in fixed {
            let client = state.client.clone();
            let handler = get(move || handlers::fixed_route(client.clone(), endpoint.clone()));
            router = router.route(&path, with_not_found(handler));
        }

        let x_request_id = HeaderName::from_static(X_REQUEST_ID);
        let router = router
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, RelayRequestId));

        if config.cors.enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// The fully layered router, e.g. for driving it without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires. In-flight requests are
    /// not drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        tokio::select! {
            result = axum::serve(listener, self.router).into_future() => result?,
            _ = shutdown.recv() => tracing::info!("Shutdown requested, closing listener"),
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Unknown methods on a known path get the same 404 as unknown paths.
fn with_not_found(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(handlers::not_found)
}

fn fixed_endpoint(
    route: &FixedRouteConfig,
    config: &RelayConfig,
) -> Result<(String, Arc<RelayEndpoint>), ServerError> {
    let route_err = |source| ServerError::Route {
        path: route.path.clone(),
        source,
    };

    let secret = match &route.secret_env {
        Some(var) => Some(std::env::var(var).map_err(|_| ServerError::MissingSecret {
            path: route.path.clone(),
            var: var.clone(),
        })?),
        None => None,
    };

    let target: Url = crate::relay::target::parse_target(Some(&route.target)).map_err(route_err)?;
    let headers = HeaderPolicy::fixed(route, &config.proxy.user_agent, secret.as_deref())
        .map_err(route_err)?;
    let timeout = Duration::from_secs(route.timeout_secs.unwrap_or(config.timeouts.fixed_route_secs));

    let endpoint = RelayEndpoint {
        name: format!("GET {}", route.path),
        target: TargetSource::Fixed(target),
        headers,
        timeout,
    };
    Ok((route.path.clone(), Arc::new(endpoint)))
}
