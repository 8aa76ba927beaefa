//! Application host: route table, middleware chain, and startup hooks.
//!
//! The host is an ordinary value handed from the entry point to the dispatcher; nothing
//! about it is global. [`AppHost::start`] consumes it, so startup hooks can only run once,
//! and the router only exists after they have all finished.

use crate::cors::CorsPolicy;
use crate::error::{AppError, ConfigError};
use crate::startup::StartupHook;
use axum::handler::Handler;
use axum::http::{Method, Uri};
use axum::routing::{get, on, MethodFilter, MethodRouter};
use axum::Router;
use std::collections::{BTreeSet, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Request/response interceptors, applied to every route and to the not-found fallback.
#[derive(Clone, Debug)]
pub enum Middleware {
    Cors(CorsPolicy),
    Trace,
    BodyLimit(usize),
}

impl Middleware {
    fn apply(&self, router: Router) -> Result<Router, ConfigError> {
        Ok(match self {
            Middleware::Cors(policy) => router.layer(policy.layer()?),
            Middleware::Trace => router.layer(TraceLayer::new_for_http()),
            Middleware::BodyLimit(limit) => router.layer(RequestBodyLimitLayer::new(*limit)),
        })
    }
}

#[derive(Clone, Debug)]
pub struct HostOptions {
    /// Label only; shown in logs and the API description.
    pub title: String,
    /// First entry is the outermost interceptor.
    pub middleware: Vec<Middleware>,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            title: env!("CARGO_PKG_NAME").into(),
            middleware: Vec::new(),
        }
    }
}

type RouteKey = (Method, String);

pub struct AppHost {
    title: String,
    middleware: Vec<Middleware>,
    routes: HashMap<RouteKey, MethodRouter>,
    startup: Vec<Box<dyn StartupHook>>,
}

impl AppHost {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_options(HostOptions {
            title: title.into(),
            ..HostOptions::default()
        })
    }

    pub fn with_options(options: HostOptions) -> Self {
        Self {
            title: options.title,
            middleware: options.middleware,
            routes: HashMap::new(),
            startup: Vec::new(),
        }
    }

    pub fn layer(&mut self, middleware: Middleware) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Register `handler` for `method` + `path`. Registering the same pair again replaces it.
    pub fn route<H, T>(&mut self, method: Method, path: &str, handler: H) -> Result<&mut Self, ConfigError>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let invalid = |reason| ConfigError::InvalidRoute {
            method: method.to_string(),
            path: path.to_string(),
            reason,
        };
        if !path.starts_with('/') {
            return Err(invalid("path must start with '/'"));
        }
        let filter = MethodFilter::try_from(method.clone()).map_err(|_| invalid("unsupported method"))?;
        self.check_path(path).map_err(invalid)?;
        if self
            .routes
            .insert((method.clone(), path.to_string()), on(filter, handler))
            .is_some()
        {
            debug!(%method, path, "route replaced");
        }
        Ok(self)
    }

    pub fn on_startup<H: StartupHook + 'static>(&mut self, hook: H) -> &mut Self {
        self.startup.push(Box::new(hook));
        self
    }

    /// Insert `path` next to every other registered path into a scratch router, so a path
    /// axum would reject (unnamed wildcard, clashing parameter names) fails here and not in `start`.
    fn check_path(&self, path: &str) -> Result<(), &'static str> {
        let mut paths: BTreeSet<&str> = self.routes.keys().map(|(_, p)| p.as_str()).collect();
        // same path under another verb is merged, not inserted twice
        paths.remove(path);
        catch_unwind(AssertUnwindSafe(|| {
            paths
                .iter()
                .copied()
                .chain(std::iter::once(path))
                .fold(Router::<()>::new(), |router, p| router.route(p, get(|| async {})))
        }))
        .map(|_| ())
        .map_err(|_| "rejected by the router: unnamed wildcard or conflicting route")
    }

    /// Registered (method, path) pairs ordered by path, then method.
    pub fn routes(&self) -> Vec<(Method, String)> {
        let mut out: Vec<_> = self.routes.keys().cloned().collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        out
    }

    /// Build the dispatcher, then run every startup hook in registration order.
    /// The first failing hook aborts the start.
    pub async fn start(self) -> Result<ReadyHost, AppError> {
        let AppHost {
            title,
            middleware,
            routes,
            startup,
        } = self;
        info!(title = %title, routes = routes.len(), hooks = startup.len(), "starting host");

        let router = build_router(routes, &middleware)?;

        for hook in &startup {
            debug!(hook = hook.name(), "running startup hook");
            if let Err(e) = hook.run().await {
                error!(hook = hook.name(), error = %e, "startup hook failed");
                return Err(AppError::Startup {
                    hook: hook.name().to_string(),
                    source: Box::new(e),
                });
            }
        }

        Ok(ReadyHost { title, router })
    }
}

fn build_router(routes: HashMap<RouteKey, MethodRouter>, middleware: &[Middleware]) -> Result<Router, ConfigError> {
    let mut by_path: HashMap<String, MethodRouter> = HashMap::new();
    for ((_, path), handler) in routes {
        let merged = match by_path.remove(&path) {
            Some(existing) => existing.merge(handler),
            None => handler,
        };
        by_path.insert(path, merged);
    }

    let mut router = by_path
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| router.route(&path, handler))
        .fallback(not_found);

    for m in middleware.iter().rev() {
        router = m.apply(router)?;
    }
    Ok(router)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// A host whose startup hooks have completed.
pub struct ReadyHost {
    title: String,
    router: Router,
}

impl ReadyHost {
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn serve(self, listener: TcpListener) -> Result<(), AppError> {
        let address = listener.local_addr()?;
        info!(title = %self.title, address = %address, "accepting requests");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
