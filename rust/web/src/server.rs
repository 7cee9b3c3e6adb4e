use crate::events::EventBus;
use crate::handlers;
use crate::middleware::with_request_logging;
use crate::session::SessionManager;
use crate::static_handler::StaticHandler;
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::filters::BoxedFilter;
use warp::reply::{Reply, Response};
use warp::Filter;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 8080)
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            static_dir: None,
        }
    }

    /// Serve frontend files from `dir` ahead of the embedded copies.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    /// Loopback on an ephemeral port.
    pub fn for_tests() -> Self {
        Self::new("127.0.0.1", 0)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }
}

/// Shared components handed to every route.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: ServerConfig,
    event_bus: Arc<EventBus>,
    sessions: Arc<SessionManager>,
    static_handler: Arc<StaticHandler>,
}

impl AppContext {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let static_handler = match config.static_dir() {
            Some(dir) if !dir.is_dir() => {
                return Err(ServerError::ConfigError(format!(
                    "static directory `{}` does not exist",
                    dir.display()
                )))
            }
            Some(dir) => StaticHandler::with_root(dir),
            None => StaticHandler::embedded(),
        };

        let event_bus = Arc::new(EventBus::new());
        let sessions = Arc::new(SessionManager::new(Arc::clone(&event_bus)));
        Ok(Self::new_with_dependencies(
            config,
            event_bus,
            sessions,
            Arc::new(static_handler),
        ))
    }

    pub fn new_with_dependencies(
        config: ServerConfig,
        event_bus: Arc<EventBus>,
        sessions: Arc<SessionManager>,
        static_handler: Arc<StaticHandler>,
    ) -> Self {
        Self {
            config,
            event_bus,
            sessions,
            static_handler,
        }
    }

    pub fn new_for_tests() -> Self {
        let event_bus = Arc::new(EventBus::new());
        let sessions = Arc::new(SessionManager::new(Arc::clone(&event_bus)));
        Self::new_with_dependencies(
            ServerConfig::for_tests(),
            event_bus,
            sessions,
            Arc::new(StaticHandler::embedded()),
        )
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    pub fn static_handler(&self) -> Arc<StaticHandler> {
        Arc::clone(&self.static_handler)
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[derive(Debug, Clone)]
pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        Ok(Self {
            context: AppContext::new(config)?,
        })
    }

    pub fn from_context(context: AppContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Binds and serves in a background task. Expired page sessions are swept
    /// once a minute until the returned handle shuts the server down.
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let WebServer { context } = self;
        let bind_addr = Self::bind_addr(context.config())?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let routes = Self::routes(&context);
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        let (addr, server_future) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, shutdown_signal)
            .map_err(Self::map_warp_error)?;

        tracing::info!(%addr, "web server listening");

        let task = tokio::spawn(server_future);
        let sweeper = tokio::spawn({
            let sessions = context.sessions();
            async move {
                let mut interval = tokio::time::interval(SWEEP_INTERVAL);
                loop {
                    interval.tick().await;
                    sessions.cleanup_expired_sessions();
                }
            }
        });

        Ok(ServerHandle {
            addr,
            shutdown: Some(shutdown_tx),
            task: Some(task),
            sweeper,
            context,
        })
    }

    fn bind_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
        let host = config.host();

        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }

        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, config.port()));
        }

        let candidate = format!("{}:{}", host, config.port());
        let mut addrs = candidate.to_socket_addrs().map_err(|err| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`: {err}"))
        })?;

        addrs.next().ok_or_else(|| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`"))
        })
    }

    fn map_warp_error(err: warp::Error) -> ServerError {
        use std::error::Error as StdError;

        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>() {
                return ServerError::BindError(std::io::Error::new(
                    io_err.kind(),
                    io_err.to_string(),
                ));
            }
            source = cause.source();
        }

        ServerError::ConfigError(err.to_string())
    }

    pub fn routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        let routes = Self::health_route()
            .or(Self::static_routes(context))
            .unify()
            .or(Self::api_routes(context))
            .unify()
            .or(Self::sse_routes(context))
            .unify();
        with_request_logging(routes).boxed()
    }

    fn health_route() -> BoxedFilter<(Response,)> {
        warp::path("health")
            .and(warp::get())
            .and(warp::path::end())
            .map(|| handlers::health().into_response())
            .boxed()
    }

    fn static_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        let handler = context.static_handler();

        let index = warp::path::end()
            .and(warp::get())
            .and(Self::with_static_handler(handler.clone()))
            .and_then(|handler: Arc<StaticHandler>| async move {
                let response = handler
                    .index()
                    .await
                    .unwrap_or_else(|err| handler.error_response(err));
                Ok::<_, Infallible>(response)
            });

        let assets = warp::path("static")
            .and(warp::path::tail())
            .and(warp::get())
            .and(Self::with_static_handler(handler))
            .and_then(
                |tail: warp::path::Tail, handler: Arc<StaticHandler>| async move {
                    let response = handler
                        .asset(tail.as_str())
                        .await
                        .unwrap_or_else(|err| handler.error_response(err));
                    Ok::<_, Infallible>(response)
                },
            );

        index.or(assets).unify().boxed()
    }

    fn api_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        let sessions = context.sessions();

        let create = warp::path!("api" / "sessions")
            .and(warp::post())
            .and(Self::with_session_manager(sessions.clone()))
            .and(warp::body::json())
            .then(handlers::create_session);

        let info = warp::path!("api" / "sessions" / String)
            .and(warp::get())
            .and(Self::with_session_manager(sessions.clone()))
            .then(|id: String, sessions: Arc<SessionManager>| handlers::get_session(sessions, id));

        let state = warp::path!("api" / "sessions" / String / "state")
            .and(warp::get())
            .and(Self::with_session_manager(sessions.clone()))
            .then(|id: String, sessions: Arc<SessionManager>| {
                handlers::get_session_state(sessions, id)
            });

        let start = warp::path!("api" / "sessions" / String / "start")
            .and(warp::post())
            .and(Self::with_session_manager(sessions.clone()))
            .and(warp::body::json())
            .then(
                |id: String, sessions: Arc<SessionManager>, request: handlers::StartRequest| {
                    handlers::start_round(sessions, id, request)
                },
            );

        let names = warp::path!("api" / "sessions" / String / "names")
            .and(warp::post())
            .and(Self::with_session_manager(sessions.clone()))
            .and(warp::body::json())
            .then(
                |id: String, sessions: Arc<SessionManager>, request: handlers::NamesRequest| {
                    handlers::submit_names(sessions, id, request)
                },
            );

        let click = warp::path!("api" / "sessions" / String / "cards" / usize)
            .and(warp::post())
            .and(Self::with_session_manager(sessions.clone()))
            .then(
                |id: String, position: usize, sessions: Arc<SessionManager>| {
                    handlers::click_card(sessions, id, position)
                },
            );

        let reset = warp::path!("api" / "sessions" / String / "reset")
            .and(warp::post())
            .and(Self::with_session_manager(sessions.clone()))
            .then(|id: String, sessions: Arc<SessionManager>| handlers::reset_round(sessions, id));

        let delete = warp::path!("api" / "sessions" / String)
            .and(warp::delete())
            .and(Self::with_session_manager(sessions))
            .then(|id: String, sessions: Arc<SessionManager>| {
                handlers::delete_session(sessions, id)
            });

        create
            .or(state)
            .unify()
            .or(start)
            .unify()
            .or(names)
            .unify()
            .or(click)
            .unify()
            .or(reset)
            .unify()
            .or(info)
            .unify()
            .or(delete)
            .unify()
            .boxed()
    }

    fn sse_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        warp::path!("api" / "sessions" / String / "events")
            .and(warp::get())
            .and(Self::with_session_manager(context.sessions()))
            .and(Self::with_event_bus(context.event_bus()))
            .then(handlers::stream_events)
            .boxed()
    }

    fn with_static_handler(
        handler: Arc<StaticHandler>,
    ) -> impl Filter<Extract = (Arc<StaticHandler>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&handler))
    }

    fn with_session_manager(
        sessions: Arc<SessionManager>,
    ) -> impl Filter<Extract = (Arc<SessionManager>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&sessions))
    }

    fn with_event_bus(
        event_bus: Arc<EventBus>,
    ) -> impl Filter<Extract = (Arc<EventBus>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&event_bus))
    }
}

/// Running server. Dropping the handle stops it.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    sweeper: JoinHandle<()>,
    context: AppContext,
}

impl ServerHandle {
    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        self.sweeper.abort();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.await.map_err(|err| {
                ServerError::ConfigError(format!("server task join error: {err}"))
            })?;
        }

        tracing::info!(addr = %self.addr, "web server stopped");
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.sweeper.abort();
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_accepts_ip_and_socket_forms() {
        let addr = WebServer::bind_addr(&ServerConfig::new("127.0.0.1", 9000)).expect("ip");
        assert_eq!(addr.port(), 9000);

        let addr = WebServer::bind_addr(&ServerConfig::new("127.0.0.1:7000", 9000)).expect("sock");
        assert_eq!(addr.port(), 7000);
    }

    #[test]
    fn missing_static_dir_is_a_config_error() {
        let config = ServerConfig::default().with_static_dir("/definitely/not/here");
        assert!(matches!(
            AppContext::new(config),
            Err(ServerError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn routes_answer_health_and_index() {
        let context = AppContext::new_for_tests();
        let routes = WebServer::routes(&context);

        let health = warp::test::request().path("/health").reply(&routes).await;
        assert_eq!(health.status(), 200);
        let body: serde_json::Value = serde_json::from_slice(health.body()).expect("json");
        assert_eq!(body["status"], "ok");

        let index = warp::test::request().path("/").reply(&routes).await;
        assert_eq!(index.status(), 200);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let context = AppContext::new_for_tests();
        let routes = WebServer::routes(&context);

        let response = warp::test::request()
            .method("POST")
            .path("/api/sessions/nope/cards/3")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), 404);
        let body: serde_json::Value = serde_json::from_slice(response.body()).expect("json");
        assert_eq!(body["error"], "session_not_found");
    }
}
