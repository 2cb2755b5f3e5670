use crate::config::ServerConfig;
use crate::error::SignalError;
use crate::hub::{HubObserver, HubStats, TracingObserver};
use crate::signaling::{SignalingService, close_poll, open_poll, poll_events, push_event, ws_handler};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Точка подключения шины событий к HTTP-серверу процесса.
///
/// Создается один раз при старте и передается по ссылке. Повторный
/// `bootstrap()` возвращает уже запущенный хаб.
pub struct Bootstrap {
    config: ServerConfig,
    observer: Arc<dyn HubObserver>,
    service: OnceLock<SignalingService>,
}

impl Bootstrap {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    pub fn with_observer(config: ServerConfig, observer: Arc<dyn HubObserver>) -> Self {
        Self {
            config,
            observer,
            service: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Must be called inside a tokio runtime.
    pub fn bootstrap(&self) -> SignalingService {
        if let Some(service) = self.service.get() {
            warn!("Signaling already bootstrapped, reusing the running hub");
            return service.clone();
        }
        self.service
            .get_or_init(|| SignalingService::spawn(self.config.clone(), self.observer.clone()))
            .clone()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.service.get().is_some()
    }

    pub fn router(&self) -> Router {
        let service = self.bootstrap();
        let path = service.config().path.clone();

        let router = Router::new()
            .route(&path, get(ws_handler))
            .route(&format!("{path}/poll"), post(open_poll))
            .route(
                &format!("{path}/poll/{{id}}"),
                get(poll_events).post(push_event).delete(close_poll),
            )
            .route("/healthz", get(healthz))
            .with_state(service);

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    pub fn attach(&self, app: Router) -> Router {
        app.merge(self.router())
    }

    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), SignalError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.config.validate()?;
        let app = self.router();
        if let Ok(addr) = listener.local_addr() {
            info!("Signaling server listening on {}{}", addr, self.config.path);
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(SignalError::Serve)
    }

    pub async fn serve(&self) -> Result<(), SignalError> {
        self.config.validate()?;
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| SignalError::Bind { addr, source })?;

        self.serve_until(listener, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
    }
}

async fn healthz(State(service): State<SignalingService>) -> Response {
    match service.stats().await {
        Ok(stats) => Json::<HubStats>(stats).into_response(),
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
