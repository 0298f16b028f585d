use axum::Json;
use axum::Router;
use axum::middleware::from_fn;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::storage;
use crate::task::api::v1::TaskState;
use crate::task::repository::PostgresTaskRepository;
use crate::task::service::TaskService;

pub mod api;
pub mod middleware;

/// How long in-flight requests may run after a shutdown signal.
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<DatabaseConnection>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Builds the complete application router on top of an open database connection.
pub fn create_app(state: AppState) -> Router {
    let repository = PostgresTaskRepository::new(state.db.clone());
    let task_state = TaskState {
        service: TaskService::new(Arc::new(repository)),
        request_timeout: state.config.request_timeout(),
    };

    let api_router = api::create_api_router(Arc::new(task_state));

    with_middleware(
        Router::new()
            .route("/health", axum::routing::get(health_check_handler))
            .merge(api_router),
    )
}

/// Wraps a router in request logging, CORS and panic recovery.
///
/// Panics are caught innermost, so the logging middleware still records the 500.
fn with_middleware(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(from_fn(middleware::request_logging_middleware))
            .layer(CorsLayer::new())
            .layer(CatchPanicLayer::custom(middleware::handle_panic)),
    )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let db = storage::connect(&config.database_url).await?;

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!(
        "Starting server on http://{} ({})",
        server_address,
        config.environment
    );

    let app = create_app(AppState {
        config: Arc::new(config),
        db: Arc::new(db),
    });

    let (shutdown_started_tx, shutdown_started_rx) = oneshot::channel::<()>();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutting down server...");
        let _ = shutdown_started_tx.send(());
    })
    .into_future();

    let grace_period_elapsed = async move {
        if shutdown_started_rx.await.is_ok() {
            tokio::time::sleep(SHUTDOWN_GRACE_PERIOD).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => result?,
        _ = grace_period_elapsed => {
            tracing::warn!(
                "Server forced to shutdown after {:?}, dropping remaining connections",
                SHUTDOWN_GRACE_PERIOD
            );
        }
    }

    tracing::info!("Server exiting");
    Ok(())
}

/// Resolves once SIGINT or, on unix, SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
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
}

#[tracing::instrument]
pub async fn health_check_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn panicking_handler() -> &'static str {
        panic!("handler blew up")
    }

    #[tokio::test]
    async fn can_report_service_up() {
        let Json(response) = health_check_handler().await;

        assert_eq!(response, HealthResponse { status: "UP" });
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"status":"UP"}"#
        );
    }

    #[tokio::test]
    async fn can_recover_from_handler_panic() {
        let app = with_middleware(
            Router::new().route("/explode", axum::routing::get(panicking_handler)),
        );

        let response = app
            .oneshot(Request::builder().uri("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            serde_json::json!({"error": "Internal server error"})
        );
    }

    #[tokio::test]
    async fn can_serve_health_through_middleware() {
        let app = with_middleware(
            Router::new().route("/health", axum::routing::get(health_check_handler)),
        );

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
