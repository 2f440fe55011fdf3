use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use stream_metrics::{render, BuildInfo, CounterRegistry, CONTENT_TYPE};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CounterRegistry>,
    pub build_info: Arc<BuildInfo>,
    pub telemetry_path: Arc<str>,
}

pub fn router(state: AppState) -> Router {
    let telemetry_path = state.telemetry_path.to_string();

    let router = if telemetry_path == "/" {
        Router::new()
    } else {
        Router::new().route("/", get(landing_page))
    };

    router
        .route(&telemetry_path, get(metrics))
        .with_state(state)
}

/// Serves until `cancel` fires, then finishes in-flight scrapes.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(address) = listener.local_addr() {
        info!(
            "Serving metrics on http://{}{}",
            address, state.telemetry_path
        );
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("Metrics server stopped");
    Ok(())
}

async fn metrics(State(state): State<AppState>) -> Response {
    match render(&state.registry, Some(&state.build_info)) {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn landing_page(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>Twitter Stream Exporter</title></head>\n\
         <body>\n\
         <h1>Twitter Stream Exporter</h1>\n\
         <p><a href=\"{path}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        path = state.telemetry_path
    ))
}
