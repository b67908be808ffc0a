use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use panels::{EventOutcome, PanelRegistry};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{Interaction, InteractionResponse},
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

mod app_state;
mod commands;
mod config;
mod transport;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

use app_state::AppState;
use config::{load_settings, prepare_database_url};
use transport::HttpTransport;

const MAX_INTERACTION_BYTES: usize = 64 * 1024;

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    if settings.platform_token.is_none() {
        warn!("PLATFORM_TOKEN is not set; platform requests are sent unauthenticated");
    }
    let transport = HttpTransport::new(&settings.platform_api_url, settings.platform_token.clone())?;
    let panels = PanelRegistry::new();

    let state = AppState {
        storage,
        transport: Arc::new(transport),
        panels: panels.clone(),
        panel_timeout: settings.panel_timeout(),
        admins: settings.admins(),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bot_bind.parse()?;
    info!(%addr, platform = %settings.platform_api_url, "bot listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    panels.shutdown().await;
    info!("bot stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for shutdown signal");
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/interactions", post(interactions))
        .layer(RequestBodyLimitLayer::new(MAX_INTERACTION_BYTES))
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Gone => StatusCode::GONE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn http_error(err: ApiError) -> HttpError {
    (status_for(err.code), Json(err))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.storage.health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::internal(e)),
        )
    })?;
    Ok("ok")
}

async fn interactions(
    State(state): State<Arc<AppState>>,
    Json(interaction): Json<Interaction>,
) -> Result<Json<InteractionResponse>, HttpError> {
    match interaction {
        Interaction::Command(command) => {
            commands::run_command(&state, &command)
                .await
                .map_err(|err| {
                    warn!(command = %command.name, error = %err, "command failed");
                    http_error(err)
                })?;
            Ok(Json(InteractionResponse { handled: true }))
        }
        Interaction::Component(event) => {
            let outcome = state.panels.dispatch(&event).await.map_err(|err| {
                error!(
                    message_id = %event.message_id,
                    control_id = %event.control_id,
                    error = %err,
                    "panel event failed"
                );
                http_error(commands::panel_error(err))
            })?;
            let handled = matches!(outcome, EventOutcome::Handled(_) | EventOutcome::Rejected);
            Ok(Json(InteractionResponse { handled }))
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
