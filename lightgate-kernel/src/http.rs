/**
 * HTTP FAÇADE - Login page gated by the status light
 *
 * The only surface visible from outside. It never touches the serial port,
 * it only reads the readiness flag kept up to date by the status monitor.
 *
 * - GET  /                    login page (index.html, verbatim)
 * - GET  /authenticated.html  success page (verbatim)
 * - GET  /status              {"connected": bool}, polled every 2s by the page
 * - POST /login               success only while the light is GREEN
 *
 * There are no credentials: the light is the whole authorization. Errors on
 * the serial side never reach a client, they only keep the light "red".
 */

use crate::state::Readiness;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub const LOGIN_PASSED: &str = "🔓 Quantum login passed!";
pub const LOGIN_LOCKED: &str = "Arduino not ready (red phase)";

#[derive(Clone)]
pub struct AppState {
    pub readiness: Readiness,
    pub static_dir: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub connected: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoginStatus {
    Success,
    Fail,
}

#[derive(Debug, Serialize)]
pub struct LoginReply {
    pub status: LoginStatus,
    pub message: &'static str,
}

impl LoginReply {
    pub fn for_light(ready: bool) -> Self {
        if ready {
            Self { status: LoginStatus::Success, message: LOGIN_PASSED }
        } else {
            Self { status: LoginStatus::Fail, message: LOGIN_LOCKED }
        }
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/authenticated.html", get(serve_authenticated))
        .route("/status", get(get_status))
        .route("/login", post(login))
        .with_state(app_state)
}

/// Serves until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app_state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!("listening on http://{addr}");
    axum::serve(listener, build_router(app_state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn send_page(app: &AppState, name: &str) -> Result<Html<Vec<u8>>, StatusCode> {
    let path = app.static_dir.join(name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(Html(bytes)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "static page unavailable");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

// GET /
async fn serve_index(State(app): State<AppState>) -> Result<Html<Vec<u8>>, StatusCode> {
    send_page(&app, "index.html").await
}

// GET /authenticated.html
async fn serve_authenticated(State(app): State<AppState>) -> Result<Html<Vec<u8>>, StatusCode> {
    send_page(&app, "authenticated.html").await
}

// GET /status
async fn get_status(State(app): State<AppState>) -> Json<StatusView> {
    Json(StatusView { connected: app.readiness.is_ready() })
}

// POST /login (body ignored)
async fn login(State(app): State<AppState>) -> Json<LoginReply> {
    Json(LoginReply::for_light(app.readiness.is_ready()))
}
