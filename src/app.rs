use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Request, State, multipart::MultipartError},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use handlebars::TemplateError;
use log::{error, info, warn};
use serde::Deserialize;
use std::sync::{Arc, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::downloader;
use crate::graph::{ChartOptions, line_chart};
use crate::inspiration::random_quote;
use crate::render::Renderer;
use crate::session::{SessionState, SessionStore, SharedSession};

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "growth_session";

pub struct AppState {
    pub sessions: SessionStore,
    renderer: Renderer,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, TemplateError> {
        Ok(Self {
            sessions: SessionStore::new(config.session_ttl()),
            renderer: Renderer::new()?,
        })
    }
}

#[derive(Deserialize)]
struct ThemeForm {
    #[serde(default)]
    dark_mode: Option<String>,
}

#[derive(Deserialize)]
struct GoalForm {
    #[serde(default)]
    goal: String,
}

#[derive(Deserialize)]
struct ReflectionForm {
    #[serde(default)]
    reflection: String,
}

#[derive(Deserialize)]
struct TagForm {
    #[serde(default)]
    tag: String,
}

#[derive(Deserialize)]
struct ChartForm {
    #[serde(default)]
    x: String,
    #[serde(default)]
    y: String,
}

/// Build the router with fresh application state
pub fn create_router(config: &Config) -> Result<Router, TemplateError> {
    let state = Arc::new(AppState::new(config)?);
    Ok(router(state, config))
}

/// Build the router around existing application state
pub fn router(state: Arc<AppState>, config: &Config) -> Router {
    Router::new()
        .route("/", get(serve_page))
        .route("/theme", post(set_theme))
        .route("/goal", post(save_goal))
        .route("/upload", post(upload_file))
        .route("/chart", post(select_chart))
        .route("/chart.svg", get(chart_svg))
        .route("/reflections", post(save_reflection))
        .route("/tags", post(add_tag))
        .route("/tags/remove", post(remove_tag))
        .route("/convert", post(convert_file))
        .route("/api/state", get(session_snapshot))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes()))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Start the web server and serve until Ctrl-C
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(&config)?;

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} -> {} ({:?})",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

/// Log an internal error and return a generic response to the client
fn internal_error(e: impl std::fmt::Display) -> Response {
    error!("Internal error: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Resolve the caller's session, starting one if the cookie is missing,
/// malformed or expired. The returned jar carries the cookie for a new
/// session.
fn session(state: &AppState, jar: CookieJar) -> (CookieJar, SharedSession) {
    let id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

    let (id, session, created) = state.sessions.get_or_create(id);
    let jar = if created {
        jar.add(session_cookie(id))
    } else {
        jar
    };
    (jar, session)
}

fn lock(session: &SharedSession) -> MutexGuard<'_, SessionState> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run one action against the caller's session and send them back to the page
fn act(
    state: &AppState,
    jar: CookieJar,
    action: impl FnOnce(&mut SessionState),
) -> (CookieJar, Redirect) {
    let (jar, session) = session(state, jar);
    let mut guard = lock(&session);
    action(&mut *guard);
    drop(guard);
    (jar, Redirect::to("/"))
}

async fn serve_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session) = session(&state, jar);

    let rendered = {
        let mut guard = lock(&session);
        let notices = guard.take_notices();
        state.renderer.page(&guard, &notices, random_quote())
    };

    match rendered {
        Ok(html) => (jar, Html(html)).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn set_theme(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ThemeForm>,
) -> impl IntoResponse {
    act(&state, jar, |s| s.set_dark_mode(form.dark_mode.is_some()))
}

async fn save_goal(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<GoalForm>,
) -> impl IntoResponse {
    act(&state, jar, |s| {
        s.save_goal(&form.goal);
    })
}

async fn save_reflection(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ReflectionForm>,
) -> impl IntoResponse {
    act(&state, jar, |s| {
        s.save_reflection(&form.reflection);
    })
}

async fn add_tag(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<TagForm>,
) -> impl IntoResponse {
    act(&state, jar, |s| {
        s.add_tag(&form.tag);
    })
}

async fn remove_tag(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<TagForm>,
) -> impl IntoResponse {
    act(&state, jar, |s| {
        s.remove_tag(&form.tag);
    })
}

async fn select_chart(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ChartForm>,
) -> impl IntoResponse {
    act(&state, jar, |s| {
        s.select_chart(&form.x, &form.y);
    })
}

/// Pull the `file` field out of a multipart form.
///
/// Returns `None` when the field is absent or the browser sent it without a
/// chosen file.
async fn read_file(multipart: &mut Multipart) -> Result<Option<(String, Vec<u8>)>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        if file_name.is_empty() && bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some((file_name, bytes.to_vec())));
    }

    Ok(None)
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let upload = match read_file(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("failed to read upload: {}", e);
            return e.into_response();
        }
    };

    act(&state, jar, |s| match upload {
        Some((file_name, bytes)) => {
            if s.upload(&file_name, &bytes) {
                info!("loaded '{}' ({} bytes)", file_name, bytes.len());
            }
        }
        None => s.missing_file(),
    })
    .into_response()
}

async fn convert_file(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let upload = match read_file(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("failed to read conversion upload: {}", e);
            return e.into_response();
        }
    };

    let Some((file_name, bytes)) = upload else {
        return act(&state, jar, SessionState::missing_file).into_response();
    };

    match downloader::convert(&file_name, &bytes) {
        Ok(converted) => {
            let (jar, _) = session(&state, jar);
            let disposition = format!("attachment; filename=\"{}\"", converted.file_name);
            (
                jar,
                [
                    (header::CONTENT_TYPE, converted.content_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                converted.bytes,
            )
                .into_response()
        }
        Err(e) => {
            warn!("failed to convert '{}': {}", file_name, e);
            act(&state, jar, |s| s.conversion_failed(&e)).into_response()
        }
    }
}

async fn chart_svg(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session) = session(&state, jar);

    let rendered = {
        let guard = lock(&session);
        match (&guard.dataset, &guard.chart) {
            (Some(dataset), Some(selection)) => Some(line_chart(
                &dataset.table,
                &selection.x,
                &selection.y,
                &ChartOptions::default(),
            )),
            _ => None,
        }
    };

    match rendered {
        Some(Ok(svg)) => (
            jar,
            [
                (header::CONTENT_TYPE, "image/svg+xml"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            svg,
        )
            .into_response(),
        Some(Err(e)) => {
            warn!("failed to draw chart: {}", e);
            (StatusCode::NOT_FOUND, jar, e.to_string()).into_response()
        }
        None => (StatusCode::NOT_FOUND, jar, "No chart to display").into_response(),
    }
}

async fn session_snapshot(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session) = session(&state, jar);

    let snapshot = {
        let guard = lock(&session);
        serde_json::to_value(&*guard).map(|session_value| {
            serde_json::json!({
                "session": session_value,
                "numeric_columns": guard.numeric_columns(),
                "chart_enabled": guard.chart_enabled(),
                "notices": guard.notices(),
            })
        })
    };

    match snapshot {
        Ok(value) => (jar, Json(value)).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
