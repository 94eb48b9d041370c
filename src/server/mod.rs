//! Development server
//!
//! Serves the generated site, renders posts that were not pre-rendered on
//! first request and exposes the "load more" step as JSON.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::ContentLoader;
use crate::error::ContentError;
use crate::generator::Generator;
use crate::helpers::{decode_segment, is_safe_slug};
use crate::prismic::ContentService;
use crate::Site;

/// Server state
struct ServerState {
    site: Site,
    generator: Generator,
    service: Arc<dyn ContentService>,
}

#[derive(Debug, Deserialize)]
struct CursorParams {
    cursor: String,
}

/// Start the development server
pub async fn start(
    site: &Site,
    service: Arc<dyn ContentService>,
    ip: &str,
    port: u16,
) -> Result<()> {
    let app = router(site, service)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(site: &Site, service: Arc<dyn ContentService>) -> Result<Router> {
    let state = Arc::new(ServerState {
        site: site.clone(),
        generator: Generator::new(site)?,
        service,
    });

    Ok(Router::new()
        .route("/api/posts", get(api_posts))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// One "load more" step: the page behind `cursor`, transformed
async fn api_posts(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<CursorParams>,
) -> Response {
    let loader = ContentLoader::new(state.service.as_ref(), &state.site.config);

    match loader.load_page(&params.cursor).await {
        Ok(page) => Json(page).into_response(),
        Err(e @ ContentError::InvalidCursor(_)) => {
            json_error(StatusCode::BAD_REQUEST, &e.to_string())
        }
        Err(e) => {
            tracing::warn!("Failed to load posts from {}: {}", params.cursor, e);
            json_error(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Serve files from the public dir, rendering missing posts on demand
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let slug = post_slug(&state.site, request.uri().path());

    let mut service = ServeDir::new(&state.site.public_dir).append_index_html_on_directories(true);
    let response = match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    };

    match slug {
        Some(slug) if response.status() == StatusCode::NOT_FOUND => {
            render_missing_post(&state, &slug).await
        }
        _ => response,
    }
}

async fn render_missing_post(state: &ServerState, slug: &str) -> Response {
    let loader = ContentLoader::new(state.service.as_ref(), &state.site.config);

    match state.generator.generate_post_page(&loader, slug).await {
        Ok(path) => match tokio::fs::read_to_string(&path).await {
            Ok(html) => Html(html).into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        },
        Err(e) => match e.downcast_ref::<ContentError>() {
            Some(ContentError::NotFound { .. }) => (StatusCode::NOT_FOUND, "Not found").into_response(),
            _ => {
                tracing::warn!("Failed to render post {:?}: {:#}", slug, e);
                (StatusCode::BAD_GATEWAY, "Failed to load post").into_response()
            }
        },
    }
}

/// The decoded slug of a `/post/{slug}/` request path
fn post_slug(site: &Site, path: &str) -> Option<String> {
    let root = site.config.root.trim_end_matches('/');
    let post_dir = site.config.post_dir.trim_matches('/');

    let rest = path.strip_prefix(root)?.strip_prefix('/')?;
    let rest = rest.strip_prefix(post_dir)?.strip_prefix('/')?;
    let slug = rest.strip_suffix("/index.html").unwrap_or(rest);
    let slug = decode_segment(slug.strip_suffix('/').unwrap_or(slug))?;

    is_safe_slug(&slug).then_some(slug)
}
