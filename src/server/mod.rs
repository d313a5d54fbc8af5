//! Reader server
//!
//! Pages are rendered per request from the store, so a scheduled post shows
//! up on the first request after its publish time without regenerating.

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::Post;
use crate::generator::{posts_json, Generator};
use crate::helpers::{post_id_from_file, POSTS_DIR};
use crate::Daybook;

/// Server state
struct ServerState {
    daybook: Daybook,
    generator: Generator,
}

impl ServerState {
    /// Published posts after promoting anything that is due
    fn load_published(&self) -> Vec<Post> {
        let store = self.daybook.store();
        match store.promote_due(Utc::now()) {
            Ok(promoted) if !promoted.is_empty() => {
                tracing::info!("Promoted {} scheduled posts", promoted.len());
            }
            Ok(_) => {}
            // Still serve what is there
            Err(e) => tracing::warn!("Failed to promote scheduled posts: {}", e),
        }
        store.list_published()
    }
}

/// Store access reads files and may wait on the store lock, so it runs off
/// the async workers
async fn published(state: &Arc<ServerState>) -> Result<Vec<Post>> {
    let state = Arc::clone(state);
    Ok(tokio::task::spawn_blocking(move || state.load_published()).await?)
}

/// Build the router serving the reader pages, with static files from the
/// assets directory and then the public directory as fallback.
pub fn router(daybook: &Daybook) -> Result<Router> {
    let state = Arc::new(ServerState {
        daybook: daybook.clone(),
        generator: Generator::new(daybook)?,
    });

    let files = ServeDir::new(&daybook.assets_dir).fallback(ServeDir::new(&daybook.public_dir));

    Ok(Router::new()
        .route("/", get(home_handler))
        .route("/index.html", get(home_handler))
        .route("/archive.html", get(archive_handler))
        .route("/posts.json", get(posts_json_handler))
        .route(&format!("/{}/:file", POSTS_DIR), get(post_handler))
        .fallback_service(files)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the server
pub async fn start(daybook: &Daybook, ip: &str, port: u16, open: bool) -> Result<()> {
    let app = router(daybook)?;

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn home_handler(State(state): State<Arc<ServerState>>) -> Response {
    let posts = match published(&state).await {
        Ok(posts) => posts,
        Err(e) => return server_error(e),
    };
    html_response(state.generator.render_home(&posts, Utc::now()))
}

async fn archive_handler(State(state): State<Arc<ServerState>>) -> Response {
    let posts = match published(&state).await {
        Ok(posts) => posts,
        Err(e) => return server_error(e),
    };
    html_response(state.generator.render_archive(&posts, Utc::now()))
}

async fn post_handler(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let now = Utc::now();
    let posts = match published(&state).await {
        Ok(posts) => posts,
        Err(e) => return server_error(e),
    };

    // Raw segment, so ids are decoded exactly once
    let prefix = format!("/{}/", POSTS_DIR);
    let id = uri
        .path()
        .strip_prefix(prefix.as_str())
        .and_then(post_id_from_file);

    let page = match id {
        Some(id) => state.generator.render_post(&posts, &id, now),
        None => Ok(None),
    };

    match page {
        Ok(Some(html)) => Html(html).into_response(),
        Ok(None) => {
            tracing::debug!("No post for {}", uri.path());
            match state.generator.render_not_found(now) {
                Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
                Err(e) => server_error(e),
            }
        }
        Err(e) => server_error(e),
    }
}

async fn posts_json_handler(State(state): State<Arc<ServerState>>) -> Response {
    let posts = match published(&state).await {
        Ok(posts) => posts,
        Err(e) => return server_error(e),
    };
    match posts_json(&posts) {
        Ok(json) => ([(header::CONTENT_TYPE, "application/json")], json).into_response(),
        Err(e) => server_error(e),
    }
}

fn html_response(result: Result<String>) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(e) => server_error(e),
    }
}

fn server_error(e: anyhow::Error) -> Response {
    tracing::error!("Request failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ScheduledPost;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn setup() -> (TempDir, Daybook) {
        let dir = tempfile::tempdir().unwrap();
        let daybook = Daybook::new(dir.path()).unwrap();
        (dir, daybook)
    }

    async fn get_page(app: Router, path: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_post_page_and_not_found() {
        let (_dir, daybook) = setup();
        let post = daybook
            .store()
            .create_post("Served", "Fresh *off* the press.", Vec::new(), Utc::now())
            .unwrap();

        let app = router(&daybook).unwrap();
        let (status, body) = get_page(app.clone(), &format!("/posts/{}.html", post.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<em>off</em>"));

        let (status, body) = get_page(app, "/posts/missing.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Post not found"));
    }

    #[tokio::test]
    async fn test_due_post_appears_on_next_request() {
        let (_dir, daybook) = setup();
        let now = Utc::now();
        daybook
            .store()
            .add_scheduled(ScheduledPost {
                id: "due-now".to_string(),
                title: "Right On Time".to_string(),
                content: "Here it is.".to_string(),
                images: Vec::new(),
                scheduled_for: now - Duration::seconds(1),
                created_at: now - Duration::days(1),
            })
            .unwrap();

        let app = router(&daybook).unwrap();
        let (status, body) = get_page(app, "/archive.html").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Right On Time"));
        assert!(daybook.store().list_scheduled().is_empty());
        assert!(daybook.store().get_post("due-now").is_some());
    }

    #[tokio::test]
    async fn test_posts_json() {
        let (_dir, daybook) = setup();
        daybook
            .store()
            .create_post("One", "Body", Vec::new(), Utc::now())
            .unwrap();

        let (status, body) = get_page(router(&daybook).unwrap(), "/posts.json").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["posts"][0]["title"], "One");
    }
}
