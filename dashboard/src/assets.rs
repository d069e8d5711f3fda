//! Static assets under `/assets/`
//!
//! The stylesheet and script ship inside the binary. Setting
//! `server.assets_dir` serves that directory instead, which is handy while
//! editing the frontend. Methods other than GET/HEAD fall through to the
//! page handler the caller supplies, like any other unmatched request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Path as UrlPath, Request};
use axum::handler::Handler;
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;
use tower_http::services::ServeDir;

const PREFIX: &str = "/assets";

struct Asset {
    path: &'static str,
    bytes: &'static [u8],
}

static EMBEDDED: &[Asset] = &[
    Asset {
        path: "css/otto.css",
        bytes: include_bytes!("../assets/css/otto.css"),
    },
    Asset {
        path: "js/main.js",
        bytes: include_bytes!("../assets/js/main.js"),
    },
];

/// Routes for `/assets/*`, from disk when `dir` is given, else embedded.
///
/// `page` answers requests on these paths with a method other than GET/HEAD.
pub fn routes<S, H, T>(dir: Option<&Path>, page: H) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    H: Handler<T, S>,
    T: 'static,
{
    let files = match dir {
        Some(dir) => {
            let dir = Arc::new(dir.to_path_buf());
            get(move |request: Request| from_disk(dir.clone(), request))
        }
        None => get(embedded),
    };
    Router::new().route("/assets/*path", files.fallback(page))
}

async fn from_disk(dir: Arc<PathBuf>, mut request: Request) -> Response {
    let path = request.uri().path();
    let relative: Uri = path.strip_prefix(PREFIX).unwrap_or(path).parse().unwrap_or_default();
    *request.uri_mut() = relative;

    match ServeDir::new(dir.as_path()).oneshot(request).await {
        Ok(resp) => resp.into_response(),
        Err(never) => match never {},
    }
}

async fn embedded(UrlPath(path): UrlPath<String>) -> Response {
    match lookup(&path) {
        Some(bytes) => ([(header::CONTENT_TYPE, content_type(&path))], bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn lookup(path: &str) -> Option<&'static [u8]> {
    EMBEDDED.iter().find(|a| a.path == path).map(|a| a.bytes)
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(dir: Option<&Path>) -> Router {
        routes(dir, || async { "page" })
    }

    async fn send(app: Router, method: Method, uri: &str) -> Response {
        app.oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn get_asset(app: Router, uri: &str) -> Response {
        send(app, Method::GET, uri).await
    }

    async fn body_of(resp: Response) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("css/otto.css"), "text/css; charset=utf-8");
        assert_eq!(content_type("js/main.js"), "text/javascript; charset=utf-8");
        assert_eq!(content_type("LICENSE"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_embedded_asset_served() {
        let resp = get_asset(app(None), "/assets/js/main.js").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );
        assert_eq!(body_of(resp).await, lookup("js/main.js").unwrap());
    }

    #[tokio::test]
    async fn test_missing_embedded_asset_is_404() {
        let resp = get_asset(app(None), "/assets/nonexistent.css").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_assets_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/site.css"), "body{}").unwrap();

        let resp = get_asset(app(Some(dir.path())), "/assets/css/site.css").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_of(resp).await, b"body{}");

        let resp = get_asset(app(Some(dir.path())), "/assets/nonexistent.css").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_methods_fall_through_to_page() {
        let resp = send(app(None), Method::POST, "/assets/js/main.js").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_of(resp).await, b"page");

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.css"), "body{}").unwrap();
        let resp = send(app(Some(dir.path())), Method::DELETE, "/assets/site.css").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_of(resp).await, b"page");
    }

    #[tokio::test]
    async fn test_head_serves_asset_headers() {
        let resp = send(app(None), Method::HEAD, "/assets/css/otto.css").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    }
}
