//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method dispatch, the comment API
//! path, and fallback to static files.

use hyper::body::Body;
use hyper::header::CONTENT_LENGTH;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;

use super::comments;
use super::static_files::{self, RequestContext};
use crate::config::AppState;
use crate::http::{self, ResponseBody};
use crate::logger;

/// Path of the comment API
pub const COMMENTS_PATH: &str = "/api/comments";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible>
where
    B: Body,
    B::Error: Display,
{
    let response = route_request(req, &state).await;
    Ok(http::with_server_header(
        response,
        &state.config.http.server_name,
    ))
}

async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Display,
{
    let is_comments_path = req.uri().path() == COMMENTS_PATH;
    let method = req.method().clone();

    match method {
        Method::OPTIONS => http::build_options_response(),
        Method::GET | Method::HEAD => {
            // HEAD on the API path is answered like any other static path
            if is_comments_path && method == Method::GET {
                if let Some(post_id) = comments::post_query_param(req.uri().query()) {
                    return comments::list_comments(post_id, state).await;
                }
            }
            static_files::serve(&RequestContext::from_request(&req), &state.config.static_files)
                .await
        }
        Method::POST if is_comments_path => {
            if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
                return resp;
            }
            comments::create_comment(req, state).await
        }
        _ => {
            logger::log_warning(&format!(
                "Unsupported request: {method} {}",
                req.uri().path()
            ));
            http::build_501_response(&method)
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<ResponseBody>> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    let Ok(size_str) = content_length.to_str() else {
        logger::log_warning("Content-Length header contains non-ASCII characters");
        return None;
    };
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::StatusCode;
    use serde_json::Value;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        state: Arc<AppState>,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("site");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("index.html"), "<h1>blog</h1>").unwrap();

        let mut config = Config::load_from("no-such-config-file").unwrap();
        config.storage.data_file = dir
            .path()
            .join("data/comments.json")
            .display()
            .to_string();
        config.static_files.root = root.display().to_string();
        config.http.max_body_size = 65_536;

        let state = Arc::new(AppState::new(&config).unwrap());
        Fixture { _dir: dir, state }
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(body.to_owned())))
            .unwrap()
    }

    async fn send(fx: &Fixture, req: Request<Full<Bytes>>) -> (StatusCode, hyper::HeaderMap, String) {
        let response = handle_request(req, Arc::clone(&fx.state)).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (parts.status, parts.headers, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn post_comment(fx: &Fixture, body: &str) -> (StatusCode, hyper::HeaderMap, String) {
        send(fx, request(Method::POST, COMMENTS_PATH, body)).await
    }

    async fn list(fx: &Fixture, post: &str) -> Vec<Value> {
        let (status, headers, body) =
            send(fx, request(Method::GET, &format!("{COMMENTS_PATH}?post={post}"), "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["Content-Type"], "application/json");
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");
        serde_json::from_str(&body).unwrap()
    }

    #[tokio::test]
    async fn test_post_creates_comment() {
        let fx = fixture();
        let (status, headers, body) = post_comment(
            &fx,
            r#"{"author": "  Ada ", "text": "Nice post", "post_id": "hello", "website": "https://ada.dev"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");

        let created: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created["id"].as_str().unwrap().len(), 8);
        assert_eq!(created["author"], "Ada");
        assert_eq!(created["email"], "");
        assert_eq!(created["website"], "https://ada.dev");
        assert_eq!(created["parent_id"], Value::Null);
        assert_eq!(created["approved"], true);
        assert_eq!(created["time_formatted"], "just now");
    }

    #[tokio::test]
    async fn test_created_comment_is_listed() {
        let fx = fixture();
        let (_, _, body) = post_comment(
            &fx,
            r#"{"author": "Ada", "text": "first", "post_id": "hello"}"#,
        )
        .await;
        let created: Value = serde_json::from_str(&body).unwrap();
        post_comment(&fx, r#"{"author": "Bob", "text": "second", "post_id": "hello"}"#).await;
        post_comment(&fx, r#"{"author": "Eve", "text": "elsewhere", "post_id": "other"}"#).await;

        let listed = list(&fx, "hello").await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["id"], created["id"]);
        assert_eq!(listed[0]["text"], "first");
        assert_eq!(listed[1]["text"], "second");
        assert_eq!(listed[0]["time_formatted"], "just now");

        assert!(list(&fx, "unknown").await.is_empty());
    }

    #[tokio::test]
    async fn test_every_field_survives_post_then_get() {
        let fx = fixture();
        let (status, _, body) = post_comment(
            &fx,
            r#"{"author": " Ada ", "email": " ada@example.com\n", "website": "  https://ada.dev ",
                "text": "\tNice post ", "post_id": " hello ", "parent_id": 42}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_str(&body).unwrap();

        let listed = list(&fx, "hello").await;
        assert_eq!(listed.len(), 1);
        let stored = &listed[0];
        assert_eq!(stored["id"], created["id"]);
        assert_eq!(stored["author"], "Ada");
        assert_eq!(stored["email"], "ada@example.com");
        assert_eq!(stored["website"], "https://ada.dev");
        assert_eq!(stored["text"], "Nice post");
        assert_eq!(stored["post_id"], "hello");
        assert_eq!(stored["parent_id"], 42);
        assert_eq!(stored["approved"], true);
        assert_eq!(stored["timestamp"], created["timestamp"]);
        assert_eq!(created["parent_id"], 42);
    }

    #[tokio::test]
    async fn test_string_parent_id_round_trips() {
        let fx = fixture();
        let (_, _, body) = post_comment(
            &fx,
            r#"{"author": "Bob", "text": "reply", "post_id": "p", "parent_id": "1a2b3c4d"}"#,
        )
        .await;
        let created: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created["parent_id"], "1a2b3c4d");
        assert_eq!(list(&fx, "p").await[0]["parent_id"], "1a2b3c4d");
    }

    #[tokio::test]
    async fn test_existing_numeric_parent_id_is_tolerated() {
        let fx = fixture();
        std::fs::write(
            &fx.state.config.storage.data_file,
            r#"{"p": [{"id": "1a2b3c4d", "author": "Bob", "email": "", "website": null,
                "text": "hi", "timestamp": "2023-11-02T09:15:00.123000", "post_id": "p",
                "parent_id": 7, "approved": true}]}"#,
        )
        .unwrap();

        assert!(list(&fx, "q").await.is_empty());
        let (status, _, _) =
            post_comment(&fx, r#"{"author": "Ada", "text": "hi", "post_id": "q"}"#).await;
        assert_eq!(status, StatusCode::CREATED);

        let old = list(&fx, "p").await;
        assert_eq!(old[0]["parent_id"], 7);
        assert_eq!(old[0]["timestamp"], "2023-11-02T09:15:00.123000");
        assert_eq!(list(&fx, "q").await.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_posts_are_all_stored() {
        let fx = fixture();
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let state = Arc::clone(&fx.state);
                let body = format!(r#"{{"author": "a{i}", "text": "t", "post_id": "busy"}}"#);
                tokio::spawn(async move {
                    let req = request(Method::POST, COMMENTS_PATH, &body);
                    handle_request(req, state).await.unwrap().status()
                })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::CREATED);
        }
        assert_eq!(list(&fx, "busy").await.len(), 8);
    }

    #[tokio::test]
    async fn test_listing_is_idempotent() {
        let fx = fixture();
        post_comment(&fx, r#"{"author": "Ada", "text": "hi", "post_id": "p"}"#).await;

        let strip = |mut comments: Vec<Value>| {
            for c in &mut comments {
                c.as_object_mut().unwrap().remove("time_formatted");
            }
            comments
        };
        assert_eq!(strip(list(&fx, "p").await), strip(list(&fx, "p").await));
    }

    #[tokio::test]
    async fn test_fields_are_truncated() {
        let fx = fixture();
        let body = serde_json::json!({
            "author": "a".repeat(150),
            "text": "t".repeat(6000),
            "post_id": "p",
        })
        .to_string();
        let (status, _, body) = post_comment(&fx, &body).await;
        assert_eq!(status, StatusCode::CREATED);

        let created: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(created["author"].as_str().unwrap().len(), 100);
        assert_eq!(created["text"].as_str().unwrap().len(), 5000);
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let fx = fixture();
        let (status, headers, body) = post_comment(&fx, "not-json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(body, "Invalid JSON");
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let fx = fixture();
        for body in [
            r#"{"author": "", "text": "hi", "post_id": "p"}"#,
            r#"{"text": "hi", "post_id": "p"}"#,
            r#"{"author": "Ada", "text": "hi"}"#,
        ] {
            let (status, _, body) = post_comment(&fx, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, "Missing required fields");
        }
        assert!(list(&fx, "p").await.is_empty());
    }

    #[tokio::test]
    async fn test_get_without_post_falls_through() {
        let fx = fixture();
        let (status, headers, _) = send(&fx, request(Method::GET, COMMENTS_PATH, "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_ne!(
            headers.get("Content-Type").map(|v| v.to_str().unwrap()),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_static_fallback() {
        let fx = fixture();
        let (status, _, body) = send(&fx, request(Method::GET, "/", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>blog</h1>");
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let fx = fixture();
        for uri in [COMMENTS_PATH, "/anything"] {
            let (status, headers, body) = send(&fx, request(Method::OPTIONS, uri, "")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(headers["Access-Control-Allow-Origin"], "*");
            assert_eq!(headers["Access-Control-Allow-Methods"], "GET, POST, OPTIONS");
            assert_eq!(headers["Access-Control-Allow-Headers"], "Content-Type");
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unsupported_requests() {
        let fx = fixture();
        let (status, _, _) = send(&fx, request(Method::POST, "/api/other", "{}")).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);

        let (status, _, body) = send(&fx, request(Method::DELETE, COMMENTS_PATH, "")).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert!(body.contains("DELETE"));
    }

    #[tokio::test]
    async fn test_oversized_body() {
        let fx = fixture();
        let req = Request::builder()
            .method(Method::POST)
            .uri(COMMENTS_PATH)
            .header(CONTENT_LENGTH, "999999")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let (status, _, _) = send(&fx, req).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_server_header() {
        let fx = fixture();
        let (_, headers, _) = send(&fx, request(Method::GET, "/", "")).await;
        assert_eq!(headers["Server"], "blog-comments");
    }
}
