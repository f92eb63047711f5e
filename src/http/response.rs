//! HTTP response building module
//!
//! Builders never panic: a builder error is logged and replaced by an empty
//! response with the default status.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, SERVER};
use hyper::http::response::Builder;
use hyper::{Method, Response, StatusCode};
use serde::Serialize;

pub type ResponseBody = Full<Bytes>;

const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

/// JSON response for the comment API, with CORS open to any origin
pub fn build_json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
) -> Response<ResponseBody> {
    match serde_json::to_vec(body) {
        Ok(json) => finish(
            Response::builder()
                .status(status)
                .header("Content-Type", "application/json")
                .header(ALLOW_ORIGIN, "*"),
            Bytes::from(json),
            "JSON",
        ),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            build_api_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

/// Plain-text error for the comment API, with CORS open to any origin
pub fn build_api_error_response(status: StatusCode, message: &str) -> Response<ResponseBody> {
    finish(
        Response::builder()
            .status(status)
            .header("Content-Type", "text/plain; charset=utf-8")
            .header(ALLOW_ORIGIN, "*"),
        Bytes::from(message.to_owned()),
        status.as_str(),
    )
}

/// CORS preflight answer, valid for any path
pub fn build_options_response() -> Response<ResponseBody> {
    finish(
        Response::builder()
            .status(StatusCode::OK)
            .header(ALLOW_ORIGIN, "*")
            .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type"),
        Bytes::new(),
        "OPTIONS",
    )
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<ResponseBody> {
    finish(
        Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header("ETag", etag),
        Bytes::new(),
        "304",
    )
}

/// Build 301 redirect response
pub fn build_redirect_response(location: &str) -> Response<ResponseBody> {
    finish(
        Response::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header("Location", location),
        Bytes::new(),
        "301",
    )
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    plain_text(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<ResponseBody> {
    plain_text(StatusCode::PAYLOAD_TOO_LARGE, "413 Payload Too Large")
}

/// Build 501 Not Implemented response for methods nothing here handles
pub fn build_501_response(method: &Method) -> Response<ResponseBody> {
    plain_text(
        StatusCode::NOT_IMPLEMENTED,
        &format!("501 Unsupported method ('{method}')"),
    )
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    finish(
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "text/html; charset=utf-8")
            .header("Content-Length", content_length),
        body,
        "HTML",
    )
}

/// Build a 200 static file response with cache validators
///
/// `Content-Length` always reflects the file size, also for HEAD.
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    last_modified: Option<&str>,
    is_head: bool,
) -> Response<ResponseBody> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("ETag", etag);
    if let Some(last_modified) = last_modified {
        builder = builder.header("Last-Modified", last_modified);
    }

    finish(builder, body, "200")
}

/// Stamp the `Server` header on an outgoing response
pub fn with_server_header(
    mut response: Response<ResponseBody>,
    server_name: &str,
) -> Response<ResponseBody> {
    if let Ok(value) = HeaderValue::from_str(server_name) {
        response.headers_mut().insert(SERVER, value);
    }
    response
}

fn plain_text(status: StatusCode, message: &str) -> Response<ResponseBody> {
    finish(
        Response::builder()
            .status(status)
            .header("Content-Type", "text/plain; charset=utf-8"),
        Bytes::from(message.to_owned()),
        status.as_str(),
    )
}

fn finish(builder: Builder, body: Bytes, label: &str) -> Response<ResponseBody> {
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to build {label} response: {e}"));
        Response::new(Full::new(Bytes::new()))
    })
}
