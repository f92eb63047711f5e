//! Static file serving module
//!
//! Serves the blog itself from `static_files.root`: files, index files for
//! directories, and a plain directory listing when no index exists.

use hyper::body::Bytes;
use hyper::header::IF_NONE_MATCH;
use hyper::{Method, Request, Response};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::StaticFilesConfig;
use crate::http::{self, cache, mime, ResponseBody};
use crate::logger;

/// Characters left unescaped in listing links
const HREF_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Request context encapsulating information needed for static serving
pub struct RequestContext {
    /// Raw (still percent-encoded) request path
    pub path: String,
    pub query: Option<String>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            path: req.uri().path().to_string(),
            query: req.uri().query().map(ToString::to_string),
            is_head: req.method() == Method::HEAD,
            if_none_match: req
                .headers()
                .get(IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string),
        }
    }
}

/// Serve a GET/HEAD request from the static root
pub async fn serve(ctx: &RequestContext, config: &StaticFilesConfig) -> Response<ResponseBody> {
    let Some(resolved) = resolve(&config.root, &ctx.path).await else {
        return http::build_404_response();
    };

    let Ok(metadata) = fs::metadata(&resolved).await else {
        return http::build_404_response();
    };

    if !metadata.is_dir() {
        return serve_file(ctx, &resolved).await;
    }

    // Relative links in an index page only work below a trailing slash
    if !ctx.path.ends_with('/') {
        let location = match &ctx.query {
            Some(q) => format!("{}/?{q}", ctx.path),
            None => format!("{}/", ctx.path),
        };
        return http::build_redirect_response(&location);
    }

    for index_file in &config.index_files {
        let index_path = resolved.join(index_file);
        if fs::metadata(&index_path).await.is_ok_and(|m| m.is_file()) {
            return serve_file(ctx, &index_path).await;
        }
    }

    if config.directory_listing {
        list_directory(ctx, &resolved).await
    } else {
        http::build_404_response()
    }
}

/// Map a request path onto the filesystem, refusing anything outside `root`
async fn resolve(root: &str, request_path: &str) -> Option<PathBuf> {
    let root = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static root not found or inaccessible '{root}': {e}"
            ));
            return None;
        }
    };

    let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }
    let candidate = root.join(decoded.trim_start_matches('/'));

    // File not found is common (404), no need to log at warning level
    let resolved = fs::canonicalize(&candidate).await.ok()?;
    if !resolved.starts_with(&root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {request_path} -> {}",
            resolved.display()
        ));
        return None;
    }

    Some(resolved)
}

async fn serve_file(ctx: &RequestContext, path: &Path) -> Response<ResponseBody> {
    let metadata = match fs::metadata(path).await {
        Ok(m) => m,
        Err(_) => return http::build_404_response(),
    };
    let modified = metadata.modified().ok();
    let etag = cache::generate_etag(metadata.len(), modified);

    if cache::etag_matches(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    let content = match fs::read(path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    let last_modified = modified.map(cache::http_date);

    http::build_file_response(
        Bytes::from(content),
        content_type,
        &etag,
        last_modified.as_deref(),
        ctx.is_head,
    )
}

async fn list_directory(ctx: &RequestContext, dir: &Path) -> Response<ResponseBody> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            logger::log_warning(&format!("Cannot list '{}': {e}", dir.display()));
            return http::build_404_response();
        }
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort_by_key(|name| name.to_lowercase());

    let display_path = percent_decode_str(&ctx.path).decode_utf8_lossy();
    let title = format!("Directory listing for {}", escape_html(&display_path));

    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for name in &names {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            utf8_percent_encode(name, HREF_SAFE),
            escape_html(name)
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");

    http::build_html_response(html, ctx.is_head)
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}
