//! Comment API
//!
//! `GET /api/comments?post=<id>` lists a post's comments and
//! `POST /api/comments` submits a new one. Both answer with JSON and open
//! CORS; both hit the store on every call.

use chrono::{Local, NaiveDateTime, SubsecRound};
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::fmt::Display;
use std::sync::Arc;
use tokio::task::{self, JoinError};

use crate::comments::{format_time_ago, Comment, CommentView, MissingFields, NewComment, JUST_NOW};
use crate::config::AppState;
use crate::http::{self, ResponseBody};
use crate::logger;
use crate::store::StoreError;

/// Why a comment request failed
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),
    #[error(transparent)]
    MissingFields(#[from] MissingFields),
    #[error("failed to read request body: {0}")]
    Body(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("storage task failed: {0}")]
    Task(#[from] JoinError),
}

impl CommentError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) | Self::MissingFields(_) => StatusCode::BAD_REQUEST,
            Self::Body(_) | Self::Store(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text error response
    ///
    /// Server-side failures carry their message only when `expose_details`
    /// is set; they are always logged.
    pub fn into_response(self, expose_details: bool) -> Response<ResponseBody> {
        let status = self.status();
        if status.is_server_error() {
            logger::log_error(&format!("Comment request failed: {self}"));
            if !expose_details {
                return http::build_api_error_response(status, "Internal Server Error");
            }
        }
        http::build_api_error_response(status, &self.to_string())
    }
}

/// Value of the `post` query parameter, if present and non-empty
///
/// Form-urlencoded: `+` is a space and `%XX` escapes are decoded. Empty
/// values are skipped, so `post=&post=hello` yields `hello`.
pub fn post_query_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, value)| key == "post" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// `GET /api/comments?post=<post_id>`
pub async fn list_comments(post_id: String, state: &AppState) -> Response<ResponseBody> {
    match load_post(post_id, state).await {
        Ok(comments) => {
            let views: Vec<CommentView<'_>> = comments
                .iter()
                .map(|comment| CommentView::new(comment, format_time_ago(comment.timestamp)))
                .collect();
            http::build_json_response(StatusCode::OK, &views)
        }
        Err(e) => e.into_response(state.config.http.expose_error_details),
    }
}

// The store does synchronous file I/O; keep it off the runtime's workers
async fn load_post(post_id: String, state: &AppState) -> Result<Vec<Comment>, CommentError> {
    let store = Arc::clone(&state.store);
    Ok(task::spawn_blocking(move || store.comments_for(&post_id)).await??)
}

/// `POST /api/comments`
pub async fn create_comment<B>(req: Request<B>, state: &AppState) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Display,
{
    match submit_comment(req, state).await {
        Ok(comment) => {
            logger::log_info(&format!(
                "New comment {} on '{}' by '{}'",
                comment.id, comment.post_id, comment.author
            ));
            let view = CommentView::new(&comment, JUST_NOW.to_string());
            http::build_json_response(StatusCode::CREATED, &view)
        }
        Err(e) => e.into_response(state.config.http.expose_error_details),
    }
}

async fn submit_comment<B>(req: Request<B>, state: &AppState) -> Result<Comment, CommentError>
where
    B: Body,
    B::Error: Display,
{
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| CommentError::Body(e.to_string()))?
        .to_bytes();

    let comment = parse_new_comment(&body)?.into_comment(now())?;

    let store = Arc::clone(&state.store);
    let stored = comment.clone();
    task::spawn_blocking(move || store.append(stored)).await??;
    Ok(comment)
}

/// Decode a submission body
///
/// Anything that is not a JSON object with string (or null) fields is
/// rejected as invalid JSON, including bodies that are not UTF-8.
/// `parent_id` is the exception: any JSON value is taken as-is.
pub fn parse_new_comment(body: &[u8]) -> Result<NewComment, CommentError> {
    serde_json::from_slice(body).map_err(CommentError::InvalidJson)
}

/// Creation timestamp: local server time at microsecond precision
fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}
