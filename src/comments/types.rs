// Comment data types

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A stored comment
///
/// Field order matches the documents written by earlier versions of the
/// service, so existing `comments.json` files load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author: String,
    #[serde(default)]
    pub email: String,
    pub website: Option<String>,
    pub text: String,
    /// Local server time, no offset (e.g. `2024-03-01T14:22:05.123456`)
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
    pub post_id: String,
    /// Any JSON value the client sent, kept as-is
    pub parent_id: Option<Value>,
    pub approved: bool,
}

/// Six fractional digits, or none at all when the fraction is zero
fn serialize_timestamp<S: Serializer>(
    timestamp: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let format = if timestamp.nanosecond() == 0 {
        "%Y-%m-%dT%H:%M:%S"
    } else {
        "%Y-%m-%dT%H:%M:%S%.6f"
    };
    serializer.collect_str(&timestamp.format(format))
}

/// Comment as returned to clients, with its age rendered for display
#[derive(Debug, Serialize)]
pub struct CommentView<'a> {
    #[serde(flatten)]
    pub comment: &'a Comment,
    pub time_formatted: String,
}

impl<'a> CommentView<'a> {
    pub const fn new(comment: &'a Comment, time_formatted: String) -> Self {
        Self {
            comment,
            time_formatted,
        }
    }
}

/// Body of `POST /api/comments`
///
/// Every field is optional at the parse level; presence of the required
/// ones is checked by [`NewComment::into_comment`]. Unknown fields are ignored.
/// `parent_id` is not interpreted, so any JSON value is accepted there.
#[derive(Debug, Default, Deserialize)]
pub struct NewComment {
    pub author: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub text: Option<String>,
    pub post_id: Option<String>,
    pub parent_id: Option<Value>,
}
