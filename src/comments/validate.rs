// Submission validation and normalization

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::types::{Comment, NewComment};

pub const COMMENT_ID_LEN: usize = 8;
pub const AUTHOR_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 100;
pub const WEBSITE_MAX_CHARS: usize = 200;
pub const TEXT_MAX_CHARS: usize = 5000;
pub const POST_ID_MAX_CHARS: usize = 100;

/// `author`, `text` or `post_id` was absent or empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Missing required fields")]
pub struct MissingFields;

impl NewComment {
    /// Build the comment to persist
    ///
    /// Required fields are checked before trimming, so a whitespace-only
    /// author is accepted and stored as an empty string.
    pub fn into_comment(self, timestamp: NaiveDateTime) -> Result<Comment, MissingFields> {
        let (Some(author), Some(text), Some(post_id)) = (
            non_empty(self.author),
            non_empty(self.text),
            non_empty(self.post_id),
        ) else {
            return Err(MissingFields);
        };

        Ok(Comment {
            id: generate_id(),
            author: clean(&author, AUTHOR_MAX_CHARS),
            email: self
                .email
                .map(|email| clean(&email, EMAIL_MAX_CHARS))
                .unwrap_or_default(),
            website: non_empty(self.website).map(|website| clean(&website, WEBSITE_MAX_CHARS)),
            text: clean(&text, TEXT_MAX_CHARS),
            timestamp,
            post_id: clean(&post_id, POST_ID_MAX_CHARS),
            parent_id: self.parent_id,
            approved: true,
        })
    }
}

/// Short comment id: the first 8 hex digits of a random v4 UUID
///
/// Not collision-free; ids are only expected to be unique within one post.
pub fn generate_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(COMMENT_ID_LEN);
    id
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Trim surrounding whitespace and cap the length in characters
fn clean(value: &str, max_chars: usize) -> String {
    value.trim().chars().take(max_chars).collect()
}
