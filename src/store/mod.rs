//! Comment persistence
//!
//! All comments live in one document keyed by post id, each post holding its
//! comments in submission order. The handler only talks to [`CommentStore`];
//! [`JsonFileStore`] is the file-backed implementation used by the server.

mod json_file;

pub use json_file::JsonFileStore;

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::comments::Comment;

/// Post id → comments for that post, oldest first
pub type CommentMap = BTreeMap<String, Vec<Comment>>;

/// Storage failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create data directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize comments: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Storage backend for comments
///
/// Every call goes to the backing storage; implementations keep no cache
/// between calls.
pub trait CommentStore: Send + Sync {
    /// Load the whole document. An absent document is an empty map.
    fn load(&self) -> Result<CommentMap, StoreError>;

    /// Replace the whole document
    fn save(&self, comments: &CommentMap) -> Result<(), StoreError>;

    /// Add a comment to the end of its post's list
    fn append(&self, comment: Comment) -> Result<(), StoreError> {
        let mut comments = self.load()?;
        comments
            .entry(comment.post_id.clone())
            .or_default()
            .push(comment);
        self.save(&comments)
    }

    /// Comments for one post, empty if the post has none
    fn comments_for(&self, post_id: &str) -> Result<Vec<Comment>, StoreError> {
        let mut comments = self.load()?;
        Ok(comments.remove(post_id).unwrap_or_default())
    }
}
