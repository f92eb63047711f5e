// JSON file comment store
// Keeps every comment in one pretty-printed JSON document on disk

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{CommentMap, CommentStore, StoreError};
use crate::comments::Comment;

/// Comment store backed by a single JSON file
///
/// The file is re-read on every operation and rewritten in full on every
/// append. Writes go to a sibling `.tmp` file that is then renamed over the
/// document, so readers never observe a half-written file.
///
/// Appends are serialized inside this process only. Two processes sharing
/// one file can still lose each other's updates.
pub struct JsonFileStore {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store at `path`, creating its parent directory if needed
    ///
    /// The document itself is created lazily by the first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        Ok(Self {
            path,
            append_lock: Mutex::new(()),
        })
    }

    /// Path of the JSON document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("comments.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CommentStore for JsonFileStore {
    fn load(&self) -> Result<CommentMap, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CommentMap::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, comments: &CommentMap) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(comments).map_err(StoreError::Serialize)?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, content).map_err(|source| StoreError::Write {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(
            path = %self.path.display(),
            posts = comments.len(),
            "comment store saved"
        );
        Ok(())
    }

    fn append(&self, comment: Comment) -> Result<(), StoreError> {
        // Held across load and save: concurrent appends must not drop each other
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut comments = self.load()?;
        comments
            .entry(comment.post_id.clone())
            .or_default()
            .push(comment);
        self.save(&comments)
    }
}
