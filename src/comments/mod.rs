//! Comment domain
//!
//! The persisted `Comment` record, the typed submission payload and the
//! relative-time formatter shown next to each comment.

mod time_ago;
mod types;
mod validate;

pub use time_ago::{format_time_ago, JUST_NOW};
pub use types::{Comment, CommentView, NewComment};
pub use validate::MissingFields;
