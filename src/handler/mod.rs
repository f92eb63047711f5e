//! Request handler module
//!
//! Routes requests to the comment API or to static file serving.

pub mod comments;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
