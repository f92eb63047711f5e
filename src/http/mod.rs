//! HTTP protocol layer module
//!
//! Response builders and header helpers shared by the comment API and the
//! static file server.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_304_response, build_404_response, build_413_response, build_501_response,
    build_api_error_response, build_file_response, build_html_response, build_json_response,
    build_options_response, build_redirect_response, with_server_header, ResponseBody,
};
