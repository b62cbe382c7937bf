//! Inline local fonts into stylesheets as base64 data URIs.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! 1. **Scan** ([`list_files`]): walk files and directories for the wanted
//!    extensions.
//! 2. **Encode** ([`build_data_url_map`]): turn every font found into a CSS
//!    `url(data:...) format(...)` source, keyed by path.
//! 3. **Rewrite** ([`inject_base64`]): replace matching `src` entries of every
//!    `@font-face` rule and optionally save the stylesheets.
//!
//! Every stage has a blocking and an async form with identical results.

pub mod error;
mod inject;
mod map;
mod scan;

pub use crate::inject::{
    Failure, Injection, Options, inject_base64, inject_base64_async, inject_base64_from_buffer,
    inject_base64_from_buffer_async, inject_base64_from_content, inject_base64_from_content_async,
};
pub use crate::map::{MAX_ENCODE_CONCURRENCY, build_data_url_map, build_data_url_map_async};
pub use crate::scan::{list_files, list_files_async, list_files_stream};
pub use f2b_css::{MatchMode, RewriteResult, StrictEquality, Validator};
pub use f2b_fonts::DataUrlMap;

/// Stylesheet extensions scanned by default.
pub const DEFAULT_CSS_TYPES: [&str; 3] = [".css", ".scss", ".less"];

/// Maximum number of stylesheets rewritten at once by [`inject_base64_async`].
pub const MAX_REWRITE_CONCURRENCY: usize = 16;
