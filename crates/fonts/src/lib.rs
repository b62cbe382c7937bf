//! Font type detection and base64 data URI encoding.
//!
//! This crate wraps the handful of web font formats behind a closed
//! [`FontType`] enum, providing:
//!
//! - **Type detection** from file extensions ([`FontType::from_path`]) or
//!   magic bytes ([`FontType::from_magic_bytes`])
//! - **Encoding** of font files into `data:` URLs and CSS `url(...) format(...)`
//!   sources ([`encode_to_data_url`], [`encode_to_data_src`])
//! - An ordered [`DataUrlMap`] from font path to encoded source, consumed by
//!   stylesheet rewriting
//!
//! Every file operation has a blocking form. Async counterparts require the
//! `async` feature and read files through [`tokio::fs`](::tokio::fs); both
//! share the same encoding code so their output is byte-identical.

mod construct;
mod encode;
pub mod error;
mod map;
#[cfg(feature = "async")]
mod nonblocking;
mod util;

pub use crate::encode::{
    Encoded, encode_bytes, encode_many_to_data_src, encode_many_to_data_url, encode_to_data_src, encode_to_data_url,
};
pub use crate::map::DataUrlMap;
#[cfg(feature = "async")]
pub use crate::nonblocking::{
    encode_many_to_data_src_async, encode_many_to_data_url_async, encode_to_data_src_async, encode_to_data_url_async,
};

/// A supported web font format.
///
/// The declaration order is the registry order: [`FontType::ALL`] and
/// [`FontType::extensions`] list formats in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontType {
    /// SVG font (.svg); never detected from content.
    Svg,
    /// TrueType (.ttf)
    Ttf,
    /// OpenType with CFF outlines (.otf)
    Otf,
    /// Embedded OpenType (.eot)
    Eot,
    /// Bare sfnt container (.sfnt); never detected from content.
    Sfnt,
    /// Web Open Font Format 2 (.woff2)
    Woff2,
    /// Web Open Font Format (.woff)
    Woff,
}
