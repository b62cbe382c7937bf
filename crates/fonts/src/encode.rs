//! Blocking encode operations.

use crate::FontType;
use crate::error::{ErrorKind, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// A font file's content, base64-encoded, together with its resolved type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoded {
    pub path: PathBuf,
    pub font_type: Option<FontType>,
    pub base64: String,
}

impl Encoded {
    /// Returns `data:<media type>;charset=utf-8;base64,<payload>`.
    ///
    /// A `data:` URL cannot be formed without a media type, so an unresolved
    /// type is an [`UnsupportedFontType`](ErrorKind::UnsupportedFontType) error.
    pub fn data_url(&self) -> Result<String> {
        let font = self
            .font_type
            .ok_or_raise(|| ErrorKind::UnsupportedFontType(self.path.display().to_string()))?;
        Ok(data_url(font, &self.base64))
    }

    /// Returns the CSS source `url(<data url>) format('<format>')`, or `None`
    /// if the font type could not be resolved.
    pub fn data_src(&self) -> Option<String> {
        self.font_type.map(|font| format!("url({}) format('{}')", data_url(font, &self.base64), font.format()))
    }
}

fn data_url(font: FontType, base64: &str) -> String {
    format!("data:{};charset=utf-8;base64,{}", font.media_type(), base64)
}

/// Encode raw font bytes, resolving the type from `path` and the content.
///
/// `hint` replaces content sniffing when provided. An `.svg` extension on
/// `path` always takes precedence over both.
#[must_use]
pub fn encode_bytes(path: impl AsRef<Path>, bytes: &[u8], hint: Option<FontType>) -> Encoded {
    let path = path.as_ref();
    let font_type = match hint {
        Some(_) => FontType::resolve_with_hint(path, hint),
        None => FontType::resolve(path, bytes),
    };
    Encoded { path: path.to_path_buf(), font_type, base64: STANDARD.encode(bytes) }
}

#[instrument(level = "debug", fields(size))]
pub(crate) fn encode_file(path: &Path) -> Result<Encoded> {
    let bytes = std::fs::read(path).or_raise(|| ErrorKind::FileAccess(path.to_path_buf()))?;
    tracing::Span::current().record("size", bytes.len());
    Ok(encode_bytes(path, &bytes, None))
}

/// Read a font file and encode it as a `data:` URL.
///
/// # Errors
/// - [`FileAccess`](ErrorKind::FileAccess) if the file cannot be read.
/// - [`UnsupportedFontType`](ErrorKind::UnsupportedFontType) if the type
///   cannot be resolved.
pub fn encode_to_data_url(path: impl AsRef<Path>) -> Result<String> {
    encode_file(path.as_ref())?.data_url()
}

/// Read a font file and encode it as a CSS `url(...) format(...)` source.
///
/// Returns `Ok(None)` when the font type cannot be resolved.
///
/// # Examples
///
/// ```no_run
/// use f2b_fonts::encode_to_data_src;
///
/// # fn example() -> f2b_fonts::error::Result<()> {
/// if let Some(src) = encode_to_data_src("fonts/akronim.woff2")? {
///     assert!(src.starts_with("url(data:application/font-woff2;charset=utf-8;base64,"));
/// }
/// # Ok(())
/// # }
/// ```
pub fn encode_to_data_src(path: impl AsRef<Path>) -> Result<Option<String>> {
    Ok(encode_file(path.as_ref())?.data_src())
}

/// Batch form of [`encode_to_data_url`]: one result per path, same order.
pub fn encode_many_to_data_url<I, P>(paths: I) -> Vec<Result<String>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths.into_iter().map(encode_to_data_url).collect()
}

/// Batch form of [`encode_to_data_src`]: one result per path, same order.
pub fn encode_many_to_data_src<I, P>(paths: I) -> Vec<Result<Option<String>>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths.into_iter().map(encode_to_data_src).collect()
}
