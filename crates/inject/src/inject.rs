//! Stylesheet injection: encode every font once, then rewrite each
//! stylesheet against the resulting map.

use crate::error::{Error, ErrorKind, Result};
use crate::map::{build_data_url_map, build_data_url_map_async};
use crate::scan::{list_files, list_files_async};
use crate::{DEFAULT_CSS_TYPES, MAX_REWRITE_CONCURRENCY};
use exn::ResultExt;
use f2b_css::{MatchMode, RewriteResult, Rewriter, StrictEquality, Validator};
use f2b_fonts::{DataUrlMap, FontType};
use futures::StreamExt;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// Settings shared by every injection entry point.
///
/// | option       | default                              |
/// |--------------|--------------------------------------|
/// | `validator`  | [`StrictEquality`]                   |
/// | `font_types` | every registry extension             |
/// | `css_types`  | `.css`, `.scss`, `.less`             |
/// | `resave`     | `true`                               |
/// | `match_mode` | [`MatchMode::Basename`]              |
/// | `root`       | none                                 |
#[derive(Clone)]
pub struct Options {
    pub validator: Arc<dyn Validator>,
    /// Font file extensions to scan for, with leading dot.
    pub font_types: Vec<String>,
    /// Stylesheet file extensions to scan for, with leading dot.
    pub css_types: Vec<String>,
    /// Write changed stylesheets back to disk.
    pub resave: bool,
    pub match_mode: MatchMode,
    /// Base directory for full-path matching of in-memory content. Files use
    /// their own parent directory instead.
    pub root: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            validator: Arc::new(StrictEquality),
            font_types: FontType::extensions(),
            css_types: DEFAULT_CSS_TYPES.iter().map(ToString::to_string).collect(),
            resave: true,
            match_mode: MatchMode::default(),
            root: None,
        }
    }
}

impl Debug for Options {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Options")
            .field("font_types", &self.font_types)
            .field("css_types", &self.css_types)
            .field("resave", &self.resave)
            .field("match_mode", &self.match_mode)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_font_types(mut self, font_types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.font_types = font_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_css_types(mut self, css_types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.css_types = css_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resave(mut self, resave: bool) -> Self {
        self.resave = resave;
        self
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    /// Shorthand for [`MatchMode::FullPath`] (`true`) or
    /// [`MatchMode::Basename`] (`false`).
    pub fn with_fullpath_match(self, fullpath_match: bool) -> Self {
        self.with_match_mode(match fullpath_match {
            true => MatchMode::FullPath,
            false => MatchMode::Basename,
        })
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn rewriter<'a>(&'a self, map: &'a DataUrlMap, root: Option<&'a Path>) -> Rewriter<'a> {
        Rewriter::new(map).with_validator(self.validator.as_ref()).with_match_mode(self.match_mode).with_root(root)
    }
}

/// A stylesheet that could not be processed.
#[derive(Debug)]
pub struct Failure {
    pub filepath: PathBuf,
    pub error: Error,
    /// The rewritten content, when only saving it failed.
    pub content: Option<String>,
}

impl Failure {
    fn new(filepath: impl Into<PathBuf>, error: Error) -> Self {
        Self { filepath: filepath.into(), error, content: None }
    }

    fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }
}

type FileResult = std::result::Result<RewriteResult, Failure>;

/// The outcome of [`inject_base64`].
#[derive(Debug)]
pub enum Injection {
    /// Changed stylesheets were written back; lists the ones that failed.
    Saved { failures: Vec<Failure> },
    /// Nothing was written. Entry `i` belongs to the `i`-th stylesheet found.
    Results(Vec<FileResult>),
}

impl Injection {
    pub fn failures(&self) -> Vec<&Failure> {
        match self {
            Self::Saved { failures } => failures.iter().collect(),
            Self::Results(results) => results.iter().filter_map(|result| result.as_ref().err()).collect(),
        }
    }
}

fn rewrite_file(map: &DataUrlMap, options: &Options, path: &Path, content: Result<String>) -> FileResult {
    let content = content.map_err(|error| Failure::new(path, error))?;
    options
        .rewriter(map, path.parent())
        .rewrite(&content)
        .map(|result| result.with_filepath(path))
        .map_err(|error| Failure::new(path, ErrorKind::stylesheet(error)))
}

fn inject_file(map: &DataUrlMap, options: &Options, path: &Path) -> FileResult {
    let content = std::fs::read_to_string(path).or_raise(|| ErrorKind::FileAccess(path.to_path_buf()));
    let result = rewrite_file(map, options, path, content)?;
    if options.resave && result.modified {
        if let Err(error) = std::fs::write(path, &result.content).or_raise(|| ErrorKind::Write(path.to_path_buf())) {
            return Err(Failure::new(path, error).with_content(result.content));
        }
        tracing::debug!(path = %path.display(), "Stylesheet saved");
    }
    Ok(result)
}

async fn inject_file_async(map: &DataUrlMap, options: &Options, path: PathBuf) -> FileResult {
    let content = tokio::fs::read_to_string(&path).await.or_raise(|| ErrorKind::FileAccess(path.clone()));
    let result = rewrite_file(map, options, &path, content)?;
    if options.resave && result.modified {
        if let Err(error) = tokio::fs::write(&path, &result.content).await.or_raise(|| ErrorKind::Write(path.clone())) {
            return Err(Failure::new(path, error).with_content(result.content));
        }
        tracing::debug!(path = %path.display(), "Stylesheet saved");
    }
    Ok(result)
}

fn finish(options: &Options, results: Vec<FileResult>) -> Injection {
    let mut modified = 0;
    for result in &results {
        match result {
            Ok(result) if result.modified => modified += 1,
            Ok(_) => {},
            Err(failure) => {
                tracing::warn!(path = %failure.filepath.display(), error = ?failure.error, "Stylesheet failed");
            },
        }
    }
    let failed = results.iter().filter(|result| result.is_err()).count();
    tracing::info!(stylesheets = results.len(), modified, failed, "Font injection complete");
    match options.resave {
        true => Injection::Saved { failures: results.into_iter().filter_map(std::result::Result::err).collect() },
        false => Injection::Results(results),
    }
}

/// Encodes every font under `fonts` and rewrites every stylesheet under
/// `stylesheets` to reference them as data URIs.
///
/// Each stylesheet is matched against fonts relative to its own directory.
/// With [`Options::resave`] set, changed stylesheets are written in place and
/// only failures are returned; otherwise nothing touches the disk and every
/// stylesheet's result is returned in discovery order. A failing stylesheet
/// never affects the others.
#[instrument(skip_all, fields(resave = options.resave))]
pub fn inject_base64(
    fonts: impl IntoIterator<Item = impl AsRef<Path>>,
    stylesheets: impl IntoIterator<Item = impl AsRef<Path>>,
    options: &Options,
) -> Injection {
    let map = build_data_url_map(fonts, &options.font_types);
    let results = list_files(stylesheets, &options.css_types)
        .iter()
        .map(|path| inject_file(&map, options, path))
        .collect();
    finish(options, results)
}

/// Async counterpart of [`inject_base64`]. Stylesheets are processed
/// concurrently; results keep discovery order.
#[instrument(skip_all, fields(resave = options.resave))]
pub async fn inject_base64_async(
    fonts: impl IntoIterator<Item = impl AsRef<Path>>,
    stylesheets: impl IntoIterator<Item = impl AsRef<Path>>,
    options: &Options,
) -> Injection {
    let map = build_data_url_map_async(fonts, &options.font_types).await;
    let stylesheets = list_files_async(stylesheets, &options.css_types).await;
    let results = futures::stream::iter(stylesheets)
        .map(|path| inject_file_async(&map, options, path))
        .buffered(MAX_REWRITE_CONCURRENCY)
        .collect()
        .await;
    finish(options, results)
}

fn rewrite_content(map: &DataUrlMap, options: &Options, content: &str) -> Result<RewriteResult> {
    options.rewriter(map, options.root.as_deref()).rewrite(content).map_err(ErrorKind::stylesheet)
}

/// Rewrites stylesheet text in memory. [`Options::root`] is the directory
/// URLs are resolved against in full-path mode. Never writes.
#[instrument(skip_all, fields(size = content.len()))]
pub fn inject_base64_from_content(
    fonts: impl IntoIterator<Item = impl AsRef<Path>>,
    content: &str,
    options: &Options,
) -> Result<RewriteResult> {
    let map = build_data_url_map(fonts, &options.font_types);
    rewrite_content(&map, options, content)
}

/// Async counterpart of [`inject_base64_from_content`].
#[instrument(skip_all, fields(size = content.len()))]
pub async fn inject_base64_from_content_async(
    fonts: impl IntoIterator<Item = impl AsRef<Path>>,
    content: &str,
    options: &Options,
) -> Result<RewriteResult> {
    let map = build_data_url_map_async(fonts, &options.font_types).await;
    rewrite_content(&map, options, content)
}

/// Like [`inject_base64_from_content`], for raw bytes. Invalid UTF-8 is
/// replaced with U+FFFD.
pub fn inject_base64_from_buffer(
    fonts: impl IntoIterator<Item = impl AsRef<Path>>,
    buffer: &[u8],
    options: &Options,
) -> Result<RewriteResult> {
    inject_base64_from_content(fonts, &String::from_utf8_lossy(buffer), options)
}

/// Async counterpart of [`inject_base64_from_buffer`].
pub async fn inject_base64_from_buffer_async(
    fonts: impl IntoIterator<Item = impl AsRef<Path>>,
    buffer: &[u8],
    options: &Options,
) -> Result<RewriteResult> {
    inject_base64_from_content_async(fonts, &String::from_utf8_lossy(buffer), options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use f2b_css::error::ErrorKind as StylesheetErrorKind;
    use std::fs;

    const WOFF_SRC: &str = "url(data:application/font-woff;charset=utf-8;base64,d09GRg==) format('woff')";

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("fonts")).unwrap();
        fs::write(dir.path().join("fonts/icons.woff"), b"wOFF").unwrap();
        dir
    }

    #[test]
    fn test_options_defaults() {
        let options = Options::default();
        assert!(options.resave);
        assert_eq!(options.match_mode, MatchMode::Basename);
        assert_eq!(options.root, None);
        assert_eq!(options.css_types, vec![".css", ".scss", ".less"]);
        assert_eq!(options.font_types, vec![".svg", ".ttf", ".otf", ".eot", ".sfnt", ".woff2", ".woff"]);
        assert!(options.validator.matches("a", "a", "", ""));
        assert!(!options.validator.matches("a", "b", "", ""));
    }

    #[test]
    fn test_options_builders() {
        let options = Options::new()
            .with_font_types([".woff"])
            .with_css_types(vec![".css".to_string()])
            .with_resave(false)
            .with_fullpath_match(true)
            .with_root("/site/css");
        assert_eq!(options.font_types, vec![".woff"]);
        assert!(!options.resave);
        assert_eq!(options.match_mode, MatchMode::FullPath);
        assert_eq!(options.root.as_deref(), Some(Path::new("/site/css")));
        assert!(format!("{options:?}").starts_with("Options { font_types: [\".woff\"]"));
    }

    #[test]
    fn test_from_content() {
        let dir = fixture();
        let css = "@font-face { font-family: Icons; src: url(../fonts/icons.woff); }";
        let result = inject_base64_from_content([dir.path().join("fonts")], css, &Options::default()).unwrap();
        assert!(result.modified);
        assert_eq!(result.filepath, None);
        assert_eq!(result.content, format!("@font-face {{ font-family: Icons; src: {WOFF_SRC}; }}"));
    }

    #[test]
    fn test_from_content_full_path_uses_root() {
        let dir = fixture();
        let css = "@font-face { src: url(../fonts/icons.woff); }";
        let fonts = [dir.path().join("fonts")];
        let options = Options::default().with_fullpath_match(true).with_root(dir.path().join("css"));
        assert!(inject_base64_from_content(&fonts, css, &options).unwrap().modified);
        let options = options.with_root(dir.path().join("css/deeper"));
        assert!(!inject_base64_from_content(&fonts, css, &options).unwrap().modified);
    }

    #[test]
    fn test_from_buffer_is_lossy() {
        let dir = fixture();
        let buffer = b"/* \xff */ @font-face { src: url(icons.woff); }";
        let result = inject_base64_from_buffer([dir.path()], buffer, &Options::default()).unwrap();
        assert!(result.modified);
        assert!(result.content.starts_with("/* \u{fffd} */"));
    }

    #[test]
    fn test_from_content_parse_error() {
        let dir = fixture();
        let err = inject_base64_from_content([dir.path()], "@font-face {", &Options::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Stylesheet(StylesheetErrorKind::Parse { .. })));
    }

    #[tokio::test]
    async fn test_async_content_matches_blocking() {
        let dir = fixture();
        let css = "@font-face { src: url(icons.woff) format('woff'), url(icons.ttf); }";
        let options = Options::default();
        let blocking = inject_base64_from_content([dir.path()], css, &options).unwrap();
        let nonblocking = inject_base64_from_content_async([dir.path()], css, &options).await.unwrap();
        assert_eq!(blocking, nonblocking);
        let buffered = inject_base64_from_buffer_async([dir.path()], css.as_bytes(), &options).await.unwrap();
        assert_eq!(blocking, buffered);
    }
}
