//! `@font-face` `src` rewriting.
//!
//! A [`Rewriter`] walks every `@font-face` rule of a stylesheet (including
//! those nested in `@media` and friends), splits each `src` value into its
//! comma-separated terms and replaces every term whose `url(...)` refers to a
//! font in the [`DataUrlMap`] with that font's encoded source.

use crate::error::{ErrorKind, Result};
use crate::path::{basename, normalize, resolve};
use crate::stylesheet::{RuleKind, Stylesheet};
use crate::validator::{StrictEquality, Validator};
use cssparser::{Parser, ParserInput, Token};
use exn::ResultExt;
use f2b_fonts::DataUrlMap;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::instrument;

/// URL paths longer than this (in characters) are never substituted.
pub const MAX_PATH_LENGTH: usize = 200;

const TERM_SEPARATOR: &str = ",\n";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Payload of url('...'), url("...") or url(...), up to any ?query or #fragment.
regex!(URL_REGEX, r#"(?i)url\(\s*['"]?([^'"?#)]*)"#);

/// How a `src` URL is compared against the fonts in the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Compare the last path segment only. Fonts sharing a file name collapse
    /// onto the first one in the map.
    #[default]
    Basename,
    /// Compare lexically resolved absolute paths: URLs against the stylesheet
    /// root, fonts against the working directory. Falls back to
    /// [`Basename`](Self::Basename) when no root is set.
    FullPath,
}

/// The outcome of rewriting one stylesheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteResult {
    /// `true` iff at least one `src` term was substituted.
    pub modified: bool,
    /// The rewritten stylesheet, or the untouched input when nothing matched.
    pub content: String,
    /// Where the stylesheet came from, when it came from a file.
    pub filepath: Option<PathBuf>,
}

impl RewriteResult {
    pub fn with_filepath(mut self, filepath: impl Into<PathBuf>) -> Self {
        self.filepath = Some(filepath.into());
        self
    }
}

/// A font from the map, with its comparison key precomputed.
struct Candidate<'m> {
    path: &'m Path,
    key: String,
    compare: String,
    src: Option<&'m str>,
}

/// Rewrites `@font-face` `src` declarations against a [`DataUrlMap`].
///
/// # Example
///
/// ```
/// use f2b_css::Rewriter;
/// use f2b_fonts::DataUrlMap;
///
/// # fn main() -> f2b_css::error::Result<()> {
/// let map: DataUrlMap = [("fonts/a.woff", Some("url(data:,) format('woff')".to_string()))].into_iter().collect();
/// let result = Rewriter::new(&map).rewrite("@font-face { src: url('../a.woff?v=2'); }")?;
/// assert!(result.modified);
/// assert_eq!(result.content, "@font-face { src: url(data:,) format('woff'); }");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Copy)]
pub struct Rewriter<'a> {
    map: &'a DataUrlMap,
    validator: &'a dyn Validator,
    mode: MatchMode,
    root: Option<&'a Path>,
}

impl<'a> Rewriter<'a> {
    /// A rewriter in basename mode with the [`StrictEquality`] validator.
    pub fn new(map: &'a DataUrlMap) -> Self {
        Self { map, validator: &StrictEquality, mode: MatchMode::default(), root: None }
    }

    pub fn with_validator(mut self, validator: &'a dyn Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Directory that relative URLs in the stylesheet are resolved against in
    /// [`MatchMode::FullPath`]; usually the stylesheet's parent directory.
    pub fn with_root(mut self, root: Option<&'a Path>) -> Self {
        self.root = root;
        self
    }

    /// Rewrites `css`, returning the untouched input when nothing matched.
    ///
    /// # Errors
    /// - [`Parse`](ErrorKind::Parse) if `css` is structurally malformed.
    /// - [`WorkingDirectory`](ErrorKind::WorkingDirectory) in full-path mode
    ///   when the process working directory is unavailable.
    #[instrument(level = "debug", skip_all, fields(size = css.len(), substitutions))]
    pub fn rewrite(&self, css: &str) -> Result<RewriteResult> {
        let mut sheet = Stylesheet::parse(css)?;
        let (base, candidates) = self.candidates()?;

        let mut substitutions = 0usize;
        sheet.for_each_rule_mut(|rule| {
            if rule.kind != RuleKind::FontFace {
                return;
            }
            for declaration in rule.declarations_mut() {
                if !declaration.property().eq_ignore_ascii_case("src") {
                    continue;
                }
                if let Some((value, count)) = self.rewrite_src(declaration.value(), base.as_deref(), &candidates) {
                    declaration.set_value(value);
                    substitutions += count;
                }
            }
        });
        tracing::Span::current().record("substitutions", substitutions);

        let modified = substitutions > 0;
        let content = if modified { sheet.to_css() } else { css.to_string() };
        Ok(RewriteResult { modified, content, filepath: None })
    }

    /// The resolved stylesheet root (full-path mode only) and every map entry
    /// paired with its comparison key, in map order.
    fn candidates(&self) -> Result<(Option<PathBuf>, Vec<Candidate<'a>>)> {
        let root = self.root.filter(|root| !root.as_os_str().is_empty());
        let (base, cwd) = match (self.mode, root) {
            (MatchMode::FullPath, Some(root)) => {
                let cwd = std::env::current_dir().or_raise(|| ErrorKind::WorkingDirectory)?;
                (Some(resolve(&cwd, root)), Some(cwd))
            },
            _ => (None, None),
        };
        let candidates = self
            .map
            .iter()
            .map(|(path, src)| {
                let key = path.to_string_lossy().into_owned();
                let compare = match &cwd {
                    Some(cwd) => resolve(cwd, path).to_string_lossy().into_owned(),
                    None => basename(&key).to_string(),
                };
                Candidate { path, key, compare, src }
            })
            .collect();
        Ok((base, candidates))
    }

    /// Returns the new value and the number of substituted terms, or `None`
    /// if no term changed.
    fn rewrite_src(&self, value: &str, base: Option<&Path>, candidates: &[Candidate<'a>]) -> Option<(String, usize)> {
        let mut count = 0;
        let terms: Vec<&str> = split_terms(value)
            .into_iter()
            .map(|term| match self.lookup(term, base, candidates) {
                Some(src) => {
                    count += 1;
                    src
                },
                None => term,
            })
            .collect();
        (count > 0).then(|| (terms.join(TERM_SEPARATOR), count))
    }

    /// The encoded source for the first font matching `term`, if any.
    fn lookup(&self, term: &str, base: Option<&Path>, candidates: &[Candidate<'a>]) -> Option<&'a str> {
        let url = extract_url(term);
        if url.starts_with("data:") {
            return None;
        }
        if url.chars().count() > MAX_PATH_LENGTH {
            tracing::debug!(length = url.chars().count(), "Skipping overlong src path");
            return None;
        }
        let target = match base {
            Some(base) => normalize(base.join(url)).to_string_lossy().into_owned(),
            None => basename(url).to_string(),
        };
        let candidate = candidates
            .iter()
            .find(|candidate| self.validator.matches(&target, &candidate.compare, url, &candidate.key))?;
        if candidate.src.is_none() {
            tracing::warn!(font = %candidate.path.display(), url, "Matched font has no known type; leaving src as is");
        }
        candidate.src
    }
}

/// The path inside a term's `url(...)`, without query or fragment. Terms
/// without `url(` are returned trimmed.
fn extract_url(term: &str) -> &str {
    match URL_REGEX.captures(term).and_then(|captures| captures.get(1)) {
        Some(path) => path.as_str().trim(),
        None => term.trim(),
    }
}

/// Splits a declaration value on commas outside parentheses and strings.
/// Terms are trimmed.
fn split_terms(value: &str) -> Vec<&str> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut terms = Vec::new();
    let mut start = 0;
    loop {
        let position = parser.position().byte_index();
        // Blocks left unentered are skipped whole by the next call.
        match parser.next_including_whitespace_and_comments() {
            Ok(Token::Comma) => {
                terms.push(value[start..position].trim());
                start = position + 1;
            },
            Ok(_) => {},
            Err(_) => break,
        }
    }
    terms.push(value[start..].trim());
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WOFF2_SRC: &str = "url(data:application/font-woff2;charset=utf-8;base64,d09GMg==) format('woff2')";
    const EOT_SRC: &str = "url(data:application/vnd.ms-fontobject;charset=utf-8;base64,TFA=) format('embedded-opentype')";

    fn map() -> DataUrlMap {
        [
            ("fonts/akronim.woff2", Some(WOFF2_SRC.to_string())),
            ("fonts/akronim.eot", Some(EOT_SRC.to_string())),
            ("fonts/mystery.ttf", None),
        ]
        .into_iter()
        .collect()
    }

    const STYLESHEET: &str = "body { font-family: 'Akronim'; }\n\
        @font-face {\n  font-family: 'Akronim';\n  src: url('../fonts/akronim.eot?#iefix') format('embedded-opentype'),\n       url(\"../fonts/akronim.woff2\") format('woff2'),\n       url(missing.woff) format('woff');\n}\n";

    #[test]
    fn test_substitutes_matching_terms() {
        let map = map();
        let result = Rewriter::new(&map).rewrite(STYLESHEET).unwrap();
        assert!(result.modified);
        assert_eq!(result.filepath, None);
        let expected = format!(
            "body {{ font-family: 'Akronim'; }}\n@font-face {{\n  font-family: 'Akronim';\n  src: {EOT_SRC},\n{WOFF2_SRC},\nurl(missing.woff) format('woff');\n}}\n"
        );
        assert_eq!(result.content, expected);
    }

    #[test]
    fn test_no_font_face_is_byte_identical() {
        let map = map();
        let css = "/* fonts */\nbody{src:url(akronim.woff2)}\n@media print { p { color: black } }";
        let result = Rewriter::new(&map).rewrite(css).unwrap();
        assert!(!result.modified);
        assert_eq!(result.content, css);
    }

    #[test]
    fn test_unmatched_font_face_is_byte_identical() {
        let map = map();
        let css = "@font-face {\n\tsrc :  url(other.woff)  ;\n}";
        let result = Rewriter::new(&map).rewrite(css).unwrap();
        assert!(!result.modified);
        assert_eq!(result.content, css);
    }

    #[test]
    fn test_idempotent() {
        let map = map();
        let rewriter = Rewriter::new(&map);
        let once = rewriter.rewrite(STYLESHEET).unwrap();
        let twice = rewriter.rewrite(&once.content).unwrap();
        assert!(!twice.modified);
        assert_eq!(twice.content, once.content);
    }

    #[test]
    fn test_overlong_paths_are_skipped() {
        let long = format!("{}/akronim.woff2", "d".repeat(MAX_PATH_LENGTH));
        let map = map();
        let result = Rewriter::new(&map).rewrite(&format!("@font-face {{ src: url({long}); }}")).unwrap();
        assert!(!result.modified);

        let fits = format!("{}/akronim.woff2", "d".repeat(MAX_PATH_LENGTH - "/akronim.woff2".len()));
        assert_eq!(fits.chars().count(), MAX_PATH_LENGTH);
        let result = Rewriter::new(&map).rewrite(&format!("@font-face {{ src: url({fits}); }}")).unwrap();
        assert!(result.modified);
    }

    #[test]
    fn test_unresolved_type_stops_search() {
        let map: DataUrlMap =
            [("a/mystery.ttf", None), ("b/mystery.ttf", Some("url(x) format('truetype')".to_string()))]
                .into_iter()
                .collect();
        let css = "@font-face { src: url(mystery.ttf); }";
        let result = Rewriter::new(&map).rewrite(css).unwrap();
        assert!(!result.modified);
        assert_eq!(result.content, css);
    }

    #[test]
    fn test_basename_mode_collapses_same_names() {
        let map: DataUrlMap = [
            ("/site/fonts/a/icon.woff", Some("FIRST".to_string())),
            ("/site/fonts/b/icon.woff", Some("SECOND".to_string())),
        ]
        .into_iter()
        .collect();
        let css = "@font-face { src: url(../fonts/b/icon.woff); }";
        let result = Rewriter::new(&map).with_root(Some(Path::new("/site/css"))).rewrite(css).unwrap();
        assert_eq!(result.content, "@font-face { src: FIRST; }");
    }

    #[test]
    fn test_full_path_mode_distinguishes_same_names() {
        let map: DataUrlMap = [
            ("/site/fonts/a/icon.woff", Some("FIRST".to_string())),
            ("/site/fonts/b/icon.woff", Some("SECOND".to_string())),
        ]
        .into_iter()
        .collect();
        let css = "@font-face { src: url(../fonts/b/icon.woff); }";
        let rewriter = Rewriter::new(&map).with_match_mode(MatchMode::FullPath);

        let result = rewriter.with_root(Some(Path::new("/site/css"))).rewrite(css).unwrap();
        assert_eq!(result.content, "@font-face { src: SECOND; }");

        // Elsewhere on disk, nothing resolves to either font.
        let result = rewriter.with_root(Some(Path::new("/elsewhere/css"))).rewrite(css).unwrap();
        assert!(!result.modified);

        // Without a root, full-path mode falls back to basenames.
        let result = rewriter.with_root(Some(Path::new(""))).rewrite(css).unwrap();
        assert_eq!(result.content, "@font-face { src: FIRST; }");
    }

    #[test]
    fn test_custom_validator_receives_all_forms() {
        let map = map();
        let seen = std::sync::Mutex::new(Vec::new());
        let validator = |target: &str, candidate: &str, url: &str, key: &str| {
            seen.lock().unwrap().push((target.to_string(), candidate.to_string(), url.to_string(), key.to_string()));
            false
        };
        let css = "@font-face { src: url('../x/akronim.woff2#v1'); }";
        let result = Rewriter::new(&map).with_validator(&validator).rewrite(css).unwrap();
        assert!(!result.modified);
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen[0],
            (
                "akronim.woff2".to_string(),
                "akronim.woff2".to_string(),
                "../x/akronim.woff2".to_string(),
                "fonts/akronim.woff2".to_string()
            )
        );
    }

    #[test]
    fn test_nested_and_case_insensitive() {
        let map = map();
        let css = "@media screen { @FONT-FACE { SRC: url(akronim.woff2); } }";
        let result = Rewriter::new(&map).rewrite(css).unwrap();
        assert!(result.modified);
        assert_eq!(result.content, format!("@media screen {{ @FONT-FACE {{ SRC: {WOFF2_SRC}; }} }}"));
    }

    #[test]
    fn test_parse_error_propagates() {
        let map = map();
        let err = Rewriter::new(&map).rewrite("@font-face { src: url(a.woff);").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse { .. }));
    }

    #[rstest]
    #[case("url('a.woff')", "a.woff")]
    #[case("url(\"a.woff?v=1\") format('woff')", "a.woff")]
    #[case("url( ../a.eot?#iefix )", "../a.eot")]
    #[case("URL(a.woff#frag)", "a.woff")]
    #[case("  local('Akronim')  ", "local('Akronim')")]
    fn test_extract_url(#[case] term: &str, #[case] expected: &str) {
        assert_eq!(extract_url(term), expected);
    }

    #[test]
    fn test_split_terms() {
        assert_eq!(
            split_terms("url(a,b.woff) format('woff'), local(\"x, y\") ,url(c)"),
            vec!["url(a,b.woff) format('woff')", "local(\"x, y\")", "url(c)"]
        );
        assert_eq!(split_terms(""), vec![""]);
        assert_eq!(split_terms("url('a,b.woff'), /* x, y */ url(c)"), vec!["url('a,b.woff')", "/* x, y */ url(c)"]);
    }

    #[test]
    fn test_escaped_selectors_do_not_block_rewriting() {
        let map: DataUrlMap = [("fonts/a.woff", Some("DATA".to_string()))].into_iter().collect();
        let css = ".content-\\[\\'\\'\\] { --tw-content: ''; }\n@font-face { src: url(a.woff); }";
        let result = Rewriter::new(&map).rewrite(css).unwrap();
        assert!(result.modified);
        assert_eq!(result.content, ".content-\\[\\'\\'\\] { --tw-content: ''; }\n@font-face { src: DATA; }");

        let css = ".a\\{b { color: red }\n@font-face{src:url(a.woff);}";
        let result = Rewriter::new(&map).rewrite(css).unwrap();
        assert_eq!(result.content, ".a\\{b { color: red }\n@font-face{src:DATA;}");
    }
}
