//! Lexical path helpers used to build comparison keys.
//!
//! Nothing here touches the filesystem: `..` is resolved against the path
//! text, not against symlinks.

use std::path::{Component, Path, PathBuf};

/// Lexically normalizes `path`: drops `.` and empty segments and folds `..`
/// into its parent. `..` above the root is discarded; a leading `..` on a
/// relative path is kept.
///
/// ```
/// use std::path::Path;
/// use f2b_css::path::normalize;
/// assert_eq!(normalize("/srv/css/../fonts/./a.woff"), Path::new("/srv/fonts/a.woff"));
/// assert_eq!(normalize("/../a.woff"), Path::new("/a.woff"));
/// assert_eq!(normalize("../a//b/"), Path::new("../a/b"));
/// ```
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                },
                Some(Component::RootDir | Component::Prefix(_)) => {},
                Some(Component::ParentDir | Component::CurDir) | None => components.push(component),
            },
            other => components.push(other),
        }
    }
    components.into_iter().collect()
}

/// Resolves `path` against `base` the way a shell would: absolute paths
/// replace the base, relative ones are appended. The result is normalized.
pub fn resolve(base: impl AsRef<Path>, path: impl AsRef<Path>) -> PathBuf {
    normalize(base.as_ref().join(path))
}

/// The last `/`-separated segment of `path`, ignoring trailing slashes.
///
/// Works on URL paths as written in a stylesheet, so it splits on `/` only.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}
