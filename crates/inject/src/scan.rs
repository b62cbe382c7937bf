//! Recursive file discovery.
//!
//! Inputs may be files or directories. Directories are walked depth-first
//! with their entries visited in sorted order, so the blocking and async
//! listings come out identical. Symlinked files are followed; symlinked
//! directories are only descended into when named as an input.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use futures::{Stream, StreamExt};
use std::ffi::OsStr;
use std::fs::Metadata;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// `true` if the extension of `path` is one of `allowed` (case-sensitive,
/// leading dot: `".woff2"`).
fn is_allowed<S: AsRef<str>>(path: &Path, allowed: &[S]) -> bool {
    let Some(extension) = path.extension() else {
        return false;
    };
    allowed
        .iter()
        .filter_map(|allowed| allowed.as_ref().strip_prefix('.'))
        .any(|allowed| extension == OsStr::new(allowed))
}

#[derive(Debug, PartialEq, Eq)]
enum Visit {
    Descend,
    File,
    Skip,
}

impl Visit {
    /// `target` is the metadata of what `path` points to. A symlinked
    /// directory found while walking is skipped, so link cycles never loop.
    fn of(path: &Path, link: bool, target: &Metadata, input: bool) -> Self {
        if target.is_dir() {
            if link && !input {
                tracing::debug!(path = %path.display(), "Skipping symlinked directory");
                return Visit::Skip;
            }
            return Visit::Descend;
        }
        match target.is_file() {
            true => Visit::File,
            false => Visit::Skip,
        }
    }
}

fn visit(path: &Path, input: bool) -> std::io::Result<Visit> {
    let metadata = std::fs::symlink_metadata(path)?;
    let link = metadata.file_type().is_symlink();
    let target = match link {
        true => std::fs::metadata(path)?,
        false => metadata,
    };
    Ok(Visit::of(path, link, &target, input))
}

async fn visit_async(path: &Path, input: bool) -> std::io::Result<Visit> {
    let metadata = fs::symlink_metadata(path).await?;
    let link = metadata.file_type().is_symlink();
    let target = match link {
        true => fs::metadata(path).await?,
        false => metadata,
    };
    Ok(Visit::of(path, link, &target, input))
}

/// Inputs in reverse, ready to be popped off a stack in the given order.
/// The flag marks paths named by the caller rather than found by the walk.
fn initial_stack(paths: impl IntoIterator<Item = impl AsRef<Path>>) -> Vec<(PathBuf, bool)> {
    let mut stack: Vec<_> = paths.into_iter().map(|path| (path.as_ref().to_path_buf(), true)).collect();
    stack.reverse();
    stack
}

fn read_dir_sorted(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut children = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    children.sort();
    Ok(children)
}

async fn read_dir_sorted_async(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut children = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        children.push(entry.path());
    }
    children.sort();
    Ok(children)
}

/// Lists every file under `paths` whose extension is in `allowed`.
///
/// Paths that do not exist are skipped silently; anything else that cannot
/// be read is logged and skipped. An empty `allowed` list matches nothing.
///
/// ```no_run
/// let stylesheets = f2b_inject::list_files(["public/css", "theme.scss"], &[".css", ".scss"]);
/// ```
pub fn list_files<S: AsRef<str>>(paths: impl IntoIterator<Item = impl AsRef<Path>>, allowed: &[S]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if allowed.is_empty() {
        return files;
    }
    let mut stack = initial_stack(paths);
    while let Some((current, input)) = stack.pop() {
        match visit(&current, input) {
            Ok(Visit::Descend) => match read_dir_sorted(&current) {
                Ok(children) => stack.extend(children.into_iter().rev().map(|child| (child, false))),
                Err(err) if err.kind() == IoErrorKind::NotFound => {},
                Err(err) => tracing::warn!(path = %current.display(), error = %err, "Skipping unreadable directory"),
            },
            Ok(Visit::File) if is_allowed(&current, allowed) => files.push(current),
            Ok(_) => {},
            Err(err) if err.kind() == IoErrorKind::NotFound => {},
            Err(err) => tracing::warn!(path = %current.display(), error = %err, "Skipping unreadable path"),
        }
    }
    files
}

/// Streams every file under `paths` whose extension is in `allowed`.
///
/// Same walk as [`list_files`], except that read failures (other than a path
/// not existing) are yielded as [`FileAccess`](ErrorKind::FileAccess) errors
/// instead of being logged. The stream continues after an error.
pub fn list_files_stream<S: AsRef<str>>(
    paths: impl IntoIterator<Item = impl AsRef<Path>>,
    allowed: &[S],
) -> impl Stream<Item = Result<PathBuf>> {
    let allowed: Vec<String> = allowed.iter().map(|allowed| allowed.as_ref().to_string()).collect();
    let mut stack = initial_stack(paths);
    stream! {
        if allowed.is_empty() {
            return;
        }
        while let Some((current, input)) = stack.pop() {
            let visited = visit_async(&current, input).await;
            match visited {
                Ok(Visit::Descend) => {
                    let children = read_dir_sorted_async(&current).await;
                    match children {
                        Ok(children) => stack.extend(children.into_iter().rev().map(|child| (child, false))),
                        Err(err) if err.kind() == IoErrorKind::NotFound => {},
                        Err(err) => yield Err(exn::Exn::from(err).raise(ErrorKind::FileAccess(current))),
                    }
                },
                Ok(Visit::File) if is_allowed(&current, allowed.as_slice()) => yield Ok(current),
                Ok(_) => {},
                Err(err) if err.kind() == IoErrorKind::NotFound => {},
                Err(err) => yield Err(exn::Exn::from(err).raise(ErrorKind::FileAccess(current))),
            }
        }
    }
}

/// Async counterpart of [`list_files`]: collects [`list_files_stream`],
/// logging and skipping its errors.
pub async fn list_files_async<S: AsRef<str>>(
    paths: impl IntoIterator<Item = impl AsRef<Path>>,
    allowed: &[S],
) -> Vec<PathBuf> {
    list_files_stream(paths, allowed)
        .filter_map(|item| async move {
            match item {
                Ok(path) => Some(path),
                Err(err) => {
                    tracing::warn!(error = ?err, "Skipping unreadable path");
                    None
                },
            }
        })
        .collect()
        .await
}
