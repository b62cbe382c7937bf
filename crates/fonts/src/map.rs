use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// An ordered mapping of font path to encoded CSS source.
///
/// Iteration follows insertion order, which is what gives stylesheet
/// rewriting its "first match wins" behaviour. A `None` value records a font
/// whose type could not be resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataUrlMap {
    entries: Vec<(PathBuf, Option<String>)>,
    // Position of each path in `entries`.
    index: HashMap<PathBuf, usize>,
}

impl DataUrlMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `path`.
    ///
    /// Replacing keeps the original position. Returns `true` if the path was
    /// not present before.
    pub fn insert(&mut self, path: impl Into<PathBuf>, src: Option<String>) -> bool {
        let path = path.into();
        match self.index.get(&path) {
            Some(&position) => {
                self.entries[position].1 = src;
                false
            },
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, src));
                true
            },
        }
    }

    /// Returns `None` if `path` is absent, `Some(None)` if it is present but
    /// could not be encoded.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Option<&str>> {
        self.index.get(path.as_ref()).map(|&position| self.entries[position].1.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, Option<&str>)> {
        self.entries.iter().map(|(path, src)| (path.as_path(), src.as_deref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(path, _)| path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<PathBuf>> FromIterator<(P, Option<String>)> for DataUrlMap {
    fn from_iter<T: IntoIterator<Item = (P, Option<String>)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (path, src) in iter {
            map.insert(path, src);
        }
        map
    }
}
