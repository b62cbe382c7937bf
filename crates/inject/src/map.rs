use crate::scan::{list_files, list_files_async};
use f2b_fonts::error::Result as FontResult;
use f2b_fonts::{DataUrlMap, encode_to_data_src, encode_to_data_src_async};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Maximum number of font files read and encoded at once by
/// [`build_data_url_map_async`].
pub const MAX_ENCODE_CONCURRENCY: usize = 32;

fn collect_entries(encoded: impl IntoIterator<Item = (PathBuf, FontResult<Option<String>>)>) -> DataUrlMap {
    let mut map = DataUrlMap::new();
    for (path, src) in encoded {
        match src {
            Ok(src) => {
                if src.is_none() {
                    tracing::debug!(path = %path.display(), "Font type could not be determined");
                }
                map.insert(path, src);
            },
            Err(err) => tracing::warn!(path = %path.display(), error = ?err, "Skipping unreadable font"),
        }
    }
    tracing::info!(fonts = map.len(), "Font data URL map built");
    map
}

/// Scans `paths` for fonts with one of the `font_types` extensions and
/// encodes each into a CSS data source, keyed by path in discovery order.
///
/// Never fails: fonts that cannot be read are logged and left out, fonts of
/// unknown type are recorded with a `None` source.
#[instrument(skip_all)]
pub fn build_data_url_map<S: AsRef<str>>(
    paths: impl IntoIterator<Item = impl AsRef<Path>>,
    font_types: &[S],
) -> DataUrlMap {
    collect_entries(list_files(paths, font_types).into_iter().map(|path| {
        let src = encode_to_data_src(&path);
        (path, src)
    }))
}

/// Async counterpart of [`build_data_url_map`]. Up to
/// [`MAX_ENCODE_CONCURRENCY`] fonts are encoded at once; the map keeps
/// discovery order regardless of completion order.
#[instrument(skip_all)]
pub async fn build_data_url_map_async<S: AsRef<str>>(
    paths: impl IntoIterator<Item = impl AsRef<Path>>,
    font_types: &[S],
) -> DataUrlMap {
    let files = list_files_async(paths, font_types).await;
    let encoded: Vec<_> = futures::stream::iter(files)
        .map(|path| async move {
            let src = encode_to_data_src_async(&path).await;
            (path, src)
        })
        .buffered(MAX_ENCODE_CONCURRENCY)
        .collect()
        .await;
    collect_entries(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ALL_TYPES: [&str; 7] = [".svg", ".ttf", ".otf", ".eot", ".sfnt", ".woff2", ".woff"];

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.woff"), b"wOFF\x00\x01").unwrap();
        fs::write(dir.path().join("a.svg"), b"<svg/>").unwrap();
        fs::write(dir.path().join("sub/c.eot"), b"not really eot").unwrap();
        fs::write(dir.path().join("mystery.bin"), b"\x00\x00\x00\x00").unwrap();
        fs::write(dir.path().join("renamed.bin"), b"OTTO\x00\x0a").unwrap();
        fs::write(dir.path().join("style.css"), b"body {}").unwrap();
        dir
    }

    #[test]
    fn test_discovery_order_and_values() {
        let dir = fixture();
        let map = build_data_url_map([dir.path()], &ALL_TYPES);
        let keys: Vec<_> = map.keys().map(|k| k.strip_prefix(dir.path()).unwrap().to_path_buf()).collect();
        assert_eq!(keys, vec![PathBuf::from("a.svg"), PathBuf::from("b.woff"), PathBuf::from("sub/c.eot")]);
        let svg = map.get(dir.path().join("a.svg")).unwrap().unwrap();
        assert_eq!(svg, "url(data:image/svg+xml;charset=utf-8;base64,PHN2Zy8+) format('svg')");
        let eot = map.get(dir.path().join("sub/c.eot")).unwrap().unwrap();
        assert!(eot.ends_with("format('embedded-opentype')"));
    }

    #[test]
    fn test_unknown_types_are_recorded_as_none() {
        let dir = fixture();
        let map = build_data_url_map([dir.path()], &[".bin"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(dir.path().join("mystery.bin")), Some(None));
        let sniffed = map.get(dir.path().join("renamed.bin")).unwrap().unwrap();
        assert!(sniffed.starts_with("url(data:font/opentype;"));
    }

    #[test]
    fn test_empty_inputs() {
        let dir = fixture();
        assert!(build_data_url_map([dir.path()], &[] as &[&str]).is_empty());
        assert!(build_data_url_map([dir.path().join("nope")], &ALL_TYPES).is_empty());
    }

    #[tokio::test]
    async fn test_async_matches_blocking() {
        let dir = fixture();
        let types = [".woff", ".svg", ".eot", ".bin"];
        let blocking = build_data_url_map([dir.path()], &types);
        let nonblocking = build_data_url_map_async([dir.path()], &types).await;
        assert_eq!(blocking, nonblocking);
        assert_eq!(blocking.len(), 5);
    }
}
