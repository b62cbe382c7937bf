//! Async encode operations (feature-gated behind `async`).
//!
//! Async counterparts of the blocking encoders. Only file access differs:
//! bytes are read through `tokio::fs` and then handed to the same
//! [`encode_bytes`] used by the blocking path.

use crate::encode::{Encoded, encode_bytes};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::future::join_all;
use std::path::Path;
use tracing::instrument;

#[instrument(level = "debug", fields(size))]
async fn encode_file(path: &Path) -> Result<Encoded> {
    let bytes = tokio::fs::read(path).await.or_raise(|| ErrorKind::FileAccess(path.to_path_buf()))?;
    tracing::Span::current().record("size", bytes.len());
    Ok(encode_bytes(path, &bytes, None))
}

/// Async counterpart of [`encode_to_data_url`](crate::encode_to_data_url).
pub async fn encode_to_data_url_async(path: impl AsRef<Path>) -> Result<String> {
    encode_file(path.as_ref()).await?.data_url()
}

/// Async counterpart of [`encode_to_data_src`](crate::encode_to_data_src).
pub async fn encode_to_data_src_async(path: impl AsRef<Path>) -> Result<Option<String>> {
    Ok(encode_file(path.as_ref()).await?.data_src())
}

/// Encodes every path concurrently; one result per path, same order.
pub async fn encode_many_to_data_url_async<I, P>(paths: I) -> Vec<Result<String>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    join_all(paths.into_iter().map(encode_to_data_url_async)).await
}

/// Encodes every path concurrently; one result per path, same order.
pub async fn encode_many_to_data_src_async<I, P>(paths: I) -> Vec<Result<Option<String>>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    join_all(paths.into_iter().map(encode_to_data_src_async)).await
}
