//! Streams over paginated key listings, following continuation tokens until exhausted.

use async_stream::try_stream;
use futures_core::Stream;

use super::VectorStore;
use super::types::{IndexRef, VectorStoreError};

/// Stream every key stored in `index`, one page request at a time.
pub fn stream_keys<'a, S>(
    store: &'a S,
    index: &'a IndexRef,
) -> impl Stream<Item = Result<String, VectorStoreError>> + 'a
where
    S: VectorStore + ?Sized,
{
    try_stream! {
        let mut next_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = store.list_vectors(index, next_token.take()).await?;
            pages += 1;
            tracing::debug!(index = %index, page = pages, keys = page.keys.len(), "Listed vector keys");

            for key in page.keys {
                yield key;
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
    }
}
