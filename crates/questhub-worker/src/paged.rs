//! Lazy page-at-a-time reads over a backing query.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use questhub_core::result::AppResult;
use questhub_core::types::PageRequest;

type PageFetch<T> = Box<dyn FnMut(PageRequest) -> BoxFuture<'static, AppResult<Vec<T>>> + Send>;

/// Pages through a query until it returns an empty page.
///
/// Pages are requested in order starting at page 1. Exhaustion is the first
/// empty page, never a count. Fetch errors are returned as-is and the page
/// is not retried.
pub struct PagedSource<T> {
    fetch: PageFetch<T>,
    first: PageRequest,
    next: PageRequest,
    exhausted: bool,
}

impl<T> std::fmt::Debug for PagedSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedSource")
            .field("next", &self.next)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> PagedSource<T> {
    /// Source backed by `fetch`, asking for `page_size` items at a time.
    pub fn new<F, Fut>(page_size: u64, mut fetch: F) -> Self
    where
        F: FnMut(PageRequest) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<Vec<T>>> + Send + 'static,
    {
        let first = PageRequest::first(page_size);
        Self {
            fetch: Box::new(move |page| fetch(page).boxed()),
            first,
            next: first,
            exhausted: false,
        }
    }

    /// Source over an in-memory list, such as a run-scope accumulator.
    pub fn from_vec(items: Vec<T>, page_size: u64) -> Self
    where
        T: Clone + Sync,
    {
        let items = Arc::new(items);
        Self::new(page_size, move |page: PageRequest| {
            let page = page.slice(items.as_slice()).to_vec();
            async move { Ok(page) }
        })
    }

    /// Source that yields nothing.
    pub fn empty() -> Self {
        Self::new(1, |_| async { Ok(Vec::new()) })
    }

    /// Fetch the next page. Empty once the source is exhausted.
    pub async fn next_page(&mut self) -> AppResult<Vec<T>> {
        if self.exhausted {
            return Ok(Vec::new());
        }
        let page = (self.fetch)(self.next).await?;
        if page.is_empty() {
            self.exhausted = true;
        } else {
            self.next = self.next.next();
        }
        Ok(page)
    }

    /// Start again from page 1.
    pub fn reset(&mut self) {
        self.next = self.first;
        self.exhausted = false;
    }

    /// Whether an empty page has been seen.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Regroups pages into chunks of a fixed size.
///
/// Page size and chunk size are independent; leftovers of a page carry over
/// into the next chunk.
#[derive(Debug)]
pub struct ChunkReader<T> {
    source: PagedSource<T>,
    chunk_size: usize,
    buffer: VecDeque<T>,
}

impl<T: Send + 'static> ChunkReader<T> {
    /// Read `source` in chunks of `chunk_size` (at least 1).
    pub fn new(source: PagedSource<T>, chunk_size: usize) -> Self {
        Self {
            source,
            chunk_size: chunk_size.max(1),
            buffer: VecDeque::new(),
        }
    }

    /// Up to `chunk_size` items. Empty means the input is used up.
    pub async fn read_chunk(&mut self) -> AppResult<Vec<T>> {
        while self.buffer.len() < self.chunk_size && !self.source.is_exhausted() {
            let page = self.source.next_page().await?;
            self.buffer.extend(page);
        }
        let take = self.chunk_size.min(self.buffer.len());
        Ok(self.buffer.drain(..take).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    use questhub_core::error::AppError;

    #[tokio::test]
    async fn test_stops_at_first_empty_page() {
        let calls = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&calls);
        let mut source = PagedSource::new(2, move |page: PageRequest| {
            seen.fetch_add(1, Ordering::SeqCst);
            let items: Vec<u64> = (0..5).collect();
            let page = page.slice(&items).to_vec();
            async move { Ok(page) }
        });

        assert_eq!(source.next_page().await.unwrap(), vec![0, 1]);
        assert_eq!(source.next_page().await.unwrap(), vec![2, 3]);
        assert_eq!(source.next_page().await.unwrap(), vec![4]);
        assert!(source.next_page().await.unwrap().is_empty());
        assert!(source.is_exhausted());
        assert!(source.next_page().await.unwrap().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_reset_starts_over() {
        let mut source = PagedSource::from_vec(vec!["a", "b"], 10);
        assert_eq!(source.next_page().await.unwrap(), vec!["a", "b"]);
        assert!(source.next_page().await.unwrap().is_empty());
        source.reset();
        assert!(!source.is_exhausted());
        assert_eq!(source.next_page().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let mut source: PagedSource<u8> =
            PagedSource::new(10, |_| async { Err(AppError::database("connection reset")) });
        let err = source.next_page().await.unwrap_err();
        assert_eq!(err.message, "connection reset");
    }

    #[tokio::test]
    async fn test_chunks_ignore_page_boundaries() {
        let source = PagedSource::from_vec((1..=7).collect::<Vec<u32>>(), 3);
        let mut reader = ChunkReader::new(source, 4);
        assert_eq!(reader.read_chunk().await.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(reader.read_chunk().await.unwrap(), vec![5, 6, 7]);
        assert!(reader.read_chunk().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_source_has_no_chunks() {
        let mut reader: ChunkReader<u32> = ChunkReader::new(PagedSource::empty(), 10);
        assert!(reader.read_chunk().await.unwrap().is_empty());
    }
}
