//! Data source trait for paged feeds.

use std::sync::Arc;

use masonfeed_core::{FetchError, PageToken, Post};

/// Fetches one page of posts from a remote collection.
///
/// Implementations are read-only and are called from a worker thread, one
/// request at a time. A request past the end of the collection returns an
/// empty page or [`FetchError::NotFound`]; neither is retried.
pub trait FeedDataSource: Send + Sync {
    fn fetch_page(&self, token: PageToken) -> Result<Vec<Post>, FetchError>;
}

impl<T: FeedDataSource + ?Sized> FeedDataSource for Arc<T> {
    fn fetch_page(&self, token: PageToken) -> Result<Vec<Post>, FetchError> {
        (**self).fetch_page(token)
    }
}

impl<T: FeedDataSource + ?Sized> FeedDataSource for Box<T> {
    fn fetch_page(&self, token: PageToken) -> Result<Vec<Post>, FetchError> {
        (**self).fetch_page(token)
    }
}

/// In-memory pages, served from [`PageToken::FIRST`] onwards.
#[derive(Clone, Debug, Default)]
pub struct PagedFeedSource {
    pages: Vec<Vec<Post>>,
}

impl PagedFeedSource {
    pub fn new(pages: Vec<Vec<Post>>) -> Self {
        Self { pages }
    }

    /// Splits `posts` into pages of `page_size` items.
    pub fn from_posts(posts: Vec<Post>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let pages = posts
            .chunks(page_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl FeedDataSource for PagedFeedSource {
    fn fetch_page(&self, token: PageToken) -> Result<Vec<Post>, FetchError> {
        let offset = token
            .index()
            .checked_sub(PageToken::FIRST.index())
            .ok_or(FetchError::NotFound(token))?;
        self.pages
            .get(offset as usize)
            .cloned()
            .ok_or(FetchError::NotFound(token))
    }
}
