//! Feed pagination and masonry layout for masonfeed.

pub mod feed;
#[cfg(feature = "http")]
pub mod http;
pub mod masonry;

pub use feed::{
    FeedConfig, FeedDataSource, FeedEvent, FeedSession, FeedView, Footer, PagedFeedSource,
    PaginationController,
};
pub use masonry::{Breakpoints, Column, MasonryConfig, MasonryLayout, MasonryLayoutEngine};
