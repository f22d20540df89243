//! Core data model for masonfeed.
//!
//! Holds the value types shared by the pagination controller and the
//! masonry layout engine: [`Post`], [`PageToken`] and the error enums.

pub mod collections;
pub mod error;
mod page;
mod post;

pub use error::{ConfigurationError, FetchError};
pub use page::PageToken;
pub use post::{Post, PostId};
