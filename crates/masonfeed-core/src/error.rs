//! Error types shared across masonfeed crates.

use thiserror::Error;

use crate::PageToken;

/// Failure to obtain a page from a feed data source.
///
/// Every variant ends the feed: the pagination controller treats a failed
/// fetch the same as an empty page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("no page exists at token {0}")]
    NotFound(PageToken),
    #[error("request for page {token} returned status {status}")]
    Status { token: PageToken, status: u16 },
    #[error("transport failure fetching page {token}: {message}")]
    Transport { token: PageToken, message: String },
    #[error("could not decode page {token}: {message}")]
    Decode { token: PageToken, message: String },
}

impl FetchError {
    /// Token of the page the failed request was for.
    pub fn token(&self) -> PageToken {
        match self {
            FetchError::NotFound(token) => *token,
            FetchError::Status { token, .. }
            | FetchError::Transport { token, .. }
            | FetchError::Decode { token, .. } => *token,
        }
    }

    /// Whether the source reported that no page exists at the token, as
    /// opposed to failing to deliver one.
    pub fn is_end_of_collection(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// Invalid layout or feed configuration, reported at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("column count must be at least 1")]
    ZeroColumns,
    #[error("breakpoint at {min_width}px maps to zero columns")]
    ZeroColumnBreakpoint { min_width: u32 },
    #[error("breakpoint at {min_width}px is declared more than once")]
    DuplicateBreakpoint { min_width: u32 },
    #[error("nominal item height must be finite and positive, got {0}")]
    InvalidItemHeight(f32),
    #[error("spacing must be finite and non-negative, got {0}")]
    InvalidSpacing(f32),
    #[error("aspect ratio must be finite and positive, got {0}")]
    InvalidAspectRatio(f32),
    #[error("prefetch margin must be finite and non-negative, got {0}")]
    InvalidPrefetchMargin(f32),
}
