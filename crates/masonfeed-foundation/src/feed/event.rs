//! Events processed by the feed session loop.

use masonfeed_core::{FetchError, Post};

use super::pagination::FetchTicket;
use super::visibility::ViewportGeometry;

/// Messages delivered to [`FeedSession`](super::FeedSession) through its
/// event channel. Each one is handled to completion before the next.
#[derive(Debug)]
pub enum FeedEvent {
    /// The sentinel entered the pre-fetch region.
    LoadMore,
    /// A worker finished the fetch for `ticket`.
    PageFetched {
        ticket: FetchTicket,
        result: Result<Vec<Post>, FetchError>,
    },
    /// The viewport width changed.
    Resized { viewport_width: f32 },
    /// The rendering environment reported its real viewport.
    EnvironmentReady {
        viewport_width: f32,
        viewport_height: f32,
    },
    /// The scroll position or viewport height changed.
    Scrolled(ViewportGeometry),
}

impl FeedEvent {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            FeedEvent::LoadMore => "LoadMore",
            FeedEvent::PageFetched { .. } => "PageFetched",
            FeedEvent::Resized { .. } => "Resized",
            FeedEvent::EnvironmentReady { .. } => "EnvironmentReady",
            FeedEvent::Scrolled(_) => "Scrolled",
        }
    }
}
