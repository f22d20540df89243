use masonfeed_core::PostId;
use masonfeed_foundation::feed::{
    FeedConfig, FeedDataSource, FeedEvent, FeedSession, FeedView, Footer, ViewportGeometry,
};
use masonfeed_foundation::masonry::MasonryLayout;
use std::time::Duration;

/// Default time a rule waits for the session to settle.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Drives a [`FeedSession`] from tests: starts it, injects viewport events
/// and waits for fetches to settle between steps.
pub struct FeedTestRule {
    session: FeedSession,
    idle_timeout: Duration,
}

impl FeedTestRule {
    pub fn new(source: impl FeedDataSource + 'static, config: FeedConfig) -> Self {
        let session = FeedSession::new(source, config)
            .unwrap_or_else(|error| panic!("invalid feed config: {error}"));
        Self {
            session,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Starts the session and waits for the first page.
    pub fn start(&mut self) -> &mut Self {
        self.session.start();
        self.await_idle()
    }

    /// Reports the real viewport and waits for any loads it triggers.
    pub fn hydrate(&mut self, width: f32, height: f32) -> &mut Self {
        self.send(FeedEvent::EnvironmentReady {
            viewport_width: width,
            viewport_height: height,
        })
    }

    pub fn resize(&mut self, width: f32) -> &mut Self {
        self.send(FeedEvent::Resized {
            viewport_width: width,
        })
    }

    pub fn scroll_to(&mut self, offset: f32) -> &mut Self {
        let height = self.session.geometry().viewport_height;
        self.send(FeedEvent::Scrolled(ViewportGeometry::new(offset, height)))
    }

    /// Scrolls so the bottom of the tallest column sits at the viewport's
    /// bottom edge.
    pub fn scroll_to_bottom(&mut self) -> &mut Self {
        let geometry = self.session.geometry();
        let bottom = self.session.layout().map_or(0.0, MasonryLayout::total_height);
        self.scroll_to((bottom - geometry.viewport_height).max(0.0))
    }

    /// Posts an explicit load-more signal.
    pub fn load_more(&mut self) -> &mut Self {
        self.send(FeedEvent::LoadMore)
    }

    pub fn send(&mut self, event: FeedEvent) -> &mut Self {
        if self.session.sender().send(event).is_err() {
            panic!("feed event channel closed");
        }
        self.await_idle()
    }

    /// Pumps the session until nothing is in flight. Panics on timeout.
    pub fn await_idle(&mut self) -> &mut Self {
        if !self.session.wait_for_idle(self.idle_timeout) {
            panic!(
                "feed failed to settle within {:?}: {:?}",
                self.idle_timeout, self.session
            );
        }
        self
    }

    pub fn session(&self) -> &FeedSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut FeedSession {
        &mut self.session
    }

    pub fn view(&self) -> FeedView {
        self.session.view()
    }

    pub fn item_ids(&self) -> Vec<PostId> {
        self.session.state().items().iter().map(|post| post.id).collect()
    }

    /// Post ids per column, left to right.
    pub fn column_ids(&self) -> Vec<Vec<PostId>> {
        self.view().columns().iter().map(|column| column.post_ids()).collect()
    }

    pub fn assert_item_ids(&self, expected: impl IntoIterator<Item = PostId>) -> &Self {
        let expected: Vec<PostId> = expected.into_iter().collect();
        assert_eq!(self.item_ids(), expected, "feed items differ");
        self
    }

    pub fn assert_column_count(&self, expected: usize) -> &Self {
        assert_eq!(self.view().columns().len(), expected, "column count differs");
        self
    }

    pub fn assert_footer(&self, expected: Footer) -> &Self {
        assert_eq!(self.view().footer(), Some(expected), "footer differs");
        self
    }

    /// Every feed item appears in exactly one column, and each column keeps
    /// feed order.
    pub fn assert_columns_cover_feed(&self) -> &Self {
        let view = self.view();
        let mut placed: Vec<PostId> = Vec::new();
        for column in view.columns() {
            let indices: Vec<usize> = column.original_indices().collect();
            assert!(
                indices.windows(2).all(|pair| pair[0] < pair[1]),
                "column {} is out of feed order: {:?}",
                column.index,
                indices
            );
            placed.extend(column.post_ids());
        }
        let mut expected = self.item_ids();
        placed.sort_unstable();
        expected.sort_unstable();
        assert_eq!(placed, expected, "columns do not cover the feed exactly once");
        self
    }
}

impl std::fmt::Debug for FeedTestRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedTestRule")
            .field("session", &self.session)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}
