//! Feed session: the event loop that connects the visibility trigger, the
//! pagination controller and the masonry layout engine.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use masonfeed_core::{ConfigurationError, FetchError, PageToken, Post, PostId};
use web_time::Instant;

use super::data_source::FeedDataSource;
use super::event::FeedEvent;
use super::hydration::HydrationGuard;
use super::pagination::{FeedState, FetchOutcome, FetchTicket, PaginationController, PaginationPhase};
use super::visibility::{TriggerStrategy, ViewportGeometry, VisibilityTrigger, DEFAULT_PREFETCH_MARGIN};
use crate::masonry::{
    AspectRatioEstimator, Breakpoints, Column, MasonryConfig, MasonryLayout, MasonryLayoutEngine,
    MeasuredHeights, NominalHeight, DEFAULT_NOMINAL_HEIGHT,
};

/// Default card image aspect ratio (height / width): 3:4 portrait photos.
pub const DEFAULT_CARD_ASPECT_RATIO: f32 = 4.0 / 3.0;

/// Default height of the title and author row under each card image.
pub const DEFAULT_CARD_TEXT_HEIGHT: f32 = 48.0;

/// Configuration for a [`FeedSession`].
#[derive(Clone, Debug)]
pub struct FeedConfig {
    /// Token of the first page requested.
    pub first_page_token: PageToken,
    /// Distance below the viewport at which the next page is requested.
    pub prefetch_margin: f32,
    /// Viewport width to column count mapping.
    pub breakpoints: Breakpoints,
    /// Horizontal gap between columns.
    pub column_spacing: f32,
    /// Vertical gap between cards in a column.
    pub item_spacing: f32,
    /// Height used for cards before anything is measured, when cards are not
    /// sized from the column width.
    pub nominal_item_height: f32,
    /// Image height / width. `None` sizes cards with `nominal_item_height`.
    pub card_aspect_ratio: Option<f32>,
    /// Fixed height added under each card image.
    pub card_text_height: f32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            first_page_token: PageToken::FIRST,
            prefetch_margin: DEFAULT_PREFETCH_MARGIN,
            breakpoints: Breakpoints::standard(),
            column_spacing: 16.0,
            item_spacing: 16.0,
            nominal_item_height: DEFAULT_NOMINAL_HEIGHT,
            card_aspect_ratio: Some(DEFAULT_CARD_ASPECT_RATIO),
            card_text_height: DEFAULT_CARD_TEXT_HEIGHT,
        }
    }
}

impl FeedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_first_page_token(mut self, token: PageToken) -> Self {
        self.first_page_token = token;
        self
    }

    pub fn with_prefetch_margin(mut self, margin: f32) -> Self {
        self.prefetch_margin = margin;
        self
    }

    pub fn with_breakpoints(mut self, breakpoints: Breakpoints) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    pub fn with_spacing(mut self, column_spacing: f32, item_spacing: f32) -> Self {
        self.column_spacing = column_spacing;
        self.item_spacing = item_spacing;
        self
    }

    /// Sizes every card with the same nominal height until real heights are
    /// reported.
    pub fn with_nominal_height(mut self, height: f32) -> Self {
        self.nominal_item_height = height;
        self.card_aspect_ratio = None;
        self
    }

    /// Sizes cards from the column width: `width * aspect_ratio + text_height`.
    pub fn with_card(mut self, aspect_ratio: f32, text_height: f32) -> Self {
        self.card_aspect_ratio = Some(aspect_ratio);
        self.card_text_height = text_height;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.masonry_config().validate()?;
        TriggerStrategy::new(self.prefetch_margin)?;
        NominalHeight::new(self.nominal_item_height)?;
        if let Some(aspect_ratio) = self.card_aspect_ratio {
            AspectRatioEstimator::new(aspect_ratio, self.card_text_height)?;
        }
        Ok(())
    }

    fn masonry_config(&self) -> MasonryConfig {
        MasonryConfig {
            breakpoints: self.breakpoints.clone(),
            column_spacing: self.column_spacing,
            item_spacing: self.item_spacing,
        }
    }

    fn layout_engine(&self) -> Result<MasonryLayoutEngine, ConfigurationError> {
        let engine = MasonryLayoutEngine::new(self.masonry_config())?;
        Ok(match self.card_aspect_ratio {
            Some(aspect_ratio) => {
                engine.with_estimator(AspectRatioEstimator::new(aspect_ratio, self.card_text_height)?)
            }
            None => engine.with_estimator(NominalHeight::new(self.nominal_item_height)?),
        })
    }
}

/// Indicator shown under the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Footer {
    Idle,
    Loading,
    NoMoreContent,
}

/// What the presentation layer should draw.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedView {
    /// The environment has not reported a viewport yet.
    Placeholder,
    Ready { columns: Vec<Column>, footer: Footer },
}

impl FeedView {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, FeedView::Placeholder)
    }

    pub fn columns(&self) -> &[Column] {
        match self {
            FeedView::Placeholder => &[],
            FeedView::Ready { columns, .. } => columns,
        }
    }

    pub fn footer(&self) -> Option<Footer> {
        match self {
            FeedView::Placeholder => None,
            FeedView::Ready { footer, .. } => Some(*footer),
        }
    }
}

/// A single infinite-scroll feed.
///
/// The session is single-threaded: events are queued on an `mpsc` channel and
/// handled one at a time by [`pump`](Self::pump). Only the page fetch runs on
/// a worker thread, which posts [`FeedEvent::PageFetched`] back to the same
/// channel.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use masonfeed_core::Post;
/// use masonfeed_foundation::feed::{FeedConfig, FeedSession, Footer, PagedFeedSource};
///
/// let posts = (0..12).map(|id| Post::new(id, format!("photo {id}"))).collect();
/// let source = PagedFeedSource::from_posts(posts, 12);
///
/// let mut session = FeedSession::new(source, FeedConfig::default()).unwrap();
/// session.start();
/// session.environment_ready(1200.0, 800.0);
/// assert!(session.wait_for_idle(Duration::from_secs(5)));
///
/// let view = session.view();
/// assert_eq!(view.columns().len(), 4);
/// assert_eq!(view.footer(), Some(Footer::Idle));
/// ```
pub struct FeedSession {
    source: Arc<dyn FeedDataSource>,
    config: FeedConfig,
    controller: PaginationController,
    engine: MasonryLayoutEngine,
    measured: MeasuredHeights,
    trigger: VisibilityTrigger,
    hydration: HydrationGuard,
    viewport_width: f32,
    geometry: ViewportGeometry,
    layout: Option<MasonryLayout>,
    events_tx: Sender<FeedEvent>,
    events_rx: Receiver<FeedEvent>,
    started: bool,
    closed: bool,
}

impl FeedSession {
    pub fn new(
        source: impl FeedDataSource + 'static,
        config: FeedConfig,
    ) -> Result<Self, ConfigurationError> {
        Self::with_shared_source(Arc::new(source), config)
    }

    pub fn with_shared_source(
        source: Arc<dyn FeedDataSource>,
        config: FeedConfig,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let engine = config.layout_engine()?;
        let (events_tx, events_rx) = channel();
        let trigger = VisibilityTrigger::new(
            TriggerStrategy::new(config.prefetch_margin)?,
            events_tx.clone(),
        );

        Ok(Self {
            source,
            controller: PaginationController::new(config.first_page_token),
            engine,
            measured: MeasuredHeights::new(),
            trigger,
            hydration: HydrationGuard::new(),
            viewport_width: 0.0,
            geometry: ViewportGeometry::default(),
            layout: None,
            events_tx,
            events_rx,
            started: false,
            closed: false,
            config,
        })
    }

    /// Starts the session and requests the first page.
    pub fn start(&mut self) {
        if self.started || self.closed {
            return;
        }
        self.started = true;
        log::info!(
            "feed session started at page {}",
            self.config.first_page_token
        );
        self.request_next_page();
    }

    /// Tears the session down. An in-flight fetch is cancelled and its result
    /// is dropped when it arrives.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.controller.cancel();
        self.trigger.disconnect();
        log::info!(
            "feed session closed with {} post(s) after {} fetch(es)",
            self.controller.state().len(),
            self.controller.fetch_count()
        );
    }

    /// Sender for posting events from outside the session.
    pub fn sender(&self) -> Sender<FeedEvent> {
        self.events_tx.clone()
    }

    /// Handles queued events until the channel is empty. Returns how many
    /// were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Pumps until no fetch is in flight and no event is queued. Returns
    /// `false` if `timeout` elapsed first.
    pub fn wait_for_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.is_idle() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                log::debug!("feed session still busy after {:?}", timeout);
                return false;
            }
            match self.events_rx.recv_timeout(deadline - now) {
                Ok(event) => self.dispatch(event),
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => return self.is_idle(),
            }
        }
    }

    fn is_idle(&self) -> bool {
        self.closed || !self.controller.state().is_loading()
    }

    /// Handles one event immediately.
    pub fn dispatch(&mut self, event: FeedEvent) {
        if self.closed {
            log::trace!("ignoring {} on closed session", event.name());
            return;
        }
        match event {
            FeedEvent::LoadMore if !self.started => {
                log::trace!("ignoring load-more before start");
            }
            FeedEvent::LoadMore => self.request_next_page(),
            FeedEvent::PageFetched { ticket, result } => self.apply_page(ticket, result),
            FeedEvent::Resized { viewport_width } => self.resize(viewport_width),
            FeedEvent::EnvironmentReady {
                viewport_width,
                viewport_height,
            } => self.environment_ready(viewport_width, viewport_height),
            FeedEvent::Scrolled(geometry) => self.scroll_to(geometry),
        }
    }

    /// Reports the real viewport. Only the first report has any effect.
    pub fn environment_ready(&mut self, viewport_width: f32, viewport_height: f32) {
        if !self.hydration.mark_ready(viewport_width) {
            log::debug!("environment already ready, ignoring {}px report", viewport_width);
            return;
        }
        self.viewport_width = viewport_width.max(0.0);
        self.geometry.viewport_height = viewport_height.max(0.0);
        log::debug!(
            "environment ready: {}x{}",
            self.viewport_width,
            self.geometry.viewport_height
        );
        self.relayout();
        self.observe_sentinel();
    }

    /// Updates the viewport width and recomputes the layout.
    pub fn resize(&mut self, viewport_width: f32) {
        if !self.hydration.is_ready() {
            log::trace!("resize to {} before environment ready", viewport_width);
            return;
        }
        let viewport_width = viewport_width.max(0.0);
        if viewport_width == self.viewport_width {
            return;
        }
        let previous = self.engine.column_count_for_width(self.viewport_width);
        let next = self.engine.column_count_for_width(viewport_width);
        if previous != next {
            log::debug!("column count {} -> {} at {}px", previous, next, viewport_width);
        }
        self.viewport_width = viewport_width;
        self.relayout();
        self.observe_sentinel();
    }

    /// Updates the scroll position and checks the sentinel.
    pub fn scroll_to(&mut self, geometry: ViewportGeometry) {
        self.geometry = geometry;
        self.observe_sentinel();
    }

    /// Records the rendered height of a card. Returns `true` if the layout
    /// was recomputed.
    pub fn report_item_height(&mut self, id: PostId, height: f32) -> bool {
        if self.closed || !self.controller.state().contains(id) {
            return false;
        }
        if !self.measured.record(id, height) {
            return false;
        }
        self.relayout();
        self.observe_sentinel();
        true
    }

    /// Current output for the presentation layer.
    pub fn view(&self) -> FeedView {
        match &self.layout {
            Some(layout) if self.hydration.is_ready() => FeedView::Ready {
                columns: layout.columns.clone(),
                footer: self.footer(),
            },
            _ => FeedView::Placeholder,
        }
    }

    pub fn footer(&self) -> Footer {
        let state = self.controller.state();
        if state.is_loading() {
            Footer::Loading
        } else if !state.has_more() {
            Footer::NoMoreContent
        } else {
            Footer::Idle
        }
    }

    pub fn state(&self) -> &FeedState {
        self.controller.state()
    }

    pub fn phase(&self) -> &PaginationPhase {
        self.controller.phase()
    }

    pub fn layout(&self) -> Option<&MasonryLayout> {
        self.layout.as_ref()
    }

    pub fn column_count(&self) -> Option<usize> {
        self.layout.as_ref().map(MasonryLayout::column_count)
    }

    pub fn fetch_count(&self) -> usize {
        self.controller.fetch_count()
    }

    pub fn measured_heights(&self) -> &MeasuredHeights {
        &self.measured
    }

    pub fn geometry(&self) -> ViewportGeometry {
        self.geometry
    }

    pub fn viewport_width(&self) -> Option<f32> {
        self.hydration.is_ready().then_some(self.viewport_width)
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydration.is_ready()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    fn request_next_page(&mut self) {
        if let Some(ticket) = self.controller.on_visibility_trigger() {
            self.spawn_fetch(ticket);
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        let source = Arc::clone(&self.source);
        let events = self.events_tx.clone();
        let cancellation = self.controller.cancellation_token();

        let spawned = thread::Builder::new()
            .name(format!("masonfeed-fetch-{}", ticket.token))
            .spawn(move || {
                let started = Instant::now();
                let result = source.fetch_page(ticket.token);
                log::debug!(
                    "page {} fetched in {:?} ({})",
                    ticket.token,
                    started.elapsed(),
                    match &result {
                        Ok(posts) => format!("{} post(s)", posts.len()),
                        Err(error) => error.to_string(),
                    }
                );
                if cancellation.is_cancelled() {
                    return;
                }
                // The receiver lives as long as the session.
                let _ = events.send(FeedEvent::PageFetched { ticket, result });
            });

        if let Err(error) = spawned {
            log::warn!("could not spawn fetch worker: {}", error);
            let failure = FetchError::Transport {
                token: ticket.token,
                message: error.to_string(),
            };
            self.apply_page(ticket, Err(failure));
        }
    }

    fn apply_page(&mut self, ticket: FetchTicket, result: Result<Vec<Post>, FetchError>) {
        match self.controller.on_fetch_complete(ticket, result) {
            FetchOutcome::Appended { added, .. } => {
                self.relayout();
                if self.controller.is_exhausted() {
                    self.trigger.disconnect();
                } else if added > 0 {
                    self.trigger.rearm();
                    self.observe_sentinel();
                } else {
                    // The grid did not grow; wait for the sentinel to re-enter.
                    log::debug!("page {} added nothing new, trigger stays latched", ticket.token);
                }
            }
            FetchOutcome::Exhausted(reason) => {
                log::info!(
                    "feed finished with {} post(s): {:?}",
                    self.controller.state().len(),
                    reason
                );
                self.trigger.disconnect();
            }
            FetchOutcome::Discarded(_) => {}
        }
    }

    fn relayout(&mut self) {
        if !self.hydration.is_ready() {
            return;
        }
        let layout = self.engine.layout(
            self.controller.state().items(),
            self.viewport_width,
            &self.measured,
        );
        log::trace!(
            "layout: {} post(s), {} column(s), height {:.1}",
            layout.item_count,
            layout.column_count(),
            layout.total_height()
        );
        self.layout = Some(layout);
    }

    // Skipped while a fetch is in flight: the commit re-arms and observes.
    fn observe_sentinel(&mut self) {
        let state = self.controller.state();
        if !self.started || !state.has_more() || state.is_loading() {
            return;
        }
        if let Some(layout) = &self.layout {
            self.trigger.observe(self.geometry, layout.total_height());
        }
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for FeedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSession")
            .field("phase", self.controller.phase())
            .field("items", &self.controller.state().len())
            .field("hydrated", &self.hydration.is_ready())
            .field("viewport_width", &self.viewport_width)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
