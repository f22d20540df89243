//! Sentinel visibility detection.
//!
//! Signals "load more" before the bottom of the content scrolls into view, so
//! the next page is usually in place by the time the user gets there.

use std::sync::mpsc::Sender;

use masonfeed_core::ConfigurationError;

use super::event::FeedEvent;

/// Default distance below the viewport at which loading starts.
pub const DEFAULT_PREFETCH_MARGIN: f32 = 100.0;

/// How far ahead of the viewport the trigger fires.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerStrategy {
    /// Distance below the viewport bottom that counts as visible.
    pub prefetch_margin: f32,

    /// Whether the trigger emits at all.
    pub enabled: bool,
}

impl Default for TriggerStrategy {
    fn default() -> Self {
        Self {
            prefetch_margin: DEFAULT_PREFETCH_MARGIN,
            enabled: true,
        }
    }
}

impl TriggerStrategy {
    pub fn new(prefetch_margin: f32) -> Result<Self, ConfigurationError> {
        if !prefetch_margin.is_finite() || prefetch_margin < 0.0 {
            return Err(ConfigurationError::InvalidPrefetchMargin(prefetch_margin));
        }
        Ok(Self {
            prefetch_margin,
            enabled: true,
        })
    }

    /// A strategy that never emits. Loading then relies on explicit
    /// `LoadMore` events from the host.
    pub fn disabled() -> Self {
        Self {
            prefetch_margin: 0.0,
            enabled: false,
        }
    }
}

/// Vertical scroll state of the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportGeometry {
    /// Distance scrolled from the top of the content.
    pub scroll_offset: f32,
    pub viewport_height: f32,
}

impl ViewportGeometry {
    pub fn new(scroll_offset: f32, viewport_height: f32) -> Self {
        Self {
            scroll_offset,
            viewport_height,
        }
    }

    /// Bottom edge of the region in which the sentinel counts as visible.
    pub fn reach(&self, prefetch_margin: f32) -> f32 {
        self.scroll_offset.max(0.0) + self.viewport_height.max(0.0) + prefetch_margin
    }
}

/// Edge-triggered observer of the content's bottom edge.
///
/// Emits one [`FeedEvent::LoadMore`] when the sentinel enters the viewport
/// extended by the pre-fetch margin. It emits again only after the sentinel
/// leaves and re-enters, or after [`rearm`](Self::rearm). Once disconnected it
/// never emits again.
#[derive(Debug)]
pub struct VisibilityTrigger {
    strategy: TriggerStrategy,
    events: Sender<FeedEvent>,
    inside: bool,
    connected: bool,
    signals_sent: usize,
}

impl VisibilityTrigger {
    pub fn new(strategy: TriggerStrategy, events: Sender<FeedEvent>) -> Self {
        Self {
            strategy,
            events,
            inside: false,
            connected: true,
            signals_sent: 0,
        }
    }

    pub fn strategy(&self) -> &TriggerStrategy {
        &self.strategy
    }

    /// Checks the sentinel at `sentinel` (content coordinates) against the
    /// viewport. Returns `true` if a signal was sent.
    pub fn observe(&mut self, viewport: ViewportGeometry, sentinel: f32) -> bool {
        if !self.connected || !self.strategy.enabled {
            return false;
        }

        let visible = sentinel <= viewport.reach(self.strategy.prefetch_margin);
        if !visible {
            self.inside = false;
            return false;
        }
        if self.inside {
            return false;
        }

        self.inside = true;
        if self.events.send(FeedEvent::LoadMore).is_err() {
            log::debug!("feed event channel closed, disconnecting trigger");
            self.connected = false;
            return false;
        }
        self.signals_sent += 1;
        log::trace!(
            "sentinel at {:.1} within {:.1}, load more",
            sentinel,
            viewport.reach(self.strategy.prefetch_margin)
        );
        true
    }

    /// Forgets that the sentinel was visible, so the next observation emits
    /// again if it still is.
    pub fn rearm(&mut self) {
        self.inside = false;
    }

    /// Stops observing for good.
    pub fn disconnect(&mut self) {
        if self.connected {
            log::debug!("visibility trigger disconnected after {} signal(s)", self.signals_sent);
        }
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn signals_sent(&self) -> usize {
        self.signals_sent
    }
}
