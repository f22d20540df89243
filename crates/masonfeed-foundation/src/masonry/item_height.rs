//! Height estimation for masonry placement.
//!
//! Placement has to be decided before images load, so every item gets an
//! estimated height. Real heights reported by the presentation layer are
//! kept in [`MeasuredHeights`] and take precedence on the next layout pass.

use masonfeed_core::collections::OrderedMap;
use masonfeed_core::{ConfigurationError, Post, PostId};

/// Default nominal item height, in abstract layout units.
pub const DEFAULT_NOMINAL_HEIGHT: f32 = 1.0;

/// Maximum number of measured heights retained.
pub const MAX_MEASURED_HEIGHTS: usize = 512;

/// Inputs available when estimating an item's height.
#[derive(Clone, Copy, Debug)]
pub struct EstimateContext<'a> {
    /// Position of the item in the feed.
    pub index: usize,
    pub post: &'a Post,
    /// Width of the column the layout is being computed for.
    pub column_width: f32,
    /// Running average of measured heights, if any were reported.
    pub measured_average: Option<f32>,
}

/// Estimates an item's height before it is rendered.
pub trait ItemHeightEstimator {
    fn estimate(&self, cx: &EstimateContext<'_>) -> f32;
}

impl<F> ItemHeightEstimator for F
where
    F: Fn(usize, &Post) -> f32,
{
    fn estimate(&self, cx: &EstimateContext<'_>) -> f32 {
        self(cx.index, cx.post)
    }
}

/// Every item gets the same height.
///
/// Once real heights have been measured, their running average is used in
/// place of the nominal value so both live in the same unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NominalHeight(f32);

impl NominalHeight {
    pub fn new(height: f32) -> Result<Self, ConfigurationError> {
        if height.is_finite() && height > 0.0 {
            Ok(Self(height))
        } else {
            Err(ConfigurationError::InvalidItemHeight(height))
        }
    }

    pub fn height(&self) -> f32 {
        self.0
    }
}

impl Default for NominalHeight {
    fn default() -> Self {
        Self(DEFAULT_NOMINAL_HEIGHT)
    }
}

impl ItemHeightEstimator for NominalHeight {
    fn estimate(&self, cx: &EstimateContext<'_>) -> f32 {
        cx.measured_average.unwrap_or(self.0)
    }
}

/// Card height from the column width: an image of fixed aspect ratio plus a
/// fixed text block underneath.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectRatioEstimator {
    /// Image height divided by image width.
    pub aspect_ratio: f32,
    /// Height of the title/author block below the image.
    pub text_height: f32,
}

impl AspectRatioEstimator {
    pub fn new(aspect_ratio: f32, text_height: f32) -> Result<Self, ConfigurationError> {
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(ConfigurationError::InvalidAspectRatio(aspect_ratio));
        }
        if !(text_height.is_finite() && text_height >= 0.0) {
            return Err(ConfigurationError::InvalidItemHeight(text_height));
        }
        Ok(Self {
            aspect_ratio,
            text_height,
        })
    }

    /// Portrait 3:4 photo cards with a two-line caption.
    pub fn portrait_card() -> Self {
        Self {
            aspect_ratio: 4.0 / 3.0,
            text_height: 48.0,
        }
    }
}

impl ItemHeightEstimator for AspectRatioEstimator {
    fn estimate(&self, cx: &EstimateContext<'_>) -> f32 {
        cx.column_width.max(0.0) * self.aspect_ratio + self.text_height
    }
}

/// Real item heights reported after rendering, keyed by post id.
///
/// Bounded to [`MAX_MEASURED_HEIGHTS`] entries with least-recently-reported
/// eviction. The running average covers the first report of every id ever
/// recorded; re-measurements replace the stored height but leave the average
/// alone.
#[derive(Clone, Debug, Default)]
pub struct MeasuredHeights {
    heights: OrderedMap<PostId, f32>,
    average: f32,
    total_reports: usize,
}

impl MeasuredHeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a measured height. Returns `false` if the value was invalid
    /// or identical to the one already stored.
    pub fn record(&mut self, id: PostId, height: f32) -> bool {
        if !height.is_finite() || height < 0.0 {
            log::warn!("ignoring invalid measured height {} for post {}", height, id);
            return false;
        }

        // Re-measurement: update in place and move to the back. The average
        // only counts first reports.
        if let Some(previous) = self.heights.shift_remove(&id) {
            self.heights.insert(id, height);
            return previous != height;
        }

        while self.heights.len() >= MAX_MEASURED_HEIGHTS {
            self.heights.shift_remove_index(0);
        }
        self.heights.insert(id, height);

        self.total_reports += 1;
        let n = self.total_reports as f32;
        self.average = self.average * ((n - 1.0) / n) + height / n;
        true
    }

    pub fn get(&self, id: PostId) -> Option<f32> {
        self.heights.get(&id).copied()
    }

    /// Running average of all reported heights, `None` before the first report.
    pub fn average(&self) -> Option<f32> {
        (self.total_reports > 0).then_some(self.average)
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn clear(&mut self) {
        self.heights.clear();
        self.average = 0.0;
        self.total_reports = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cx<'a>(post: &'a Post, column_width: f32, measured_average: Option<f32>) -> EstimateContext<'a> {
        EstimateContext {
            index: 0,
            post,
            column_width,
            measured_average,
        }
    }

    #[test]
    fn test_nominal_height_switches_to_measured_average() {
        let post = Post::new(1, "a");
        let nominal = NominalHeight::default();
        assert_eq!(nominal.estimate(&cx(&post, 100.0, None)), 1.0);
        assert_eq!(nominal.estimate(&cx(&post, 100.0, Some(240.0))), 240.0);
    }

    #[test]
    fn test_nominal_height_must_be_positive() {
        assert!(NominalHeight::new(0.0).is_err());
        assert!(NominalHeight::new(f32::NAN).is_err());
        assert!(NominalHeight::new(2.5).is_ok());
    }

    #[test]
    fn test_aspect_ratio_scales_with_column_width() {
        let post = Post::new(1, "a");
        let estimator = AspectRatioEstimator::portrait_card();
        assert!((estimator.estimate(&cx(&post, 300.0, None)) - 448.0).abs() < 1e-3);
        assert!((estimator.estimate(&cx(&post, 150.0, Some(1.0))) - 248.0).abs() < 1e-3);
    }

    #[test]
    fn test_closures_are_estimators() {
        let post = Post::new(9, "a");
        let by_index = |index: usize, _: &Post| if index == 0 { 3.0_f32 } else { 1.0 };
        assert_eq!(by_index.estimate(&cx(&post, 10.0, None)), 3.0);
    }

    #[test]
    fn test_measured_heights_track_running_average() {
        let mut heights = MeasuredHeights::new();
        assert_eq!(heights.average(), None);
        assert!(heights.record(1, 100.0));
        assert!(heights.record(2, 300.0));
        assert_eq!(heights.get(1), Some(100.0));
        assert_eq!(heights.average(), Some(200.0));
        assert!(!heights.record(1, 100.0));
        assert!(!heights.record(3, -5.0));
        assert_eq!(heights.len(), 2);
    }

    #[test]
    fn test_remeasurement_updates_in_place_without_moving_average() {
        let mut heights = MeasuredHeights::new();
        assert!(heights.record(1, 100.0));
        assert!(heights.record(1, 300.0));
        assert_eq!(heights.get(1), Some(300.0));
        assert_eq!(heights.average(), Some(100.0));
        assert_eq!(heights.len(), 1);

        assert!(heights.record(2, 200.0));
        assert_eq!(heights.average(), Some(150.0));
    }

    #[test]
    fn test_oldest_report_is_evicted_when_full() {
        let mut heights = MeasuredHeights::new();
        for id in 0..MAX_MEASURED_HEIGHTS as u64 {
            heights.record(id, 10.0);
        }
        // Refresh id 0 so id 1 becomes the oldest.
        heights.record(0, 20.0);
        heights.record(10_000, 10.0);
        assert_eq!(heights.len(), MAX_MEASURED_HEIGHTS);
        assert_eq!(heights.get(0), Some(20.0));
        assert_eq!(heights.get(1), None);
        assert_eq!(heights.get(10_000), Some(10.0));
    }
}
