//! Core placement algorithm for masonry layouts.
//!
//! Items are placed greedily, in feed order, into whichever column is
//! currently shortest. Ties go to the lowest column index, so the same input
//! always produces the same layout.

use std::rc::Rc;

use masonfeed_core::{ConfigurationError, Post};
use smallvec::SmallVec;

use super::breakpoints::Breakpoints;
use super::item_height::{EstimateContext, ItemHeightEstimator, MeasuredHeights, NominalHeight};
use super::masonry_column::{MasonryLayout, PlacedItem};

/// Configuration for masonry layout.
#[derive(Clone, Debug)]
pub struct MasonryConfig {
    /// Viewport width to column count mapping.
    pub breakpoints: Breakpoints,

    /// Horizontal gap between columns.
    pub column_spacing: f32,

    /// Vertical gap between items in a column.
    pub item_spacing: f32,
}

impl Default for MasonryConfig {
    fn default() -> Self {
        Self {
            breakpoints: Breakpoints::standard(),
            column_spacing: 16.0,
            item_spacing: 0.0,
        }
    }
}

impl MasonryConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.breakpoints.validate()?;
        for spacing in [self.column_spacing, self.item_spacing] {
            if !spacing.is_finite() || spacing < 0.0 {
                return Err(ConfigurationError::InvalidSpacing(spacing));
            }
        }
        Ok(())
    }
}

/// Column assignment for `item_count` items, independent of item data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MasonryPlacement {
    /// Column chosen for each item, by item index.
    pub lanes: Vec<usize>,

    /// Offset of each item within its column.
    pub offsets: Vec<f32>,

    /// Final height of each column.
    pub lane_heights: Vec<f32>,
}

/// Places `item_count` items into `column_count` columns.
///
/// `item_height` is called once per item, in order. Returns
/// [`ConfigurationError::ZeroColumns`] when `column_count` is zero.
pub fn place_items<F>(
    item_count: usize,
    column_count: usize,
    item_spacing: f32,
    mut item_height: F,
) -> Result<MasonryPlacement, ConfigurationError>
where
    F: FnMut(usize) -> f32,
{
    if column_count == 0 {
        return Err(ConfigurationError::ZeroColumns);
    }

    let mut lane_heights: SmallVec<[f32; 8]> = SmallVec::from_elem(0.0, column_count);
    let mut lane_used: SmallVec<[bool; 8]> = SmallVec::from_elem(false, column_count);
    let mut lanes = Vec::with_capacity(item_count);
    let mut offsets = Vec::with_capacity(item_count);

    for index in 0..item_count {
        let lane = shortest_lane(&lane_heights);
        let height = sanitize_height(item_height(index));
        let gap = if lane_used[lane] { item_spacing } else { 0.0 };
        let offset = lane_heights[lane] + gap;

        lanes.push(lane);
        offsets.push(offset);
        lane_heights[lane] = offset + height;
        lane_used[lane] = true;
    }

    Ok(MasonryPlacement {
        lanes,
        offsets,
        lane_heights: lane_heights.into_vec(),
    })
}

/// Index of the shortest lane; the first one wins ties.
fn shortest_lane(lane_heights: &[f32]) -> usize {
    let mut index = 0;
    let mut best = lane_heights.first().copied().unwrap_or(0.0);
    for (i, height) in lane_heights.iter().enumerate().skip(1) {
        if *height < best {
            best = *height;
            index = i;
        }
    }
    index
}

fn sanitize_height(height: f32) -> f32 {
    if height.is_finite() && height > 0.0 {
        height
    } else {
        0.0
    }
}

/// Width of one column when `viewport_width` is split into `column_count`
/// columns separated by `spacing`.
pub fn column_width(viewport_width: f32, column_count: usize, spacing: f32) -> f32 {
    if column_count == 0 {
        return 0.0;
    }
    let gaps = spacing * column_count.saturating_sub(1) as f32;
    ((viewport_width - gaps) / column_count as f32).max(0.0)
}

/// Balanced multi-column layout for feed posts.
///
/// Construction validates the configuration, so a bad breakpoint map fails
/// up front instead of mid-session.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use masonfeed_core::Post;
/// use masonfeed_foundation::masonry::{MasonryConfig, MasonryLayoutEngine, MeasuredHeights};
///
/// let engine = MasonryLayoutEngine::new(MasonryConfig::default()).unwrap();
/// let posts: Vec<Rc<Post>> = (0..6).map(|id| Rc::new(Post::new(id, "card"))).collect();
/// let layout = engine.layout(&posts, 1200.0, &MeasuredHeights::new());
/// assert_eq!(layout.column_count(), 4);
/// assert_eq!(layout.item_count, 6);
/// ```
pub struct MasonryLayoutEngine {
    config: MasonryConfig,
    estimator: Box<dyn ItemHeightEstimator>,
}

impl MasonryLayoutEngine {
    /// Creates an engine using [`NominalHeight`] estimates.
    pub fn new(config: MasonryConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            config,
            estimator: Box::new(NominalHeight::default()),
        })
    }

    /// Replaces the height estimator.
    pub fn with_estimator(mut self, estimator: impl ItemHeightEstimator + 'static) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    pub fn config(&self) -> &MasonryConfig {
        &self.config
    }

    /// Column count for a viewport of the given width.
    pub fn column_count_for_width(&self, viewport_width: f32) -> usize {
        self.config.breakpoints.columns_for_width(viewport_width)
    }

    /// Lays out `items` for a viewport of the given width.
    pub fn layout(
        &self,
        items: &[Rc<Post>],
        viewport_width: f32,
        measured: &MeasuredHeights,
    ) -> MasonryLayout {
        let column_count = self.column_count_for_width(viewport_width);
        let width = column_width(viewport_width, column_count, self.config.column_spacing);
        // Breakpoints are validated on construction, so the count is never zero.
        self.layout_columns(items, column_count, width, measured)
            .unwrap_or_else(|_| MasonryLayout::empty(0, width))
    }

    /// Lays out `items` into exactly `column_count` columns.
    pub fn layout_columns(
        &self,
        items: &[Rc<Post>],
        column_count: usize,
        column_width: f32,
        measured: &MeasuredHeights,
    ) -> Result<MasonryLayout, ConfigurationError> {
        let measured_average = measured.average();
        let mut heights = Vec::with_capacity(items.len());
        let placement = place_items(
            items.len(),
            column_count,
            self.config.item_spacing,
            |index| {
                let post = &items[index];
                let height = measured.get(post.id).unwrap_or_else(|| {
                    self.estimator.estimate(&EstimateContext {
                        index,
                        post: post.as_ref(),
                        column_width,
                        measured_average,
                    })
                });
                heights.push(height);
                height
            },
        )?;

        let mut layout = MasonryLayout::empty(column_count, column_width);
        for (index, post) in items.iter().enumerate() {
            let column = &mut layout.columns[placement.lanes[index]];
            column.items.push(PlacedItem {
                index,
                post: post.clone(),
                height: sanitize_height(heights[index]),
                offset: placement.offsets[index],
            });
        }
        for (column, height) in layout.columns.iter_mut().zip(placement.lane_heights) {
            column.height_estimate = height;
        }
        layout.item_count = items.len();

        log::trace!(
            "masonry layout: {} items into {} columns, imbalance {:.1}",
            layout.item_count,
            column_count,
            layout.imbalance()
        );
        Ok(layout)
    }
}

impl std::fmt::Debug for MasonryLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasonryLayoutEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Convenience for callers holding plain posts.
pub fn share_posts(posts: impl IntoIterator<Item = Post>) -> Vec<Rc<Post>> {
    posts.into_iter().map(Rc::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masonry::Column;

    fn posts(count: u64) -> Vec<Rc<Post>> {
        share_posts((0..count).map(|id| Post::new(id, format!("post {id}"))))
    }

    fn engine_with_heights(heights: Vec<f32>) -> MasonryLayoutEngine {
        MasonryLayoutEngine::new(MasonryConfig {
            breakpoints: Breakpoints::fixed(4),
            column_spacing: 0.0,
            item_spacing: 0.0,
        })
        .unwrap()
        .with_estimator(move |index: usize, _: &Post| heights[index])
    }

    #[test]
    fn test_zero_columns_is_a_configuration_error() {
        assert_eq!(
            place_items(3, 0, 0.0, |_| 1.0),
            Err(ConfigurationError::ZeroColumns)
        );
        assert!(MasonryLayoutEngine::new(MasonryConfig {
            breakpoints: Breakpoints::fixed(0),
            ..MasonryConfig::default()
        })
        .is_err());
    }

    #[test]
    fn test_ties_go_to_the_lowest_column() {
        let placement = place_items(6, 3, 0.0, |_| 1.0).unwrap();
        assert_eq!(placement.lanes, vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(placement.offsets, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_tall_items_push_later_items_elsewhere() {
        let engine = engine_with_heights(vec![3.0, 1.0, 1.0, 1.0, 1.0, 3.0, 1.0, 1.0]);
        let layout = engine
            .layout_columns(&posts(8), 4, 100.0, &MeasuredHeights::new())
            .unwrap();

        let ids: Vec<Vec<u64>> = layout.columns.iter().map(Column::post_ids).collect();
        assert_eq!(ids, vec![vec![0], vec![1, 4, 7], vec![2, 5], vec![3, 6]]);
        let heights: Vec<f32> = layout.columns.iter().map(|c| c.height_estimate).collect();
        assert_eq!(heights, vec![3.0, 3.0, 4.0, 2.0]);
        assert_ne!(layout.column_of(0), layout.column_of(5));
    }

    #[test]
    fn test_single_column_keeps_feed_order() {
        let placement = place_items(5, 1, 2.0, |_| 10.0).unwrap();
        assert_eq!(placement.lanes, vec![0; 5]);
        assert_eq!(placement.offsets, vec![0.0, 12.0, 24.0, 36.0, 48.0]);
        assert_eq!(placement.lane_heights, vec![58.0]);
    }

    #[test]
    fn test_empty_input_gives_empty_columns() {
        let engine = MasonryLayoutEngine::new(MasonryConfig::default()).unwrap();
        let layout = engine.layout(&[], 800.0, &MeasuredHeights::new());
        assert_eq!(layout.column_count(), 3);
        assert!(layout.columns.iter().all(Column::is_empty));
    }

    #[test]
    fn test_measured_heights_override_estimates() {
        let engine = engine_with_heights(vec![1.0; 4]);
        let mut measured = MeasuredHeights::new();
        measured.record(0, 5.0);
        let layout = engine.layout_columns(&posts(4), 2, 100.0, &measured).unwrap();
        assert_eq!(layout.columns[0].post_ids(), vec![0]);
        assert_eq!(layout.columns[1].post_ids(), vec![1, 2, 3]);
        assert_eq!(layout.columns[0].items[0].height, 5.0);
    }

    #[test]
    fn test_column_width_accounts_for_gaps() {
        assert_eq!(column_width(1000.0, 4, 16.0), 238.0);
        assert_eq!(column_width(500.0, 1, 16.0), 500.0);
        assert_eq!(column_width(10.0, 4, 16.0), 0.0);
        assert_eq!(column_width(10.0, 0, 16.0), 0.0);
    }

    #[test]
    fn test_invalid_heights_count_as_zero() {
        let placement = place_items(3, 2, 0.0, |i| if i == 0 { f32::NAN } else { 1.0 }).unwrap();
        assert_eq!(placement.lanes, vec![0, 0, 1]);
    }
}
