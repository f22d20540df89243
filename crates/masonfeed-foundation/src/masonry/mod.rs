//! Column-balancing layout for the feed grid.
//!
//! # Architecture
//!
//! - [`Breakpoints`] - viewport width to column count
//! - [`ItemHeightEstimator`] - per-item height before images load
//! - [`MeasuredHeights`] - real heights reported back by the renderer
//! - [`place_items`] - greedy shortest-column placement
//! - [`MasonryLayoutEngine`] - ties the above together into a [`MasonryLayout`]
//!
//! Layouts are always recomputed from scratch: a new column count
//! invalidates every earlier placement.

mod breakpoints;
mod item_height;
mod masonry_column;
mod masonry_measure;

pub use breakpoints::*;
pub use item_height::*;
pub use masonry_column::*;
pub use masonry_measure::*;
