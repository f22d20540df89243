//! Column representation for masonry layouts.
//!
//! Contains the result of placing the feed's posts into columns.

use std::rc::Rc;

use masonfeed_core::{Post, PostId};

/// A post placed into a column.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedItem {
    /// Index of the post in the feed's item list.
    pub index: usize,

    pub post: Rc<Post>,

    /// Estimated (or measured) height used for placement.
    pub height: f32,

    /// Offset from the top of the column.
    pub offset: f32,
}

/// One vertical track of the masonry grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    /// Column position, `0..column_count`.
    pub index: usize,

    /// Items in feed order.
    pub items: Vec<PlacedItem>,

    /// Sum of item heights plus spacing.
    pub height_estimate: f32,
}

impl Column {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            items: Vec::new(),
            height_estimate: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> + '_ {
        self.items.iter().map(|item| item.post.as_ref())
    }

    /// Ids of the posts in this column, in order.
    pub fn post_ids(&self) -> Vec<PostId> {
        self.items.iter().map(|item| item.post.id).collect()
    }

    /// Feed indices of the items in this column, ascending.
    pub fn original_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().map(|item| item.index)
    }
}

/// Result of a masonry layout pass.
#[derive(Clone, Debug, PartialEq)]
pub struct MasonryLayout {
    /// Columns from left to right.
    pub columns: Vec<Column>,

    /// Width of each column in the viewport's unit.
    pub column_width: f32,

    /// Number of items placed across all columns.
    pub item_count: usize,
}

impl MasonryLayout {
    /// A layout with `column_count` empty columns.
    pub fn empty(column_count: usize, column_width: f32) -> Self {
        Self {
            columns: (0..column_count).map(Column::new).collect(),
            column_width,
            item_count: 0,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Height of the tallest column. The bottom edge of the content.
    pub fn total_height(&self) -> f32 {
        self.columns
            .iter()
            .map(|column| column.height_estimate)
            .fold(0.0, f32::max)
    }

    /// Difference between the tallest and the shortest column.
    pub fn imbalance(&self) -> f32 {
        let shortest = self
            .columns
            .iter()
            .map(|column| column.height_estimate)
            .fold(f32::INFINITY, f32::min);
        if shortest.is_finite() {
            self.total_height() - shortest
        } else {
            0.0
        }
    }

    /// Column holding the post with the given id.
    pub fn column_of(&self, id: PostId) -> Option<usize> {
        self.columns
            .iter()
            .find(|column| column.items.iter().any(|item| item.post.id == id))
            .map(|column| column.index)
    }

    /// Posts back in feed order, recovered from the per-item indices.
    pub fn original_order(&self) -> Vec<Rc<Post>> {
        let mut placed: Vec<&PlacedItem> = self
            .columns
            .iter()
            .flat_map(|column| column.items.iter())
            .collect();
        placed.sort_by_key(|item| item.index);
        placed.into_iter().map(|item| item.post.clone()).collect()
    }
}
