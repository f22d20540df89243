//! Infinite-scroll feed pagination.
//!
//! # Architecture
//!
//! - [`FeedDataSource`] - fetches one page of posts
//! - [`VisibilityTrigger`] - emits [`FeedEvent::LoadMore`] when the bottom of
//!   the grid nears the viewport
//! - [`PaginationController`] - `Idle`/`Loading`/`Exhausted` state machine
//!   owning the accumulated [`FeedState`]
//! - [`HydrationGuard`] - holds back the real layout until a viewport exists
//! - [`FeedSession`] - event loop wiring the above to the masonry engine

mod data_source;
mod event;
mod hydration;
mod pagination;
mod session;
mod visibility;

pub use data_source::*;
pub use event::FeedEvent;
pub use hydration::HydrationGuard;
pub use pagination::*;
pub use session::*;
pub use visibility::*;
