//! Feed pagination state machine.
//!
//! Provides [`PaginationController`], which owns the accumulated
//! [`FeedState`] and decides when a page fetch may start.
//!
//! ```text
//!            LoadMore (has_more)             non-empty page
//!   Idle ---------------------------> Loading ---------------> Idle
//!                                        |
//!                                        | empty page / failure / last token
//!                                        v
//!                                    Exhausted (terminal)
//! ```

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use masonfeed_core::collections::map::HashSet;
use masonfeed_core::{FetchError, PageToken, Post, PostId};

/// Accumulated feed contents. Only [`PaginationController`] mutates it.
#[derive(Clone, Debug)]
pub struct FeedState {
    items: Vec<Rc<Post>>,
    seen: HashSet<PostId>,
    next_page_token: PageToken,
    has_more: bool,
    is_loading: bool,
}

impl FeedState {
    fn new(first_page_token: PageToken) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::default(),
            next_page_token: first_page_token,
            has_more: true,
            is_loading: false,
        }
    }

    /// Posts in arrival order, each id at most once.
    pub fn items(&self) -> &[Rc<Post>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: PostId) -> bool {
        self.seen.contains(&id)
    }

    pub fn next_page_token(&self) -> PageToken {
        self.next_page_token
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Appends posts whose id is not yet present. Returns how many were
    /// added and how many were dropped as duplicates.
    fn append(&mut self, posts: Vec<Post>) -> (usize, usize) {
        let mut added = 0;
        let mut duplicates = 0;
        for post in posts {
            if self.seen.insert(post.id) {
                self.items.push(Rc::new(post));
                added += 1;
            } else {
                duplicates += 1;
            }
        }
        (added, duplicates)
    }
}

/// Why a feed stopped loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExhaustReason {
    /// The source returned an empty page or reported no page at the token.
    EndOfFeed,
    /// The fetch failed. Treated as the end of the feed; never retried.
    Failed(FetchError),
}

/// Controller phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaginationPhase {
    Idle,
    Loading,
    Exhausted(ExhaustReason),
}

/// Handle for one in-flight fetch.
///
/// A completion is applied only when it carries the ticket of the fetch the
/// controller is currently waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub token: PageToken,
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Why a fetch completion was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscardReason {
    /// The session was torn down while the fetch was in flight.
    Cancelled,
    /// The ticket does not match the outstanding fetch.
    Stale,
}

/// Result of applying a fetch completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    Appended { added: usize, duplicates: usize },
    Exhausted(ExhaustReason),
    Discarded(DiscardReason),
}

/// Shared flag checked when a fetch completes.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owns [`FeedState`] and drives page fetches.
///
/// The controller never performs I/O. [`on_visibility_trigger`] hands out a
/// [`FetchTicket`] when a fetch should start; the caller runs it and reports
/// back through [`on_fetch_complete`].
///
/// [`on_visibility_trigger`]: PaginationController::on_visibility_trigger
/// [`on_fetch_complete`]: PaginationController::on_fetch_complete
///
/// # Example
///
/// ```rust
/// use masonfeed_core::{PageToken, Post};
/// use masonfeed_foundation::feed::{FetchOutcome, PaginationController};
///
/// let mut controller = PaginationController::new(PageToken::FIRST);
/// let ticket = controller.on_visibility_trigger().unwrap();
/// // A second signal while loading is ignored.
/// assert!(controller.on_visibility_trigger().is_none());
///
/// let outcome = controller.on_fetch_complete(ticket, Ok(vec![Post::new(1, "hello")]));
/// assert_eq!(outcome, FetchOutcome::Appended { added: 1, duplicates: 0 });
/// assert_eq!(controller.state().next_page_token(), PageToken::new(2));
/// ```
#[derive(Debug)]
pub struct PaginationController {
    state: FeedState,
    phase: PaginationPhase,
    in_flight: Option<FetchTicket>,
    next_generation: u64,
    fetch_count: usize,
    cancellation: CancellationToken,
}

impl PaginationController {
    pub fn new(first_page_token: PageToken) -> Self {
        Self {
            state: FeedState::new(first_page_token),
            phase: PaginationPhase::Idle,
            in_flight: None,
            next_generation: 1,
            fetch_count: 0,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn phase(&self) -> &PaginationPhase {
        &self.phase
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.phase, PaginationPhase::Exhausted(_))
    }

    /// Outstanding fetch, if any.
    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Cancels the outstanding fetch, if any. Its completion will be dropped.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Handles a "load more" signal.
    ///
    /// Returns a ticket only on the `Idle -> Loading` transition. Signals
    /// arriving while loading, after exhaustion or after cancellation are
    /// ignored.
    pub fn on_visibility_trigger(&mut self) -> Option<FetchTicket> {
        if self.cancellation.is_cancelled() {
            return None;
        }
        match self.phase {
            PaginationPhase::Idle if self.state.has_more => {}
            PaginationPhase::Idle | PaginationPhase::Loading | PaginationPhase::Exhausted(_) => {
                log::trace!("load-more ignored in phase {:?}", self.phase);
                return None;
            }
        }

        let ticket = FetchTicket {
            token: self.state.next_page_token,
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.fetch_count += 1;
        self.in_flight = Some(ticket);
        self.state.is_loading = true;
        self.phase = PaginationPhase::Loading;
        log::debug!("requesting page {}", ticket.token);
        Some(ticket)
    }

    /// Applies the result of the fetch identified by `ticket`.
    ///
    /// A non-empty page for the last representable token is appended and then
    /// ends the feed, since no later token exists to request.
    pub fn on_fetch_complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Post>, FetchError>,
    ) -> FetchOutcome {
        if self.cancellation.is_cancelled() {
            log::debug!("dropping page {} completion: session cancelled", ticket.token);
            return FetchOutcome::Discarded(DiscardReason::Cancelled);
        }
        if self.in_flight != Some(ticket) {
            log::warn!(
                "dropping stale completion for page {} (outstanding: {:?})",
                ticket.token,
                self.in_flight.map(|t| t.token)
            );
            return FetchOutcome::Discarded(DiscardReason::Stale);
        }

        self.in_flight = None;
        self.state.is_loading = false;

        match result {
            Ok(posts) if !posts.is_empty() => {
                let (added, duplicates) = self.state.append(posts);
                if duplicates > 0 {
                    log::debug!(
                        "page {}: dropped {} duplicate post(s)",
                        ticket.token,
                        duplicates
                    );
                }
                log::debug!(
                    "page {} appended {} post(s), feed now {}",
                    ticket.token,
                    added,
                    self.state.len()
                );
                match ticket.token.next() {
                    Some(next) => {
                        self.state.next_page_token = next;
                        self.phase = PaginationPhase::Idle;
                    }
                    None => {
                        log::warn!("no page token after {}", ticket.token);
                        self.exhaust(ExhaustReason::EndOfFeed);
                    }
                }
                FetchOutcome::Appended { added, duplicates }
            }
            Ok(_) => self.exhaust(ExhaustReason::EndOfFeed),
            Err(error) if error.is_end_of_collection() => self.exhaust(ExhaustReason::EndOfFeed),
            Err(error) => {
                log::warn!("fetch failed, feed stopped: {}", error);
                self.exhaust(ExhaustReason::Failed(error))
            }
        }
    }

    fn exhaust(&mut self, reason: ExhaustReason) -> FetchOutcome {
        log::debug!(
            "feed exhausted after {} post(s): {:?}",
            self.state.len(),
            reason
        );
        self.state.has_more = false;
        self.phase = PaginationPhase::Exhausted(reason.clone());
        FetchOutcome::Exhausted(reason)
    }
}
