//! End-to-end feed scenarios driven through a real session and worker threads.

use masonfeed_core::{FetchError, PageToken};
use masonfeed_foundation::feed::{
    ExhaustReason, FeedConfig, FeedEvent, Footer, PaginationPhase, ViewportGeometry,
};
use masonfeed_foundation::masonry::Breakpoints;
use masonfeed_testing::{make_posts, FeedTestRule, ScriptedFeedSource};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn tokens(indices: &[u32]) -> Vec<PageToken> {
    indices.iter().copied().map(PageToken::new).collect()
}

fn ten_item_pages(count: u64) -> ScriptedFeedSource {
    ScriptedFeedSource::with_pages((0..count).map(|page| make_posts(page * 10..page * 10 + 10)))
}

#[test]
fn test_three_pages_then_empty_exhausts_after_four_fetches() {
    let source = ten_item_pages(3);
    let mut rule = FeedTestRule::new(source.clone(), FeedConfig::default());

    rule.start();
    rule.load_more().load_more().load_more();

    rule.assert_item_ids(0..30);
    assert!(!rule.session().state().has_more());
    assert_eq!(rule.session().fetch_count(), 4);
    assert_eq!(source.calls(), tokens(&[1, 2, 3, 4]));
    assert_eq!(
        rule.session().phase(),
        &PaginationPhase::Exhausted(ExhaustReason::EndOfFeed)
    );

    // Terminal: further signals are absorbed.
    rule.load_more();
    assert_eq!(source.call_count(), 4);
}

#[test]
fn test_tall_viewport_keeps_loading_until_the_end() {
    let source = ten_item_pages(3);
    let mut rule = FeedTestRule::new(source.clone(), FeedConfig::default());

    rule.start().hydrate(1200.0, 100_000.0);

    rule.assert_item_ids(0..30)
        .assert_footer(Footer::NoMoreContent)
        .assert_columns_cover_feed();
    assert_eq!(source.calls(), tokens(&[1, 2, 3, 4]));
}

#[test]
fn test_tall_and_short_cards_land_in_different_columns() {
    let source = ScriptedFeedSource::with_pages([make_posts(0..8)]);
    let config = FeedConfig::default()
        .with_nominal_height(1.0)
        .with_spacing(0.0, 0.0)
        .with_breakpoints(Breakpoints::fixed(4));
    let mut rule = FeedTestRule::new(source, config);
    rule.start().hydrate(800.0, 0.0);

    for (id, height) in [3.0, 1.0, 1.0, 1.0, 1.0, 3.0, 1.0, 1.0].into_iter().enumerate() {
        rule.session_mut().report_item_height(id as u64, height);
    }

    assert_eq!(
        rule.column_ids(),
        vec![vec![0], vec![1, 4, 7], vec![2, 5], vec![3, 6]]
    );
    let layout = rule.session().layout().unwrap();
    assert!(layout.imbalance() <= 2.0);
    assert_ne!(layout.column_of(0), layout.column_of(5));
    rule.assert_columns_cover_feed();
}

#[test]
fn test_failed_page_stops_the_feed() {
    let source = ten_item_pages(3);
    source.fail_with_status(2, 503);
    let mut rule = FeedTestRule::new(source.clone(), FeedConfig::default());

    rule.start().load_more();
    for _ in 0..5 {
        rule.load_more();
    }

    rule.assert_item_ids(0..10);
    assert_eq!(source.calls(), tokens(&[1, 2]));
    assert_eq!(
        rule.session().phase(),
        &PaginationPhase::Exhausted(ExhaustReason::Failed(FetchError::Status {
            token: PageToken::new(2),
            status: 503,
        }))
    );
    rule.hydrate(1000.0, 600.0).assert_footer(Footer::NoMoreContent);
}

#[test]
fn test_crossing_a_breakpoint_recomputes_every_column() {
    let source = ten_item_pages(2);
    let mut rule = FeedTestRule::new(source, FeedConfig::default());
    rule.start().load_more().hydrate(1200.0, 400.0);
    rule.assert_column_count(4).assert_columns_cover_feed();
    let wide = rule.column_ids();

    rule.resize(600.0);
    rule.assert_column_count(2).assert_columns_cover_feed();
    assert_ne!(rule.column_ids(), wide);

    rule.resize(300.0);
    rule.assert_column_count(1);
    assert_eq!(rule.column_ids(), vec![(0..20).collect::<Vec<u64>>()]);
}

#[test]
fn test_signals_while_loading_start_a_single_fetch() {
    let source = ten_item_pages(2);
    source.hold();
    let mut rule = FeedTestRule::new(source.clone(), FeedConfig::default());

    rule.session_mut().start();
    let sender = rule.session().sender();
    for _ in 0..20 {
        sender.send(FeedEvent::LoadMore).unwrap();
    }
    rule.session_mut().pump();
    assert!(rule.session().state().is_loading());

    source.release();
    rule.await_idle();
    assert_eq!(source.calls(), tokens(&[1]));
    rule.assert_item_ids(0..10);
}

#[test]
fn test_overlapping_pages_keep_first_occurrence() {
    let source = ScriptedFeedSource::with_pages([make_posts(0..10), make_posts(5..15)]);
    let mut rule = FeedTestRule::new(source, FeedConfig::default());
    rule.start().load_more();
    rule.assert_item_ids(0..15);
}

#[test]
fn test_placeholder_until_the_environment_is_ready() {
    let mut rule = FeedTestRule::new(ten_item_pages(1), FeedConfig::default());
    rule.start();
    assert!(rule.view().is_placeholder());
    assert_eq!(rule.session().state().len(), 10);

    rule.hydrate(1100.0, 200.0);
    rule.assert_column_count(4).assert_footer(Footer::Idle);

    // A second ready notification is ignored.
    rule.hydrate(400.0, 200.0);
    rule.assert_column_count(4);
}

#[test]
fn test_scrolling_to_the_bottom_loads_the_next_page() {
    let source = ten_item_pages(3);
    let mut rule = FeedTestRule::new(source.clone(), FeedConfig::default());
    rule.start().hydrate(1200.0, 600.0);
    assert_eq!(source.call_count(), 1);

    rule.scroll_to_bottom();
    assert_eq!(source.call_count(), 2);
    rule.assert_item_ids(0..20).assert_columns_cover_feed();

    // The grid grew past the viewport, so the same offset stays quiet.
    let offset = rule.session().geometry().scroll_offset;
    rule.send(FeedEvent::Scrolled(ViewportGeometry::new(offset, 600.0)));
    assert_eq!(source.call_count(), 2);
}

#[test]
fn test_closing_discards_the_in_flight_page() {
    let source = ten_item_pages(1);
    source.hold();
    let mut rule = FeedTestRule::new(source.clone(), FeedConfig::default());
    rule.session_mut().start();
    assert!(source.wait_for_calls(1, WAIT));

    rule.session_mut().close();
    source.release();
    std::thread::sleep(Duration::from_millis(50));
    rule.session_mut().pump();

    assert!(rule.session().state().is_empty());
    assert!(rule.session().is_closed());
    assert_eq!(source.call_count(), 1);
}

#[test]
fn test_repeated_posts_do_not_flood_the_source() {
    let source = ScriptedFeedSource::new();
    for token in 1..=50 {
        source.set_page(token, make_posts(0..3));
    }
    let mut rule = FeedTestRule::new(source.clone(), FeedConfig::default());

    rule.start().hydrate(1200.0, 5000.0);

    rule.assert_item_ids(0..3).assert_footer(Footer::Idle);
    assert_eq!(source.calls(), tokens(&[1, 2]));
    assert_eq!(rule.session().phase(), &PaginationPhase::Idle);
}
