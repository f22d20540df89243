use std::fmt::Write;

use masonfeed_foundation::feed::{FeedView, Footer};

const CELL_WIDTH: usize = 22;

/// Draws the feed as text columns, one line per card.
pub fn render_view(view: &FeedView, viewport_width: f32) -> String {
    let mut out = String::new();
    match view {
        FeedView::Placeholder => {
            let _ = writeln!(out, "[ loading feed ]");
        }
        FeedView::Ready { columns, footer } => {
            let _ = writeln!(
                out,
                "== {}px, {} column(s) ==",
                viewport_width.round(),
                columns.len()
            );
            let rows = columns.iter().map(|column| column.len()).max().unwrap_or(0);
            for row in 0..rows {
                for column in columns {
                    let cell = column
                        .items
                        .get(row)
                        .map(|item| {
                            format!(
                                "#{:<4} {:<8} {:>4}\u{2665}",
                                item.post.id,
                                truncate(&item.post.username, 8),
                                item.post.like_count
                            )
                        })
                        .unwrap_or_default();
                    let _ = write!(out, "{:<width$}", cell, width = CELL_WIDTH);
                }
                out.push('\n');
            }
            let _ = writeln!(out, "{}", footer_text(*footer));
        }
    }
    out
}

fn footer_text(footer: Footer) -> &'static str {
    match footer {
        Footer::Idle => "",
        Footer::Loading => "... loading more ...",
        Footer::NoMoreContent => "-- no more content --",
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
