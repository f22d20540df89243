//! Demo driver: builds a feed session, simulates a user scrolling through it
//! and prints each frame as text.

mod render;

use std::time::Duration;

use anyhow::{ensure, Context};
use masonfeed_core::Post;
use masonfeed_foundation::feed::{FeedConfig, FeedSession, PagedFeedSource, ViewportGeometry};

pub use render::render_view;

const URL_VAR: &str = "MASONFEED_URL";
const WIDTH_VAR: &str = "MASONFEED_WIDTH";
const HEIGHT_VAR: &str = "MASONFEED_HEIGHT";

const OFFLINE_PAGES: u64 = 5;
const OFFLINE_PAGE_SIZE: u64 = 12;

/// Settings read from the environment.
#[derive(Clone, Debug)]
pub struct DemoSettings {
    /// Collection URL template. `None` serves a built-in offline feed.
    pub url: Option<String>,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub idle_timeout: Duration,
    /// Number of simulated scrolls to the bottom.
    pub scrolls: usize,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            url: None,
            viewport_width: 1200.0,
            viewport_height: 900.0,
            idle_timeout: Duration::from_secs(30),
            scrolls: 4,
        }
    }
}

impl DemoSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut settings = Self::default();
        settings.url = std::env::var(URL_VAR).ok().filter(|url| !url.is_empty());
        if let Some(width) = read_dimension(WIDTH_VAR)? {
            settings.viewport_width = width;
        }
        if let Some(height) = read_dimension(HEIGHT_VAR)? {
            settings.viewport_height = height;
        }
        Ok(settings)
    }
}

fn read_dimension(var: &str) -> anyhow::Result<Option<f32>> {
    match std::env::var(var) {
        Ok(raw) => {
            let value: f32 = raw
                .trim()
                .parse()
                .with_context(|| format!("{var} must be a number, got {raw:?}"))?;
            ensure!(value.is_finite() && value > 0.0, "{var} must be positive, got {value}");
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

fn offline_posts() -> Vec<Post> {
    const NAMES: [&str; 5] = ["ines", "tomasz", "keiko", "amara", "lev"];
    (1..=OFFLINE_PAGES * OFFLINE_PAGE_SIZE)
        .map(|id| {
            let name = NAMES[(id % NAMES.len() as u64) as usize];
            Post::new(id, format!("Photo #{id}"))
                .with_image(format!("https://picsum.photos/seed/{id}/600/800"))
                .with_author(name, format!("https://i.pravatar.cc/64?u={name}"))
                .with_likes(id * 37 % 500)
        })
        .collect()
}

fn open_session(settings: &DemoSettings) -> anyhow::Result<FeedSession> {
    let config = FeedConfig::default();
    match &settings.url {
        #[cfg(feature = "http")]
        Some(url) => {
            log::info!("loading feed from {}", url);
            let source = masonfeed_foundation::http::HttpFeedSource::new(url.clone())
                .context("failed to build HTTP client")?;
            FeedSession::new(source, config).context("invalid feed configuration")
        }
        #[cfg(not(feature = "http"))]
        Some(url) => anyhow::bail!("{URL_VAR}={url} needs the `http` feature"),
        None => {
            log::info!("no {} set, using the offline feed", URL_VAR);
            let source = PagedFeedSource::from_posts(offline_posts(), OFFLINE_PAGE_SIZE as usize);
            FeedSession::new(source, config).context("invalid feed configuration")
        }
    }
}

pub fn run(settings: DemoSettings) -> anyhow::Result<()> {
    let mut session = open_session(&settings)?;
    session.start();

    println!("{}", render_view(&session.view(), settings.viewport_width));

    session.environment_ready(settings.viewport_width, settings.viewport_height);
    settle(&mut session, &settings)?;
    println!("{}", render_view(&session.view(), settings.viewport_width));

    for _ in 0..settings.scrolls {
        if !session.state().has_more() {
            break;
        }
        let bottom = session.layout().map_or(0.0, |layout| layout.total_height());
        let offset = (bottom - settings.viewport_height).max(0.0);
        session.scroll_to(ViewportGeometry::new(offset, settings.viewport_height));
        settle(&mut session, &settings)?;
        println!("{}", render_view(&session.view(), settings.viewport_width));
    }

    // Narrow window: the grid is recomputed with fewer columns.
    session.resize(settings.viewport_width / 2.0);
    println!("{}", render_view(&session.view(), settings.viewport_width / 2.0));

    log::info!(
        "{} post(s) from {} fetch(es)",
        session.state().len(),
        session.fetch_count()
    );
    session.close();
    Ok(())
}

fn settle(session: &mut FeedSession, settings: &DemoSettings) -> anyhow::Result<()> {
    ensure!(
        session.wait_for_idle(settings.idle_timeout),
        "feed did not settle within {:?}",
        settings.idle_timeout
    );
    Ok(())
}
