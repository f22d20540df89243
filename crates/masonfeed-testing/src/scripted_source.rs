use masonfeed_core::collections::map::HashMap;
use masonfeed_core::{FetchError, PageToken, Post};
use masonfeed_foundation::feed::FeedDataSource;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// What a scripted page returns.
#[derive(Clone, Debug)]
pub enum ScriptedPage {
    Posts(Vec<Post>),
    Fail(FetchError),
}

#[derive(Debug, Default)]
struct Script {
    pages: HashMap<u32, ScriptedPage>,
    calls: Vec<PageToken>,
    held: bool,
}

/// Data source returning scripted pages, with a call log.
///
/// Tokens without a script return an empty page. Clones share the same
/// script, so a test can keep a handle after moving the source into a
/// session.
#[derive(Clone, Debug, Default)]
pub struct ScriptedFeedSource {
    script: Arc<(Mutex<Script>, Condvar)>,
}

impl ScriptedFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages served from token 1 onwards.
    pub fn with_pages(pages: impl IntoIterator<Item = Vec<Post>>) -> Self {
        let source = Self::new();
        for (offset, posts) in pages.into_iter().enumerate() {
            source.set_page(PageToken::FIRST.index() + offset as u32, posts);
        }
        source
    }

    pub fn set_page(&self, token: u32, posts: Vec<Post>) {
        self.lock().pages.insert(token, ScriptedPage::Posts(posts));
    }

    /// Makes the fetch for `token` fail with `error`.
    pub fn set_failure(&self, token: u32, error: FetchError) {
        self.lock().pages.insert(token, ScriptedPage::Fail(error));
    }

    /// Makes the fetch for `token` fail with an HTTP status.
    pub fn fail_with_status(&self, token: u32, status: u16) {
        let page = PageToken::new(token);
        self.set_failure(token, FetchError::Status { token: page, status });
    }

    /// Blocks every fetch until [`release`](Self::release) is called. The
    /// call is logged before blocking.
    pub fn hold(&self) {
        self.lock().held = true;
    }

    pub fn release(&self) {
        self.lock().held = false;
        self.script.1.notify_all();
    }

    /// Tokens requested so far, in call order.
    pub fn calls(&self) -> Vec<PageToken> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Waits until at least `count` fetches have been made.
    pub fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.call_count() < count {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FeedDataSource for ScriptedFeedSource {
    fn fetch_page(&self, token: PageToken) -> Result<Vec<Post>, FetchError> {
        let (lock, released) = &*self.script;
        let mut script = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        script.calls.push(token);
        while script.held {
            script = released
                .wait(script)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }

        log::trace!("scripted fetch for page {}", token);
        match script.pages.get(&token.index()) {
            Some(ScriptedPage::Posts(posts)) => Ok(posts.clone()),
            Some(ScriptedPage::Fail(error)) => Err(error.clone()),
            None => Ok(Vec::new()),
        }
    }
}

/// Posts with the given ids and generated titles.
pub fn make_posts(ids: impl IntoIterator<Item = u64>) -> Vec<Post> {
    ids.into_iter()
        .map(|id| {
            Post::new(id, format!("Photo {id}"))
                .with_image(format!("https://picsum.photos/seed/{id}/300/400"))
                .with_author(format!("user{}", id % 7), format!("https://i.pravatar.cc/48?u={id}"))
                .with_likes(id * 3 % 101)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscripted_tokens_are_empty() {
        let source = ScriptedFeedSource::with_pages([make_posts(0..3)]);
        assert_eq!(source.fetch_page(PageToken::FIRST).unwrap().len(), 3);
        assert!(source.fetch_page(PageToken::new(2)).unwrap().is_empty());
        assert_eq!(source.calls(), vec![PageToken::FIRST, PageToken::new(2)]);
    }

    #[test]
    fn test_held_fetch_completes_after_release() {
        let source = ScriptedFeedSource::with_pages([make_posts(0..2)]);
        source.hold();
        let worker = {
            let source = source.clone();
            std::thread::spawn(move || source.fetch_page(PageToken::FIRST))
        };
        assert!(source.wait_for_calls(1, Duration::from_secs(5)));
        assert!(!worker.is_finished());
        source.release();
        assert_eq!(worker.join().unwrap().unwrap().len(), 2);
    }
}
