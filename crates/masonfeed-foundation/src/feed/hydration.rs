/// One-shot latch that holds back layout-dependent output until the
/// rendering environment has reported a real viewport.
///
/// Flips from not-ready to ready on the first [`mark_ready`](Self::mark_ready)
/// and stays there. Later notifications are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HydrationGuard {
    ready_width: Option<f32>,
}

impl HydrationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the environment ready. Returns `true` only for the call that
    /// flipped the latch.
    pub fn mark_ready(&mut self, viewport_width: f32) -> bool {
        if self.ready_width.is_some() {
            return false;
        }
        self.ready_width = Some(viewport_width.max(0.0));
        true
    }

    pub fn is_ready(&self) -> bool {
        self.ready_width.is_some()
    }

    /// Width reported by the notification that flipped the latch.
    pub fn viewport_width(&self) -> Option<f32> {
        self.ready_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_flips_once() {
        let mut guard = HydrationGuard::new();
        assert!(!guard.is_ready());
        assert_eq!(guard.viewport_width(), None);

        assert!(guard.mark_ready(1024.0));
        assert!(guard.is_ready());
        assert!(!guard.mark_ready(400.0));
        assert_eq!(guard.viewport_width(), Some(1024.0));
    }
}
