use std::fmt;

/// Cursor identifying the next page to request.
///
/// Tokens are page indices starting at [`PageToken::FIRST`] and only ever
/// move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageToken(u32);

impl PageToken {
    /// Token of the first page of a feed.
    pub const FIRST: PageToken = PageToken(1);

    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the token of the page after this one, or `None` at the end of
    /// the token range.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(index) => Some(Self(index)),
            None => None,
        }
    }
}

impl Default for PageToken {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_advance_monotonically() {
        let first = PageToken::FIRST;
        assert_eq!(first.index(), 1);
        assert!(first.next() > Some(first));
        assert_eq!(first.next().and_then(PageToken::next), Some(PageToken::new(3)));
    }

    #[test]
    fn test_no_token_after_max() {
        assert_eq!(PageToken::new(u32::MAX).next(), None);
        assert_eq!(PageToken::new(u32::MAX - 1).next(), Some(PageToken::new(u32::MAX)));
    }
}
