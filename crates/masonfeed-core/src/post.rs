//! The feed item value type.

use serde::{Deserialize, Serialize};

/// Identifier of a post, unique across a whole feed.
pub type PostId = u64;

/// A single photo card in the feed.
///
/// Field names on the wire follow the collection endpoint
/// (`image`, `avatar`, `likes`). Identity is [`Post::id`]: two posts with the
/// same id are the same entity regardless of the other fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "image")]
    pub image_url: String,
    pub title: String,
    #[serde(rename = "avatar")]
    pub avatar_url: String,
    pub username: String,
    #[serde(rename = "likes")]
    pub like_count: u64,
}

impl Post {
    /// Creates a post with the given id and title and empty media fields.
    pub fn new(id: PostId, title: impl Into<String>) -> Self {
        Self {
            id,
            image_url: String::new(),
            title: title.into(),
            avatar_url: String::new(),
            username: String::new(),
            like_count: 0,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    pub fn with_author(mut self, username: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        self.username = username.into();
        self.avatar_url = avatar_url.into();
        self
    }

    pub fn with_likes(mut self, like_count: u64) -> Self {
        self.like_count = like_count;
        self
    }

    /// Whether `other` refers to the same feed entity.
    pub fn same_entity(&self, other: &Post) -> bool {
        self.id == other.id
    }
}
