//! Message model for Agora.

/// A post within a thread.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub thread_id: i64,
    pub author_id: i64,
    /// Username of the author.
    pub author_name: String,
    pub content: String,
    /// Optional illustration.
    pub image_url: Option<String>,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Message {
    /// Likes minus dislikes.
    pub fn score(&self) -> i64 {
        self.likes - self.dislikes
    }
}

/// Data for posting a new message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub thread_id: i64,
    pub author_id: i64,
    pub content: String,
    pub image_url: Option<String>,
}

impl NewMessage {
    pub fn new(thread_id: i64, author_id: i64, content: impl Into<String>) -> Self {
        Self {
            thread_id,
            author_id,
            content: content.into(),
            image_url: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// Data for editing a message.
#[derive(Debug, Clone, Default)]
pub struct MessageUpdate {
    pub content: Option<String>,
    /// `Some(None)` removes the image.
    pub image_url: Option<Option<String>>,
}

impl MessageUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn image_url(mut self, url: Option<String>) -> Self {
        self.image_url = Some(url);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.image_url.is_none()
    }
}
