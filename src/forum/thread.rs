//! Thread model for Agora.
//!
//! This module defines the Thread struct and the data used to create,
//! update and filter threads.

use super::types::{ThreadStatus, Visibility};

/// Thread entity representing a discussion topic.
#[derive(Debug, Clone)]
pub struct Thread {
    /// Unique thread ID.
    pub id: i64,
    /// Thread title.
    pub title: String,
    /// Opening text of the thread.
    pub description: String,
    /// Tags, in the order they were given.
    pub tags: Vec<String>,
    /// ID of the user who created the thread.
    pub author_id: i64,
    /// Username of the author.
    pub author_name: String,
    /// Category, if any.
    pub category_id: Option<i64>,
    pub status: ThreadStatus,
    pub visibility: Visibility,
    pub view_count: i64,
    /// Number of messages in this thread.
    pub message_count: i64,
    /// Thread creation timestamp.
    pub created_at: String,
    /// Last update timestamp (edits and new messages).
    pub updated_at: String,
}

impl Thread {
    /// Check if the thread is public.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Data for creating a new thread.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// ID of the user creating the thread.
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub visibility: Visibility,
}

impl NewThread {
    /// Create a new public, uncategorized thread.
    pub fn new(title: impl Into<String>, description: impl Into<String>, author_id: i64) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tags: Vec::new(),
            author_id,
            category_id: None,
            visibility: Visibility::Public,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Data for updating an existing thread.
#[derive(Debug, Clone, Default)]
pub struct ThreadUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    /// `Some(None)` removes the category.
    pub category_id: Option<Option<i64>>,
    pub status: Option<ThreadStatus>,
    pub visibility: Option<Visibility>,
}

impl ThreadUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(normalize_tags(tags));
        self
    }

    pub fn category_id(mut self, category_id: Option<i64>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn status(mut self, status: ThreadStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.category_id.is_none()
            && self.status.is_none()
            && self.visibility.is_none()
    }
}

/// Criteria for listing threads.
///
/// `None` means "any". The default lists open, public threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadFilter {
    pub status: Option<ThreadStatus>,
    pub visibility: Option<Visibility>,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
}

impl Default for ThreadFilter {
    fn default() -> Self {
        Self {
            status: Some(ThreadStatus::Open),
            visibility: Some(Visibility::Public),
            category_id: None,
            author_id: None,
        }
    }
}

impl ThreadFilter {
    /// A filter that matches every thread.
    pub fn any() -> Self {
        Self {
            status: None,
            visibility: None,
            category_id: None,
            author_id: None,
        }
    }

    pub fn status(mut self, status: Option<ThreadStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn visibility(mut self, visibility: Option<Visibility>) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }
}

/// Trim tags, drop empty ones and remove case-insensitive duplicates.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag: String = tag.into();
        // Commas are the storage separator.
        for part in tag.split(',') {
            let part = part.trim();
            if part.is_empty() || out.iter().any(|t| t.eq_ignore_ascii_case(part)) {
                continue;
            }
            out.push(part.to_string());
        }
    }
    out
}

pub(crate) fn join_tags(tags: &[String]) -> String {
    tags.join(",")
}

pub(crate) fn split_tags(stored: &str) -> Vec<String> {
    normalize_tags(stored.split(','))
}
