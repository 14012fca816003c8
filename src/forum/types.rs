//! Shared forum types for Agora.
//!
//! Thread status and visibility, reaction kinds, message ordering and
//! pagination parameters.

use std::fmt;
use std::str::FromStr;

/// Default page size for listings.
pub const DEFAULT_PER_PAGE: i64 = 10;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: i64 = 100;

/// Lifecycle status of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThreadStatus {
    /// Accepting new messages.
    #[default]
    Open,
    /// Readable, but no new messages.
    Closed,
    /// Hidden from search, no new messages.
    Archived,
}

impl ThreadStatus {
    /// All statuses, in display order.
    pub const ALL: [ThreadStatus; 3] = [
        ThreadStatus::Open,
        ThreadStatus::Closed,
        ThreadStatus::Archived,
    ];

    /// Convert status to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadStatus::Open => "open",
            ThreadStatus::Closed => "closed",
            ThreadStatus::Archived => "archived",
        }
    }

    /// Whether new messages may be posted.
    pub fn accepts_messages(&self) -> bool {
        *self == ThreadStatus::Open
    }
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ThreadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(ThreadStatus::Open),
            "closed" => Ok(ThreadStatus::Closed),
            "archived" => Ok(ThreadStatus::Archived),
            _ => Err("Invalid status".to_string()),
        }
    }
}

/// Who may see a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    /// Only the author and administrators.
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err("Invalid visibility".to_string()),
        }
    }
}

/// A like or a dislike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }

    /// Past-tense verb used in user-facing messages.
    pub fn past_tense(&self) -> &'static str {
        match self {
            ReactionKind::Like => "liked",
            ReactionKind::Dislike => "disliked",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "like" => Ok(ReactionKind::Like),
            "dislike" => Ok(ReactionKind::Dislike),
            _ => Err("Invalid reaction type".to_string()),
        }
    }
}

/// Ordering of messages inside a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageSort {
    #[default]
    Newest,
    Oldest,
    /// Highest `likes - dislikes` first.
    Likes,
}

impl MessageSort {
    /// Parse a `sort_by` query value.
    ///
    /// Unknown or missing values fall back to [`MessageSort::Newest`].
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("oldest") => MessageSort::Oldest,
            Some("likes") | Some("popularity") => MessageSort::Likes,
            _ => MessageSort::Newest,
        }
    }

    /// SQL ORDER BY clause for the `messages` table aliased as `m`.
    pub(crate) fn order_clause(&self) -> &'static str {
        match self {
            MessageSort::Newest => "m.created_at DESC, m.id DESC",
            MessageSort::Oldest => "m.created_at ASC, m.id ASC",
            MessageSort::Likes => "(m.likes - m.dislikes) DESC, m.created_at DESC, m.id DESC",
        }
    }
}

/// Pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of items to skip.
    pub offset: i64,
    /// Maximum number of items to return.
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first(DEFAULT_PER_PAGE)
    }
}

impl Pagination {
    /// Create new pagination parameters.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// Create pagination for the first page with given limit.
    pub fn first(limit: i64) -> Self {
        Self { offset: 0, limit }
    }

    /// Build from 1-based `page` and `per_page` query values.
    ///
    /// Missing or non-positive values fall back to page 1 and
    /// [`DEFAULT_PER_PAGE`]; `per_page` is capped at [`MAX_PER_PAGE`].
    /// The offset saturates instead of overflowing for huge pages.
    pub fn from_page(page: Option<i64>, per_page: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let per_page = per_page
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PER_PAGE)
            .min(MAX_PER_PAGE);
        Self {
            offset: (page - 1).saturating_mul(per_page),
            limit: per_page,
        }
    }

    /// 1-based page number.
    pub fn page(&self) -> i64 {
        if self.limit <= 0 {
            return 1;
        }
        (self.offset / self.limit).saturating_add(1)
    }
}

/// Result of a paginated query.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total number of items (across all pages).
    pub total: i64,
    /// Current offset.
    pub offset: i64,
    /// Limit used for this query.
    pub limit: i64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        }
    }

    /// Check if there are more items after this page.
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total
    }

    /// 1-based page number.
    pub fn page(&self) -> i64 {
        Pagination::new(self.offset, self.limit).page()
    }

    /// Transform the items, keeping the paging data.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}
