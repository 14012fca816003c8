//! Response DTOs for the HTTP API.
//!
//! Domain types are converted here so that stored fields such as the
//! password hash never reach a client, and timestamps are sent as RFC3339.

use serde::Serialize;

use crate::datetime::to_rfc3339;
use crate::db::User;
use crate::forum::{
    AdminStats, Category, GlobalStats, Message, PaginatedResult, ReactionSummary, Thread,
    ThreadView, UserStats,
};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        Self {
            data,
            meta: PaginationMeta {
                page,
                per_page,
                total,
            },
        }
    }

    /// Convert a paginated query result, mapping each item.
    pub fn from_result<U>(result: PaginatedResult<U>) -> Self
    where
        T: From<U>,
    {
        let page = result.page();
        let per_page = result.limit;
        let total = result.total;
        Self::new(
            result.items.into_iter().map(T::from).collect(),
            page,
            per_page,
            total,
        )
    }
}

/// Pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Current page number (1-based).
    pub page: i64,
    pub per_page: i64,
    /// Total number of items across all pages.
    pub total: i64,
}

// ============================================================================
// Users and authentication
// ============================================================================

/// Token response for login and registration.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer token (JWT).
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub user: ProfileResponse,
}

/// The full account view, shown to its owner and to admins.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_banned: bool,
    pub thread_count: i64,
    pub message_count: i64,
    pub profile_picture: Option<String>,
    pub biography: Option<String>,
    pub last_connection: Option<String>,
    pub created_at: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.as_str().to_string(),
            is_banned: user.is_banned,
            thread_count: user.thread_count,
            message_count: user.message_count,
            profile_picture: user.profile_picture,
            biography: user.biography,
            last_connection: user.last_connection.as_deref().map(to_rfc3339),
            created_at: to_rfc3339(&user.created_at),
        }
    }
}

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserSummaryResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub thread_count: i64,
    pub message_count: i64,
    pub profile_picture: Option<String>,
}

impl From<User> for UserSummaryResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role.as_str().to_string(),
            thread_count: user.thread_count,
            message_count: user.message_count,
            profile_picture: user.profile_picture,
        }
    }
}

/// Author info embedded in threads and messages.
#[derive(Debug, Serialize)]
pub struct AuthorInfo {
    pub id: i64,
    pub username: String,
}

// ============================================================================
// Forum DTOs
// ============================================================================

/// Category response.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub thread_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            thread_count: category.thread_count,
            created_at: to_rfc3339(&category.created_at),
            updated_at: to_rfc3339(&category.updated_at),
        }
    }
}

/// Thread response.
#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub author: AuthorInfo,
    pub category_id: Option<i64>,
    pub status: String,
    pub visibility: String,
    pub view_count: i64,
    pub message_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Thread> for ThreadResponse {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id,
            title: thread.title,
            description: thread.description,
            tags: thread.tags,
            author: AuthorInfo {
                id: thread.author_id,
                username: thread.author_name,
            },
            category_id: thread.category_id,
            status: thread.status.as_str().to_string(),
            visibility: thread.visibility.as_str().to_string(),
            view_count: thread.view_count,
            message_count: thread.message_count,
            created_at: to_rfc3339(&thread.created_at),
            updated_at: to_rfc3339(&thread.updated_at),
        }
    }
}

/// Thread with its newest messages.
#[derive(Debug, Serialize)]
pub struct ThreadDetailResponse {
    #[serde(flatten)]
    pub thread: ThreadResponse,
    pub messages: Vec<MessageResponse>,
}

impl From<ThreadView> for ThreadDetailResponse {
    fn from(view: ThreadView) -> Self {
        Self {
            thread: view.thread.into(),
            messages: view.messages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: i64,
    pub thread_id: i64,
    pub author: AuthorInfo,
    pub content: String,
    pub image_url: Option<String>,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            thread_id: message.thread_id,
            author: AuthorInfo {
                id: message.author_id,
                username: message.author_name,
            },
            content: message.content,
            image_url: message.image_url,
            likes: message.likes,
            dislikes: message.dislikes,
            created_at: to_rfc3339(&message.created_at),
            updated_at: to_rfc3339(&message.updated_at),
        }
    }
}

/// Reaction counts after a like, dislike or removal.
#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub message_id: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub user_reaction: Option<String>,
}

impl From<ReactionSummary> for ReactionResponse {
    fn from(summary: ReactionSummary) -> Self {
        Self {
            message_id: summary.message_id,
            likes: summary.likes,
            dislikes: summary.dislikes,
            user_reaction: summary.user_reaction.map(|k| k.as_str().to_string()),
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Public forum statistics.
#[derive(Debug, Serialize)]
pub struct GlobalStatsResponse {
    pub user_count: i64,
    pub thread_count: i64,
    pub message_count: i64,
    pub recent_threads: Vec<ThreadResponse>,
    pub active_users: Vec<UserSummaryResponse>,
}

impl From<GlobalStats> for GlobalStatsResponse {
    fn from(stats: GlobalStats) -> Self {
        Self {
            user_count: stats.user_count,
            thread_count: stats.thread_count,
            message_count: stats.message_count,
            recent_threads: stats.recent_threads.into_iter().map(Into::into).collect(),
            active_users: stats.active_users.into_iter().map(Into::into).collect(),
        }
    }
}

/// Statistics for the current user.
#[derive(Debug, Serialize)]
pub struct UserStatsResponse {
    pub thread_count: i64,
    pub message_count: i64,
    pub likes_received: i64,
}

impl From<UserStats> for UserStatsResponse {
    fn from(stats: UserStats) -> Self {
        Self {
            thread_count: stats.thread_count,
            message_count: stats.message_count,
            likes_received: stats.likes_received,
        }
    }
}

/// Moderation dashboard statistics.
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub total_users: i64,
    pub total_threads: i64,
    pub total_messages: i64,
    pub banned_users: i64,
    pub active_users: i64,
    pub open_threads: i64,
    pub closed_threads: i64,
    pub archived_threads: i64,
}

impl From<AdminStats> for AdminStatsResponse {
    fn from(stats: AdminStats) -> Self {
        Self {
            total_users: stats.total_users,
            total_threads: stats.total_threads,
            total_messages: stats.total_messages,
            banned_users: stats.banned_users,
            active_users: stats.active_users,
            open_threads: stats.open_threads,
            closed_threads: stats.closed_threads,
            archived_threads: stats.archived_threads,
        }
    }
}
