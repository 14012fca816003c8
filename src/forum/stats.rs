//! Forum statistics for Agora.

use super::message_repository::MessageRepository;
use super::thread::Thread;
use super::thread_repository::ThreadRepository;
use super::types::ThreadStatus;
use crate::db::{DbPool, User, UserRepository};
use crate::Result;

/// Number of recent threads on the public stats panel.
pub const RECENT_THREADS_LIMIT: i64 = 5;

/// Number of top posters on the public stats panel.
pub const ACTIVE_USERS_LIMIT: i64 = 5;

/// Window for counting a user as active, in hours.
pub const ACTIVE_WINDOW_HOURS: i64 = 24;

/// Public forum statistics.
#[derive(Debug, Clone)]
pub struct GlobalStats {
    pub user_count: i64,
    pub thread_count: i64,
    pub message_count: i64,
    pub recent_threads: Vec<Thread>,
    pub active_users: Vec<User>,
}

/// A user's own activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserStats {
    pub thread_count: i64,
    pub message_count: i64,
    pub likes_received: i64,
}

/// Moderation dashboard figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_threads: i64,
    pub total_messages: i64,
    pub banned_users: i64,
    /// Users seen within [`ACTIVE_WINDOW_HOURS`].
    pub active_users: i64,
    pub open_threads: i64,
    pub closed_threads: i64,
    pub archived_threads: i64,
}

pub async fn global_stats(pool: &DbPool) -> Result<GlobalStats> {
    let users = UserRepository::new(pool);
    let threads = ThreadRepository::new(pool);
    let messages = MessageRepository::new(pool);

    Ok(GlobalStats {
        user_count: users.count().await?,
        thread_count: threads.count().await?,
        message_count: messages.count().await?,
        recent_threads: threads.recent_public(RECENT_THREADS_LIMIT).await?,
        active_users: users.top_by_messages(ACTIVE_USERS_LIMIT).await?,
    })
}

pub async fn user_stats(pool: &DbPool, user_id: i64) -> Result<UserStats> {
    let messages = MessageRepository::new(pool);

    Ok(UserStats {
        thread_count: ThreadRepository::new(pool).count_by_author(user_id).await?,
        message_count: messages.count_by_author(user_id).await?,
        likes_received: messages.likes_received(user_id).await?,
    })
}

pub async fn admin_stats(pool: &DbPool) -> Result<AdminStats> {
    let users = UserRepository::new(pool);
    let threads = ThreadRepository::new(pool);

    Ok(AdminStats {
        total_users: users.count().await?,
        total_threads: threads.count().await?,
        total_messages: MessageRepository::new(pool).count().await?,
        banned_users: users.count_banned().await?,
        active_users: users.count_active_since(ACTIVE_WINDOW_HOURS).await?,
        open_threads: threads.count_by_status(ThreadStatus::Open).await?,
        closed_threads: threads.count_by_status(ThreadStatus::Closed).await?,
        archived_threads: threads.count_by_status(ThreadStatus::Archived).await?,
    })
}
