//! Forum module for Agora.
//!
//! This module provides the discussion features:
//! - Categories grouping threads
//! - Threads with status (open, closed, archived) and visibility
//! - Messages inside threads, with like/dislike reactions
//! - Search over thread titles, descriptions and tags
//! - Public, per-user and moderation statistics

mod category;
mod category_repository;
mod message;
mod message_repository;
mod reaction_repository;
mod search;
mod service;
mod stats;
mod thread;
mod thread_repository;
mod types;

pub use category::{Category, CategoryUpdate, NewCategory};
pub use category_repository::CategoryRepository;
pub use message::{Message, MessageUpdate, NewMessage};
pub use message_repository::MessageRepository;
pub use reaction_repository::{ReactionRepository, ReactionSummary};
pub use search::search_threads;
pub use service::{
    can_view, ForumService, ThreadView, MAX_BODY_LENGTH, MAX_TITLE_LENGTH, MIN_TITLE_LENGTH,
    THREAD_PREVIEW_MESSAGES,
};
pub use stats::{admin_stats, global_stats, user_stats, AdminStats, GlobalStats, UserStats};
pub use thread::{normalize_tags, NewThread, Thread, ThreadFilter, ThreadUpdate};
pub use thread_repository::ThreadRepository;
pub use types::{
    MessageSort, PaginatedResult, Pagination, ReactionKind, ThreadStatus, Visibility,
    DEFAULT_PER_PAGE, MAX_PER_PAGE,
};
