//! Forum service for Agora.
//!
//! This module provides high-level operations for categories, threads,
//! messages and reactions with built-in permission checking, visibility
//! rules and pagination support.

use tracing::info;

use super::category::{Category, CategoryUpdate, NewCategory};
use super::category_repository::CategoryRepository;
use super::message::{Message, MessageUpdate, NewMessage};
use super::message_repository::MessageRepository;
use super::reaction_repository::{ReactionRepository, ReactionSummary};
use super::search::search_threads;
use super::stats::{self, AdminStats, GlobalStats, UserStats};
use super::thread::{NewThread, Thread, ThreadFilter, ThreadUpdate};
use super::thread_repository::ThreadRepository;
use super::types::{
    MessageSort, PaginatedResult, Pagination, ReactionKind, ThreadStatus, Visibility,
};
use crate::auth::validation::validate_picture_url;
use crate::auth::{can_modify_resource, require_admin, require_user};
use crate::db::{Database, User, UserRepository};
use crate::{AgoraError, Result};

/// Minimum length for thread titles (in characters).
pub const MIN_TITLE_LENGTH: usize = 3;

/// Maximum length for thread titles (in characters).
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length for thread descriptions and message content.
pub const MAX_BODY_LENGTH: usize = 10_000;

/// Maximum length for category names.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// Messages shown with a thread.
pub const THREAD_PREVIEW_MESSAGES: i64 = 10;

fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AgoraError::Validation("Title is required".to_string()));
    }
    let count = trimmed.chars().count();
    if !(MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&count) {
        return Err(AgoraError::Validation(format!(
            "Title must be between {MIN_TITLE_LENGTH} and {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_body(body: &str, field: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(AgoraError::Validation(format!("{field} is required")));
    }
    if body.chars().count() > MAX_BODY_LENGTH {
        return Err(AgoraError::Validation(format!(
            "{field} must be at most {MAX_BODY_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_category_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AgoraError::Validation(
            "Category name is required".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(AgoraError::Validation(format!(
            "Category name must be at most {MAX_CATEGORY_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_image_url(url: &str) -> Result<()> {
    validate_picture_url(url).map_err(|e| AgoraError::Validation(e.to_string()))
}

/// Whether `viewer` may see `thread`.
///
/// Private threads are visible to their author and to administrators.
pub fn can_view(viewer: Option<&User>, thread: &Thread) -> bool {
    match thread.visibility {
        Visibility::Public => true,
        Visibility::Private => {
            viewer.is_some_and(|user| user.id == thread.author_id || user.is_admin())
        }
    }
}

/// A thread together with its most recent messages.
#[derive(Debug, Clone)]
pub struct ThreadView {
    pub thread: Thread,
    /// Newest first.
    pub messages: Vec<Message>,
}

/// Service for forum operations with permission checking.
pub struct ForumService<'a> {
    db: &'a Database,
}

impl<'a> ForumService<'a> {
    /// Create a new ForumService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // ========== Categories ==========

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        CategoryRepository::new(self.db.pool()).list().await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category> {
        CategoryRepository::new(self.db.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| AgoraError::NotFound("category".to_string()))
    }

    /// Create a category (admin only).
    pub async fn create_category(
        &self,
        actor: &User,
        name: &str,
        description: &str,
    ) -> Result<Category> {
        require_admin(Some(actor))?;
        validate_category_name(name)?;

        let category = CategoryRepository::new(self.db.pool())
            .create(&NewCategory::new(name.trim()).with_description(description.trim()))
            .await?;

        info!(category_id = category.id, admin_id = actor.id, "Category created");
        Ok(category)
    }

    /// Update a category (admin only).
    pub async fn update_category(
        &self,
        actor: &User,
        id: i64,
        update: CategoryUpdate,
    ) -> Result<Category> {
        require_admin(Some(actor))?;
        let mut update = update;
        if let Some(ref name) = update.name {
            validate_category_name(name)?;
            update.name = Some(name.trim().to_string());
        }

        CategoryRepository::new(self.db.pool())
            .update(id, &update)
            .await?
            .ok_or_else(|| AgoraError::NotFound("category".to_string()))
    }

    /// Delete a category and its threads (admin only).
    pub async fn delete_category(&self, actor: &User, id: i64) -> Result<()> {
        require_admin(Some(actor))?;
        if !CategoryRepository::new(self.db.pool()).delete(id).await? {
            return Err(AgoraError::NotFound("category".to_string()));
        }
        info!(category_id = id, admin_id = actor.id, "Category deleted");
        Ok(())
    }

    // ========== Threads ==========

    /// List threads visible to `viewer`.
    ///
    /// A non-admin asking for private threads only sees their own.
    pub async fn list_threads(
        &self,
        viewer: Option<&User>,
        filter: ThreadFilter,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Thread>> {
        let mut filter = filter;
        if filter.visibility != Some(Visibility::Public) {
            match viewer {
                Some(user) if user.is_admin() => {}
                Some(user) => {
                    if filter.visibility.is_none() {
                        filter.visibility = Some(Visibility::Public);
                    } else {
                        filter.author_id = Some(user.id);
                    }
                }
                None => {
                    if filter.visibility.is_none() {
                        filter.visibility = Some(Visibility::Public);
                    } else {
                        return Ok(PaginatedResult::new(Vec::new(), 0, pagination));
                    }
                }
            }
        }

        ThreadRepository::new(self.db.pool())
            .list(&filter, pagination)
            .await
    }

    /// Every thread, any status or visibility (admin only).
    pub async fn admin_list_threads(
        &self,
        actor: &User,
        filter: ThreadFilter,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Thread>> {
        require_admin(Some(actor))?;
        ThreadRepository::new(self.db.pool())
            .list(&filter, pagination)
            .await
    }

    /// The actor's own threads, any status or visibility.
    pub async fn list_user_threads(
        &self,
        actor: &User,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Thread>> {
        require_user(Some(actor))?;
        ThreadRepository::new(self.db.pool())
            .list_by_author(actor.id, pagination)
            .await
    }

    /// Get a thread, hiding private threads from other users.
    pub async fn get_thread(&self, viewer: Option<&User>, id: i64) -> Result<Thread> {
        let thread = ThreadRepository::new(self.db.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| AgoraError::NotFound("thread".to_string()))?;

        if !can_view(viewer, &thread) {
            return Err(AgoraError::NotFound("thread".to_string()));
        }

        Ok(thread)
    }

    /// Open a thread: record the view and load the newest messages.
    pub async fn view_thread(&self, viewer: Option<&User>, id: i64) -> Result<ThreadView> {
        let mut thread = self.get_thread(viewer, id).await?;

        ThreadRepository::new(self.db.pool())
            .increment_view_count(id)
            .await?;
        thread.view_count += 1;

        let messages = MessageRepository::new(self.db.pool())
            .list_by_thread(
                id,
                MessageSort::Newest,
                Pagination::first(THREAD_PREVIEW_MESSAGES),
            )
            .await?
            .items;

        Ok(ThreadView { thread, messages })
    }

    /// Create a thread authored by `actor`.
    ///
    /// The author in `new_thread` is replaced by the actor.
    pub async fn create_thread(&self, actor: &User, new_thread: NewThread) -> Result<Thread> {
        require_user(Some(actor))?;
        validate_title(&new_thread.title)?;
        validate_body(&new_thread.description, "Description")?;

        if let Some(category_id) = new_thread.category_id {
            self.get_category(category_id).await?;
        }

        let new_thread = NewThread {
            title: new_thread.title.trim().to_string(),
            author_id: actor.id,
            ..new_thread
        };

        let thread = ThreadRepository::new(self.db.pool())
            .create(&new_thread)
            .await?;

        info!(thread_id = thread.id, user_id = actor.id, "Thread created");
        Ok(thread)
    }

    /// Edit a thread (author or admin).
    pub async fn update_thread(
        &self,
        actor: &User,
        id: i64,
        update: ThreadUpdate,
    ) -> Result<Thread> {
        let thread = self.get_thread(Some(actor), id).await?;
        can_modify_resource(Some(actor), thread.author_id)?;

        let mut update = update;
        if let Some(ref title) = update.title {
            validate_title(title)?;
            update.title = Some(title.trim().to_string());
        }
        if let Some(ref description) = update.description {
            validate_body(description, "Description")?;
        }
        if let Some(Some(category_id)) = update.category_id {
            self.get_category(category_id).await?;
        }

        ThreadRepository::new(self.db.pool())
            .update(id, &update)
            .await?
            .ok_or_else(|| AgoraError::NotFound("thread".to_string()))
    }

    /// Delete a thread and its messages (author or admin).
    pub async fn delete_thread(&self, actor: &User, id: i64) -> Result<()> {
        let thread = self.get_thread(Some(actor), id).await?;
        can_modify_resource(Some(actor), thread.author_id)?;

        ThreadRepository::new(self.db.pool()).delete(id).await?;
        info!(thread_id = id, user_id = actor.id, "Thread deleted");
        Ok(())
    }

    /// Change a thread's status and/or visibility (admin only).
    pub async fn moderate_thread(
        &self,
        actor: &User,
        id: i64,
        status: Option<ThreadStatus>,
        visibility: Option<Visibility>,
    ) -> Result<Thread> {
        require_admin(Some(actor))?;

        let update = ThreadUpdate {
            status,
            visibility,
            ..ThreadUpdate::default()
        };
        if update.is_empty() {
            return Err(AgoraError::Validation(
                "Nothing to update".to_string(),
            ));
        }

        let thread = ThreadRepository::new(self.db.pool())
            .update(id, &update)
            .await?
            .ok_or_else(|| AgoraError::NotFound("thread".to_string()))?;

        info!(
            thread_id = id,
            admin_id = actor.id,
            status = %thread.status,
            visibility = %thread.visibility,
            "Thread moderated"
        );
        Ok(thread)
    }

    // ========== Messages ==========

    /// List messages of a thread visible to `viewer`.
    pub async fn list_messages(
        &self,
        viewer: Option<&User>,
        thread_id: i64,
        sort: MessageSort,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Message>> {
        self.get_thread(viewer, thread_id).await?;
        MessageRepository::new(self.db.pool())
            .list_by_thread(thread_id, sort, pagination)
            .await
    }

    /// The actor's own messages, newest first.
    pub async fn list_user_messages(
        &self,
        actor: &User,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Message>> {
        require_user(Some(actor))?;
        MessageRepository::new(self.db.pool())
            .list_by_author(actor.id, pagination)
            .await
    }

    pub async fn get_message(&self, viewer: Option<&User>, id: i64) -> Result<Message> {
        let message = MessageRepository::new(self.db.pool())
            .get_by_id(id)
            .await?
            .ok_or_else(|| AgoraError::NotFound("message".to_string()))?;

        // A message is as visible as its thread.
        self.get_thread(viewer, message.thread_id)
            .await
            .map_err(|e| match e {
                AgoraError::NotFound(_) => AgoraError::NotFound("message".to_string()),
                other => other,
            })?;

        Ok(message)
    }

    /// Post a message in an open thread.
    pub async fn post_message(
        &self,
        actor: &User,
        thread_id: i64,
        content: &str,
        image_url: Option<String>,
    ) -> Result<Message> {
        require_user(Some(actor))?;
        let thread = self.get_thread(Some(actor), thread_id).await?;
        if !thread.status.accepts_messages() {
            return Err(AgoraError::Validation("Thread is not open".to_string()));
        }

        validate_body(content, "Content")?;
        let image_url = image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        if let Some(ref url) = image_url {
            validate_image_url(url)?;
        }

        let mut new_message = NewMessage::new(thread_id, actor.id, content.trim());
        new_message.image_url = image_url;

        let message = MessageRepository::new(self.db.pool())
            .create(&new_message)
            .await?;

        info!(
            message_id = message.id,
            thread_id = thread_id,
            user_id = actor.id,
            "Message posted"
        );
        Ok(message)
    }

    /// Edit a message (author or admin).
    pub async fn update_message(
        &self,
        actor: &User,
        id: i64,
        update: MessageUpdate,
    ) -> Result<Message> {
        let message = self.get_message(Some(actor), id).await?;
        can_modify_resource(Some(actor), message.author_id)?;

        let mut update = update;
        if let Some(ref content) = update.content {
            validate_body(content, "Content")?;
            update.content = Some(content.trim().to_string());
        }
        if let Some(Some(ref url)) = update.image_url {
            if url.trim().is_empty() {
                update.image_url = Some(None);
            } else {
                validate_image_url(url)?;
            }
        }

        MessageRepository::new(self.db.pool())
            .update(id, &update)
            .await?
            .ok_or_else(|| AgoraError::NotFound("message".to_string()))
    }

    /// Delete a message (author or admin).
    pub async fn delete_message(&self, actor: &User, id: i64) -> Result<()> {
        let message = self.get_message(Some(actor), id).await?;
        can_modify_resource(Some(actor), message.author_id)?;

        MessageRepository::new(self.db.pool()).delete(id).await?;
        info!(message_id = id, user_id = actor.id, "Message deleted");
        Ok(())
    }

    // ========== Reactions ==========

    pub async fn react(
        &self,
        actor: &User,
        message_id: i64,
        kind: ReactionKind,
    ) -> Result<ReactionSummary> {
        require_user(Some(actor))?;
        self.get_message(Some(actor), message_id).await?;
        ReactionRepository::new(self.db.pool())
            .react(message_id, actor.id, kind)
            .await
    }

    pub async fn remove_reaction(&self, actor: &User, message_id: i64) -> Result<ReactionSummary> {
        require_user(Some(actor))?;
        self.get_message(Some(actor), message_id).await?;
        ReactionRepository::new(self.db.pool())
            .remove(message_id, actor.id)
            .await
    }

    // ========== Search and statistics ==========

    pub async fn search(&self, query: &str, pagination: Pagination) -> Result<PaginatedResult<Thread>> {
        search_threads(self.db.pool(), query, pagination).await
    }

    pub async fn global_stats(&self) -> Result<GlobalStats> {
        stats::global_stats(self.db.pool()).await
    }

    pub async fn user_stats(&self, actor: &User) -> Result<UserStats> {
        require_user(Some(actor))?;
        stats::user_stats(self.db.pool(), actor.id).await
    }

    pub async fn admin_stats(&self, actor: &User) -> Result<AdminStats> {
        require_admin(Some(actor))?;
        stats::admin_stats(self.db.pool()).await
    }

    // ========== User moderation ==========

    /// Paginated user list (admin only).
    pub async fn list_users(
        &self,
        actor: &User,
        pagination: Pagination,
    ) -> Result<PaginatedResult<User>> {
        require_admin(Some(actor))?;
        let (items, total) = UserRepository::new(self.db.pool())
            .list_paginated(pagination.offset, pagination.limit)
            .await?;
        Ok(PaginatedResult::new(items, total, pagination))
    }

    /// Ban or unban a user (admin only). Admins cannot ban themselves.
    pub async fn set_user_banned(&self, actor: &User, user_id: i64, banned: bool) -> Result<User> {
        require_admin(Some(actor))?;
        if banned && actor.id == user_id {
            return Err(AgoraError::Validation(
                "You cannot ban yourself".to_string(),
            ));
        }

        let repo = UserRepository::new(self.db.pool());
        if !repo.set_banned(user_id, banned).await? {
            return Err(AgoraError::NotFound("user".to_string()));
        }

        info!(user_id = user_id, admin_id = actor.id, banned = banned, "User ban updated");
        repo.get_by_id(user_id)
            .await?
            .ok_or_else(|| AgoraError::NotFound("user".to_string()))
    }
}
