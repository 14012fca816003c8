//! Message repository for Agora.
//!
//! This module provides CRUD operations for messages in the database.
//! Creating and deleting a message keep the thread and author counters
//! in step within the same transaction.

use sqlx::QueryBuilder;

use super::message::{Message, MessageUpdate, NewMessage};
use super::thread_repository::adjust_message_count;
use super::types::{MessageSort, PaginatedResult, Pagination};
use crate::db::{begin_write, DbPool};
use crate::{AgoraError, Result};

const MESSAGE_SELECT: &str = "SELECT m.id, m.thread_id, m.author_id, u.username AS author_name, \
     m.content, m.image_url, m.likes, m.dislikes, m.created_at, m.updated_at \
     FROM messages m JOIN users u ON u.id = m.author_id";

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    thread_id: i64,
    author_id: i64,
    author_name: String,
    content: String,
    image_url: Option<String>,
    likes: i64,
    dislikes: i64,
    created_at: String,
    updated_at: String,
}

impl MessageRow {
    fn into_message(self) -> Message {
        Message {
            id: self.id,
            thread_id: self.thread_id,
            author_id: self.author_id,
            author_name: self.author_name,
            content: self.content,
            image_url: self.image_url,
            likes: self.likes,
            dislikes: self.dislikes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for message CRUD operations.
pub struct MessageRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new MessageRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Post a message.
    ///
    /// The insert and both counter updates commit together.
    pub async fn create(&self, new_message: &NewMessage) -> Result<Message> {
        let mut tx = begin_write(self.pool).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO messages (thread_id, author_id, content, image_url)
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(new_message.thread_id)
        .bind(new_message.author_id)
        .bind(&new_message.content)
        .bind(&new_message.image_url)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        adjust_message_count(&mut *tx, new_message.thread_id, 1).await?;

        sqlx::query("UPDATE users SET message_count = message_count + 1 WHERE id = ?")
            .bind(new_message.author_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AgoraError::NotFound("message".to_string()))
    }

    /// Get a message by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Message>> {
        let row = sqlx::query_as::<_, MessageRow>(&format!("{MESSAGE_SELECT} WHERE m.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(row.map(MessageRow::into_message))
    }

    /// List the messages of a thread in the requested order.
    pub async fn list_by_thread(
        &self,
        thread_id: i64,
        sort: MessageSort,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Message>> {
        let total = self.count_by_thread(thread_id).await?;

        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "{MESSAGE_SELECT} WHERE m.thread_id = ? ORDER BY {} LIMIT ? OFFSET ?",
            sort.order_clause()
        ))
        .bind(thread_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(PaginatedResult::new(
            rows.into_iter().map(MessageRow::into_message).collect(),
            total,
            pagination,
        ))
    }

    /// List a user's messages, newest first.
    pub async fn list_by_author(
        &self,
        author_id: i64,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Message>> {
        let total = self.count_by_author(author_id).await?;

        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "{MESSAGE_SELECT} WHERE m.author_id = ?
             ORDER BY m.created_at DESC, m.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(author_id)
        .bind(pagination.limit)
        .bind(pagination.offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(PaginatedResult::new(
            rows.into_iter().map(MessageRow::into_message).collect(),
            total,
            pagination,
        ))
    }

    /// Update a message by ID.
    ///
    /// Returns the updated message, or None if not found.
    pub async fn update(&self, id: i64, update: &MessageUpdate) -> Result<Option<Message>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE messages SET ");
        let mut separated = query.separated(", ");

        if let Some(ref content) = update.content {
            separated.push("content = ");
            separated.push_bind_unseparated(content);
        }
        if let Some(ref image_url) = update.image_url {
            separated.push("image_url = ");
            separated.push_bind_unseparated(image_url.clone());
        }
        separated.push("updated_at = datetime('now')");

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a message by ID, decrementing the thread and author counters.
    ///
    /// Returns true if a message was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = begin_write(self.pool).await?;

        let owner: Option<(i64, i64)> =
            sqlx::query_as("SELECT thread_id, author_id FROM messages WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AgoraError::Database(e.to_string()))?;
        let Some((thread_id, author_id)) = owner else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        adjust_message_count(&mut *tx, thread_id, -1).await?;

        sqlx::query("UPDATE users SET message_count = MAX(0, message_count - 1) WHERE id = ?")
            .bind(author_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        tx.commit().await?;
        Ok(true)
    }

    /// Count all messages.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count messages in a thread.
    pub async fn count_by_thread(&self, thread_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE thread_id = ?")
            .bind(thread_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count messages written by a user.
    pub async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Total likes on all of a user's messages.
    pub async fn likes_received(&self, user_id: i64) -> Result<i64> {
        let likes: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(likes), 0) FROM messages WHERE author_id = ?")
                .bind(user_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(likes)
    }
}
