//! Reaction repository for Agora.
//!
//! Each user holds at most one reaction per message. The `likes` and
//! `dislikes` columns on `messages` are recomputed from
//! `message_reactions` after every change.

use sqlx::{Sqlite, Transaction};

use super::types::ReactionKind;
use crate::db::{begin_write, DbPool};
use crate::{AgoraError, Result};

/// Reaction totals of a message, from one user's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionSummary {
    pub message_id: i64,
    pub likes: i64,
    pub dislikes: i64,
    /// The viewing user's reaction, if any.
    pub user_reaction: Option<ReactionKind>,
}

/// Repository for likes and dislikes.
pub struct ReactionRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ReactionRepository<'a> {
    /// Create a new ReactionRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Record `user_id`'s reaction to a message.
    ///
    /// Repeating the same reaction is a validation error; the opposite
    /// reaction replaces the previous one.
    pub async fn react(
        &self,
        message_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> Result<ReactionSummary> {
        let mut tx = begin_write(self.pool).await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM messages WHERE id = ?)")
            .bind(message_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        if !exists {
            return Err(AgoraError::NotFound("message".to_string()));
        }

        let current: Option<String> = sqlx::query_scalar(
            "SELECT reaction_type FROM message_reactions WHERE message_id = ? AND user_id = ?",
        )
        .bind(message_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        match current.and_then(|c| c.parse::<ReactionKind>().ok()) {
            Some(existing) if existing == kind => {
                return Err(AgoraError::Validation(format!(
                    "You have already {} this message",
                    kind.past_tense()
                )));
            }
            Some(_) => {
                sqlx::query(
                    "UPDATE message_reactions SET reaction_type = ?, created_at = datetime('now')
                     WHERE message_id = ? AND user_id = ?",
                )
                .bind(kind.as_str())
                .bind(message_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AgoraError::Database(e.to_string()))?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO message_reactions (message_id, user_id, reaction_type)
                     VALUES (?, ?, ?)",
                )
                .bind(message_id)
                .bind(user_id)
                .bind(kind.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| AgoraError::Database(e.to_string()))?;
            }
        }

        let summary = Self::recompute(&mut tx, message_id, Some(kind)).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// Withdraw `user_id`'s reaction to a message.
    ///
    /// Returns `NotFound` if the user had not reacted.
    pub async fn remove(&self, message_id: i64, user_id: i64) -> Result<ReactionSummary> {
        let mut tx = begin_write(self.pool).await?;

        let result =
            sqlx::query("DELETE FROM message_reactions WHERE message_id = ? AND user_id = ?")
                .bind(message_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AgoraError::Database(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(AgoraError::NotFound("reaction".to_string()));
        }

        let summary = Self::recompute(&mut tx, message_id, None).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// The reaction `user_id` holds on a message, if any.
    pub async fn get_user_reaction(
        &self,
        message_id: i64,
        user_id: i64,
    ) -> Result<Option<ReactionKind>> {
        let current: Option<String> = sqlx::query_scalar(
            "SELECT reaction_type FROM message_reactions WHERE message_id = ? AND user_id = ?",
        )
        .bind(message_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(current.and_then(|c| c.parse().ok()))
    }

    async fn recompute(
        tx: &mut Transaction<'_, Sqlite>,
        message_id: i64,
        user_reaction: Option<ReactionKind>,
    ) -> Result<ReactionSummary> {
        let (likes, dislikes): (i64, i64) = sqlx::query_as(
            "UPDATE messages SET
                 likes = (SELECT COUNT(*) FROM message_reactions
                          WHERE message_id = ?1 AND reaction_type = 'like'),
                 dislikes = (SELECT COUNT(*) FROM message_reactions
                             WHERE message_id = ?1 AND reaction_type = 'dislike')
             WHERE id = ?1
             RETURNING likes, dislikes",
        )
        .bind(message_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(ReactionSummary {
            message_id,
            likes,
            dislikes,
            user_reaction,
        })
    }
}
