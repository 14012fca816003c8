//! Category repository for Agora.
//!
//! This module provides CRUD operations for categories in the database.

use sqlx::QueryBuilder;

use super::category::{Category, CategoryUpdate, NewCategory};
use crate::db::{begin_write, map_write_error, DbPool};
use crate::{AgoraError, Result};

const CATEGORY_SELECT: &str = "SELECT c.id, c.name, c.description, \
     (SELECT COUNT(*) FROM threads t WHERE t.category_id = c.id) AS thread_count, \
     c.created_at, c.updated_at FROM categories c";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: String,
    thread_count: i64,
    created_at: String,
    updated_at: String,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            description: self.description,
            thread_count: self.thread_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for category CRUD operations.
pub struct CategoryRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new CategoryRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new category.
    ///
    /// Returns `Conflict` if the name is already taken.
    pub async fn create(&self, new_category: &NewCategory) -> Result<Category> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, description) VALUES (?, ?) RETURNING id",
        )
        .bind(&new_category.name)
        .bind(&new_category.description)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "category"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AgoraError::NotFound("category".to_string()))
    }

    /// Get a category by ID, with its thread count.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let row =
            sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.id = ?"))
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(row.map(|r| r.into_category()))
    }

    /// List all categories ordered by name.
    pub async fn list(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "{CATEGORY_SELECT} ORDER BY c.name COLLATE NOCASE ASC, c.id ASC"
        ))
        .fetch_all(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| r.into_category()).collect())
    }

    /// Update a category by ID.
    ///
    /// Returns the updated category, or None if not found.
    pub async fn update(&self, id: i64, update: &CategoryUpdate) -> Result<Option<Category>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE categories SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ").push_bind_unseparated(name);
        }
        if let Some(ref description) = update.description {
            separated
                .push("description = ")
                .push_bind_unseparated(description);
        }
        separated.push("updated_at = datetime('now')");

        query.push(" WHERE id = ").push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| map_write_error(e, "category"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a category by ID.
    ///
    /// Threads in the category, and their messages, are removed with it.
    /// Authors' thread and message counts are adjusted in the same
    /// transaction.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = begin_write(self.pool).await?;

        sqlx::query(
            "UPDATE users SET message_count = MAX(0, message_count -
                 (SELECT COUNT(*) FROM messages m JOIN threads t ON t.id = m.thread_id
                  WHERE t.category_id = ?1 AND m.author_id = users.id))
             WHERE id IN (SELECT m.author_id FROM messages m JOIN threads t ON t.id = m.thread_id
                          WHERE t.category_id = ?1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        sqlx::query(
            "UPDATE users SET thread_count = MAX(0, thread_count -
                 (SELECT COUNT(*) FROM threads t WHERE t.category_id = ?1 AND t.author_id = users.id))
             WHERE id IN (SELECT author_id FROM threads WHERE category_id = ?1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all categories.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }
}
