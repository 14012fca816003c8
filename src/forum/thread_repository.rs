//! Thread repository for Agora.
//!
//! This module provides CRUD operations for threads in the database.

use sqlx::{QueryBuilder, Sqlite};

use super::thread::{join_tags, split_tags, NewThread, Thread, ThreadFilter, ThreadUpdate};
use super::types::{PaginatedResult, Pagination, ThreadStatus};
use crate::db::{begin_write, DbPool};
use crate::{AgoraError, Result};

pub(super) const THREAD_SELECT: &str = "SELECT t.id, t.title, t.description, t.tags, \
     t.author_id, u.username AS author_name, t.category_id, t.status, t.visibility, \
     t.view_count, t.message_count, t.created_at, t.updated_at \
     FROM threads t JOIN users u ON u.id = t.author_id";

#[derive(sqlx::FromRow)]
pub(super) struct ThreadRow {
    id: i64,
    title: String,
    description: String,
    tags: String,
    author_id: i64,
    author_name: String,
    category_id: Option<i64>,
    status: String,
    visibility: String,
    view_count: i64,
    message_count: i64,
    created_at: String,
    updated_at: String,
}

impl ThreadRow {
    pub(super) fn into_thread(self) -> Thread {
        Thread {
            id: self.id,
            title: self.title,
            description: self.description,
            tags: split_tags(&self.tags),
            author_id: self.author_id,
            author_name: self.author_name,
            category_id: self.category_id,
            status: self.status.parse().unwrap_or_default(),
            visibility: self.visibility.parse().unwrap_or_default(),
            view_count: self.view_count,
            message_count: self.message_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &ThreadFilter) {
    query.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        query.push(" AND t.status = ").push_bind(status.as_str());
    }
    if let Some(visibility) = filter.visibility {
        query.push(" AND t.visibility = ").push_bind(visibility.as_str());
    }
    if let Some(category_id) = filter.category_id {
        query.push(" AND t.category_id = ").push_bind(category_id);
    }
    if let Some(author_id) = filter.author_id {
        query.push(" AND t.author_id = ").push_bind(author_id);
    }
}

/// Add `delta` to a thread's message count and touch it.
///
/// Takes any executor so message writes can call it inside their transaction.
pub(crate) async fn adjust_message_count<'e, E>(executor: E, thread_id: i64, delta: i64) -> Result<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE threads SET message_count = MAX(0, message_count + ?),
             updated_at = datetime('now')
         WHERE id = ?",
    )
    .bind(delta)
    .bind(thread_id)
    .execute(executor)
    .await
    .map_err(|e| AgoraError::Database(e.to_string()))?;
    Ok(())
}

/// Repository for thread CRUD operations.
pub struct ThreadRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ThreadRepository<'a> {
    /// Create a new ThreadRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new thread and bump the author's thread count.
    ///
    /// Returns the created thread with the assigned ID.
    pub async fn create(&self, new_thread: &NewThread) -> Result<Thread> {
        let mut tx = begin_write(self.pool).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO threads (title, description, tags, author_id, category_id, visibility)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new_thread.title)
        .bind(&new_thread.description)
        .bind(join_tags(&new_thread.tags))
        .bind(new_thread.author_id)
        .bind(new_thread.category_id)
        .bind(new_thread.visibility.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        sqlx::query("UPDATE users SET thread_count = thread_count + 1 WHERE id = ?")
            .bind(new_thread.author_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AgoraError::NotFound("thread".to_string()))
    }

    /// Get a thread by ID, with the author's username.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Thread>> {
        let row = sqlx::query_as::<_, ThreadRow>(&format!("{THREAD_SELECT} WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(row.map(ThreadRow::into_thread))
    }

    /// List threads matching `filter`, newest first.
    pub async fn list(
        &self,
        filter: &ThreadFilter,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Thread>> {
        let mut count_query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM threads t");
        push_filter(&mut count_query, filter);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(THREAD_SELECT);
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset);

        let rows = query
            .build_query_as::<ThreadRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(PaginatedResult::new(
            rows.into_iter().map(ThreadRow::into_thread).collect(),
            total,
            pagination,
        ))
    }

    /// List every thread by an author, whatever its status or visibility.
    pub async fn list_by_author(
        &self,
        author_id: i64,
        pagination: Pagination,
    ) -> Result<PaginatedResult<Thread>> {
        self.list(&ThreadFilter::any().author(author_id), pagination)
            .await
    }

    /// Most recent open, public threads.
    pub async fn recent_public(&self, limit: i64) -> Result<Vec<Thread>> {
        let result = self
            .list(&ThreadFilter::default(), Pagination::first(limit))
            .await?;
        Ok(result.items)
    }

    /// Update a thread by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated thread, or None if not found.
    pub async fn update(&self, id: i64, update: &ThreadUpdate) -> Result<Option<Thread>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE threads SET ");
        let mut separated = query.separated(", ");

        if let Some(ref title) = update.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }
        if let Some(ref description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }
        if let Some(ref tags) = update.tags {
            separated.push("tags = ");
            separated.push_bind_unseparated(join_tags(tags));
        }
        if let Some(category_id) = update.category_id {
            separated.push("category_id = ");
            separated.push_bind_unseparated(category_id);
        }
        if let Some(status) = update.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status.as_str());
        }
        if let Some(visibility) = update.visibility {
            separated.push("visibility = ");
            separated.push_bind_unseparated(visibility.as_str());
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

    /// Delete a thread by ID.
    ///
    /// Messages and their reactions cascade. The author's thread count and
    /// each message author's message count are adjusted.
    /// Returns true if a thread was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = begin_write(self.pool).await?;

        let author_id: Option<i64> =
            sqlx::query_scalar("SELECT author_id FROM threads WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AgoraError::Database(e.to_string()))?;
        let Some(author_id) = author_id else {
            return Ok(false);
        };

        sqlx::query(
            "UPDATE users SET message_count = MAX(0, message_count -
                 (SELECT COUNT(*) FROM messages m WHERE m.thread_id = ?1 AND m.author_id = users.id))
             WHERE id IN (SELECT author_id FROM messages WHERE thread_id = ?1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        sqlx::query("UPDATE users SET thread_count = MAX(0, thread_count - 1) WHERE id = ?")
            .bind(author_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        tx.commit().await?;
        Ok(true)
    }

    /// Record one view of a thread.
    pub async fn increment_view_count(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE threads SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(())
    }

    /// Add one to a thread's message count.
    pub async fn increment_message_count(&self, id: i64) -> Result<()> {
        adjust_message_count(self.pool, id, 1).await
    }

    /// Count all threads.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM threads")
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count threads with the given status.
    pub async fn count_by_status(&self, status: ThreadStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM threads WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count threads by an author.
    pub async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM threads WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::forum::{CategoryRepository, NewCategory, Visibility};
    use crate::Database;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("author", "author@example.com", "hash"))
            .await
            .unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn test_create_thread() {
        let (db, author_id) = setup().await;
        let repo = ThreadRepository::new(db.pool());

        let thread = repo
            .create(&NewThread::new("Hello", "First post", author_id).with_tags(["rust", "intro"]))
            .await
            .unwrap();

        assert_eq!(thread.title, "Hello");
        assert_eq!(thread.author_name, "author");
        assert_eq!(thread.tags, vec!["rust", "intro"]);
        assert_eq!(thread.status, ThreadStatus::Open);
        assert_eq!(thread.visibility, Visibility::Public);
        assert_eq!(thread.view_count, 0);

        let user = UserRepository::new(db.pool())
            .get_by_id(author_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.thread_count, 1);
    }

    #[tokio::test]
    async fn test_list_default_filter() {
        let (db, author_id) = setup().await;
        let repo = ThreadRepository::new(db.pool());

        let open = repo
            .create(&NewThread::new("Open", "d", author_id))
            .await
            .unwrap();
        let closed = repo
            .create(&NewThread::new("Closed", "d", author_id))
            .await
            .unwrap();
        repo.update(closed.id, &ThreadUpdate::new().status(ThreadStatus::Closed))
            .await
            .unwrap();
        repo.create(&NewThread::new("Private", "d", author_id).with_visibility(Visibility::Private))
            .await
            .unwrap();

        let result = repo
            .list(&ThreadFilter::default(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].id, open.id);

        let all = repo
            .list(&ThreadFilter::any(), Pagination::default())
            .await
            .unwrap();
        assert_eq!(all.total, 3);
        // Newest first
        assert_eq!(all.items[0].title, "Private");

        let closed_only = repo
            .list(
                &ThreadFilter::default().status(Some(ThreadStatus::Closed)),
                Pagination::default(),
            )
            .await
            .unwrap();
        assert_eq!(closed_only.items.len(), 1);
        assert_eq!(closed_only.items[0].id, closed.id);
    }

    #[tokio::test]
    async fn test_list_pagination_and_category() {
        let (db, author_id) = setup().await;
        let repo = ThreadRepository::new(db.pool());
        let category = CategoryRepository::new(db.pool())
            .create(&NewCategory::new("General"))
            .await
            .unwrap();

        for i in 0..5 {
            let mut new_thread = NewThread::new(format!("Thread {i}"), "d", author_id);
            if i % 2 == 0 {
                new_thread = new_thread.with_category(category.id);
            }
            repo.create(&new_thread).await.unwrap();
        }

        let page = repo
            .list(&ThreadFilter::default(), Pagination::new(2, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "Thread 2");

        let in_category = repo
            .list(&ThreadFilter::default().category(category.id), Pagination::default())
            .await
            .unwrap();
        assert_eq!(in_category.total, 3);
    }

    #[tokio::test]
    async fn test_update_thread() {
        let (db, author_id) = setup().await;
        let repo = ThreadRepository::new(db.pool());
        let thread = repo
            .create(&NewThread::new("Old", "d", author_id).with_tags(["a"]))
            .await
            .unwrap();

        let updated = repo
            .update(
                thread.id,
                &ThreadUpdate::new()
                    .title("New")
                    .tags(["b", "c"])
                    .visibility(Visibility::Private),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.tags, vec!["b", "c"]);
        assert_eq!(updated.visibility, Visibility::Private);

        assert!(repo
            .update(999, &ThreadUpdate::new().title("x"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_thread_adjusts_counters() {
        let (db, author_id) = setup().await;
        let repo = ThreadRepository::new(db.pool());
        let thread = repo
            .create(&NewThread::new("Bye", "d", author_id))
            .await
            .unwrap();

        assert!(repo.delete(thread.id).await.unwrap());
        assert!(repo.get_by_id(thread.id).await.unwrap().is_none());
        assert!(!repo.delete(thread.id).await.unwrap());

        let user = UserRepository::new(db.pool())
            .get_by_id(author_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.thread_count, 0);
    }

    #[tokio::test]
    async fn test_counters_and_counts() {
        let (db, author_id) = setup().await;
        let repo = ThreadRepository::new(db.pool());
        let thread = repo
            .create(&NewThread::new("Counted", "d", author_id))
            .await
            .unwrap();

        repo.increment_view_count(thread.id).await.unwrap();
        repo.increment_view_count(thread.id).await.unwrap();
        repo.increment_message_count(thread.id).await.unwrap();

        let thread = repo.get_by_id(thread.id).await.unwrap().unwrap();
        assert_eq!(thread.view_count, 2);
        assert_eq!(thread.message_count, 1);

        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.count_by_status(ThreadStatus::Open).await.unwrap(), 1);
        assert_eq!(repo.count_by_status(ThreadStatus::Archived).await.unwrap(), 0);
        assert_eq!(repo.count_by_author(author_id).await.unwrap(), 1);
        assert_eq!(repo.recent_public(5).await.unwrap().len(), 1);
        assert_eq!(
            repo.list_by_author(author_id, Pagination::default())
                .await
                .unwrap()
                .total,
            1
        );
    }
}
