//! User repository for Agora.
//!
//! This module provides CRUD operations for users in the database.

use sqlx::QueryBuilder;

use super::user::{NewUser, Role, User, UserUpdate};
use super::{begin_write, DbPool};
use crate::{AgoraError, Result};

const USER_COLUMNS: &str = "id, username, email, password, role, is_banned, thread_count, \
     message_count, profile_picture, biography, last_connection, created_at, updated_at";

/// Internal row type for database mapping.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    role: String,
    is_banned: bool,
    thread_count: i64,
    message_count: i64,
    profile_picture: Option<String>,
    biography: Option<String>,
    last_connection: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password: self.password,
            role: self.role.parse().unwrap_or(Role::User),
            is_banned: self.is_banned,
            thread_count: self.thread_count,
            message_count: self.message_count,
            profile_picture: self.profile_picture,
            biography: self.biography,
            last_connection: self.last_connection,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Map a write error, turning unique violations into conflicts.
pub(crate) fn map_write_error(e: sqlx::Error, what: &str) -> AgoraError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            AgoraError::Conflict(format!("{what} already exists"))
        }
        _ => AgoraError::Database(e.to_string()),
    }
}

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// Returns `Conflict` if the username or email is already taken.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, email, password, role, profile_picture, biography)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(new_user.role.as_str())
        .bind(&new_user.profile_picture)
        .bind(&new_user.biography)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| AgoraError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get a user by username (case-insensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? COLLATE NOCASE"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Get a user by username or email, as typed into a login form.
    pub async fn get_by_login(&self, login: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE username = ?1 COLLATE NOCASE OR email = ?1 COLLATE NOCASE
             LIMIT 1"
        ))
        .bind(login)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(row.map(UserRow::into_user))
    }

    /// Update a user by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated user, or None if not found.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> Result<Option<User>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref username) = update.username {
            separated.push("username = ");
            separated.push_bind_unseparated(username);
        }
        if let Some(ref email) = update.email {
            separated.push("email = ");
            separated.push_bind_unseparated(email);
        }
        if let Some(ref password) = update.password {
            separated.push("password = ");
            separated.push_bind_unseparated(password);
        }
        if let Some(role) = update.role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str());
        }
        if let Some(is_banned) = update.is_banned {
            separated.push("is_banned = ");
            separated.push_bind_unseparated(is_banned);
        }
        if let Some(ref profile_picture) = update.profile_picture {
            separated.push("profile_picture = ");
            separated.push_bind_unseparated(profile_picture.clone());
        }
        if let Some(ref biography) = update.biography {
            separated.push("biography = ");
            separated.push_bind_unseparated(biography.clone());
        }
        separated.push("updated_at = datetime('now')");

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| map_write_error(e, "username or email"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Record a successful login.
    pub async fn update_last_connection(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_connection = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(())
    }

    /// Set or clear the ban flag.
    ///
    /// Returns false if the user does not exist.
    pub async fn set_banned(&self, id: i64, banned: bool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_banned = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(banned)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user by ID.
    ///
    /// Threads, messages and reactions owned by the user cascade. Counters
    /// that outlive the user are adjusted in the same transaction: other
    /// authors' message counts, thread message counts and reaction totals.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = begin_write(self.pool).await?;

        sqlx::query(
            "UPDATE users SET message_count = MAX(0, message_count -
                 (SELECT COUNT(*) FROM messages m JOIN threads t ON t.id = m.thread_id
                  WHERE t.author_id = ?1 AND m.author_id = users.id))
             WHERE id != ?1 AND id IN
                 (SELECT m.author_id FROM messages m JOIN threads t ON t.id = m.thread_id
                  WHERE t.author_id = ?1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        sqlx::query(
            "UPDATE threads SET message_count = MAX(0, message_count -
                 (SELECT COUNT(*) FROM messages m WHERE m.thread_id = threads.id AND m.author_id = ?1))
             WHERE author_id != ?1 AND id IN (SELECT thread_id FROM messages WHERE author_id = ?1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        sqlx::query(
            "UPDATE messages SET
                 likes = (SELECT COUNT(*) FROM message_reactions r
                          WHERE r.message_id = messages.id AND r.user_id != ?1
                            AND r.reaction_type = 'like'),
                 dislikes = (SELECT COUNT(*) FROM message_reactions r
                             WHERE r.message_id = messages.id AND r.user_id != ?1
                               AND r.reaction_type = 'dislike')
             WHERE id IN (SELECT message_id FROM message_reactions WHERE user_id = ?1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// List users, most active first, with the total count.
    pub async fn list_paginated(&self, offset: i64, limit: i64) -> Result<(Vec<User>, i64)> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             ORDER BY message_count DESC, id ASC
             LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        let total = self.count().await?;
        Ok((rows.into_iter().map(UserRow::into_user).collect(), total))
    }

    /// Top posters, used for the "active users" panel.
    pub async fn top_by_messages(&self, limit: i64) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE is_banned = 0
             ORDER BY message_count DESC, id ASC
             LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count banned users.
    pub async fn count_banned(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_banned = 1")
            .fetch_one(self.pool)
            .await
            .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Count users who logged in within the last `hours` hours.
    pub async fn count_active_since(&self, hours: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE last_connection >= datetime('now', ?)",
        )
        .bind(format!("-{hours} hours"))
        .fetch_one(self.pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(count)
    }

    /// Check if a username is already taken (case-insensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ? COLLATE NOCASE)")
                .bind(username)
                .fetch_one(self.pool)
                .await
                .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Check if an email is already registered (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)")
                .bind(email)
                .fetch_one(self.pool)
                .await
                .map_err(|e| AgoraError::Database(e.to_string()))?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("alice", "alice@example.com", "hashedpw"))
            .await
            .unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::User);
        assert!(!user.is_banned);
        assert_eq!(user.message_count, 0);
        assert!(user.last_connection.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();

        let dup_name = repo
            .create(&NewUser::new("ALICE", "other@example.com", "pw"))
            .await;
        assert!(matches!(dup_name, Err(AgoraError::Conflict(_))));

        let dup_email = repo
            .create(&NewUser::new("bob", "Alice@Example.com", "pw"))
            .await;
        assert!(matches!(dup_email, Err(AgoraError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_by_login_matches_username_or_email() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let created = repo
            .create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();

        let by_name = repo.get_by_login("Alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_email = repo.get_by_login("ALICE@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        assert!(repo.get_by_login("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let user = repo
            .create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();

        let update = UserUpdate::new()
            .biography(Some("Hello there".to_string()))
            .profile_picture(Some("https://img.example/a.png".to_string()))
            .role(Role::Admin);
        let updated = repo.update(user.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.biography.as_deref(), Some("Hello there"));
        assert_eq!(
            updated.profile_picture.as_deref(),
            Some("https://img.example/a.png")
        );
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.username, "alice");
    }

    #[tokio::test]
    async fn test_update_nonexistent_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let result = repo
            .update(42, &UserUpdate::new().username("ghost"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_conflict() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        repo.create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();
        let bob = repo
            .create(&NewUser::new("bob", "bob@example.com", "pw"))
            .await
            .unwrap();

        let result = repo
            .update(bob.id, &UserUpdate::new().email("alice@example.com"))
            .await;
        assert!(matches!(result, Err(AgoraError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_ban_and_counts() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let alice = repo
            .create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();
        repo.create(&NewUser::new("bob", "bob@example.com", "pw"))
            .await
            .unwrap();

        assert!(repo.set_banned(alice.id, true).await.unwrap());
        assert!(!repo.set_banned(999, true).await.unwrap());

        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.count_banned().await.unwrap(), 1);
        assert!(repo.get_by_id(alice.id).await.unwrap().unwrap().is_banned);
    }

    #[tokio::test]
    async fn test_count_active_since() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let alice = repo
            .create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();
        let bob = repo
            .create(&NewUser::new("bob", "bob@example.com", "pw"))
            .await
            .unwrap();

        repo.update_last_connection(alice.id).await.unwrap();
        sqlx::query("UPDATE users SET last_connection = datetime('now', '-3 days') WHERE id = ?")
            .bind(bob.id)
            .execute(db.pool())
            .await
            .unwrap();

        assert_eq!(repo.count_active_since(24).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_paginated_orders_by_message_count() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        for (name, count) in [("quiet", 1), ("chatty", 9), ("medium", 4)] {
            let user = repo
                .create(&NewUser::new(name, format!("{name}@example.com"), "pw"))
                .await
                .unwrap();
            sqlx::query("UPDATE users SET message_count = ? WHERE id = ?")
                .bind(count)
                .bind(user.id)
                .execute(db.pool())
                .await
                .unwrap();
        }

        let (page, total) = repo.list_paginated(0, 2).await.unwrap();
        assert_eq!(total, 3);
        let names: Vec<_> = page.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["chatty", "medium"]);

        let top = repo.top_by_messages(1).await.unwrap();
        assert_eq!(top[0].username, "chatty");
    }

    #[tokio::test]
    async fn test_exists_checks() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        repo.create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();

        assert!(repo.username_exists("ALICE").await.unwrap());
        assert!(!repo.username_exists("bob").await.unwrap());
        assert!(repo.email_exists("alice@EXAMPLE.com").await.unwrap());
        assert!(!repo.email_exists("bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let user = repo
            .create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_adjusts_surviving_counters() {
        use crate::forum::{
            MessageRepository, NewMessage, NewThread, ReactionKind, ReactionRepository,
            ThreadRepository,
        };

        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());
        let alice = repo
            .create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();
        let bob = repo
            .create(&NewUser::new("bob", "bob@example.com", "pw"))
            .await
            .unwrap();

        let threads = ThreadRepository::new(db.pool());
        let messages = MessageRepository::new(db.pool());
        let alice_thread = threads
            .create(&NewThread::new("Alice asks", "d", alice.id))
            .await
            .unwrap();
        let bob_thread = threads
            .create(&NewThread::new("Bob asks", "d", bob.id))
            .await
            .unwrap();
        messages
            .create(&NewMessage::new(alice_thread.id, bob.id, "bob in alice's thread"))
            .await
            .unwrap();
        messages
            .create(&NewMessage::new(bob_thread.id, alice.id, "alice in bob's thread"))
            .await
            .unwrap();
        let bob_message = messages
            .create(&NewMessage::new(bob_thread.id, bob.id, "bob replies"))
            .await
            .unwrap();
        ReactionRepository::new(db.pool())
            .react(bob_message.id, alice.id, ReactionKind::Like)
            .await
            .unwrap();

        assert!(repo.delete(alice.id).await.unwrap());

        let bob = repo.get_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!((bob.thread_count, bob.message_count), (1, 1));
        let bob_thread = threads.get_by_id(bob_thread.id).await.unwrap().unwrap();
        assert_eq!(bob_thread.message_count, 1);
        let bob_message = messages.get_by_id(bob_message.id).await.unwrap().unwrap();
        assert_eq!(bob_message.likes, 0);
    }
}
