//! Database schema and migrations for Agora.
//!
//! Migrations are applied sequentially when the database is opened.

/// Database migrations.
///
/// Each migration is a SQL script executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    username         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email            TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password         TEXT NOT NULL,                   -- Argon2 PHC string or legacy SHA-512 hex
    role             TEXT NOT NULL DEFAULT 'user',    -- 'user', 'admin'
    is_banned        INTEGER NOT NULL DEFAULT 0,
    thread_count     INTEGER NOT NULL DEFAULT 0,
    message_count    INTEGER NOT NULL DEFAULT 0,
    profile_picture  TEXT,
    biography        TEXT,
    last_connection  TEXT,
    created_at       TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at       TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_users_message_count ON users(message_count DESC);
"#,
    // v2: categories and threads
    r#"
CREATE TABLE categories (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL UNIQUE,
    description  TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at   TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE threads (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    title          TEXT NOT NULL,
    description    TEXT NOT NULL,
    tags           TEXT NOT NULL DEFAULT '',          -- comma-joined
    author_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category_id    INTEGER REFERENCES categories(id) ON DELETE CASCADE,
    status         TEXT NOT NULL DEFAULT 'open',      -- 'open', 'closed', 'archived'
    visibility     TEXT NOT NULL DEFAULT 'public',    -- 'public', 'private'
    view_count     INTEGER NOT NULL DEFAULT 0,
    message_count  INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_threads_listing ON threads(status, visibility, created_at DESC);
CREATE INDEX idx_threads_author ON threads(author_id);
CREATE INDEX idx_threads_category ON threads(category_id);
"#,
    // v3: messages and reactions
    r#"
CREATE TABLE messages (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    thread_id   INTEGER NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
    author_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    content     TEXT NOT NULL,
    image_url   TEXT,
    likes       INTEGER NOT NULL DEFAULT 0,
    dislikes    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_messages_thread ON messages(thread_id, created_at);
CREATE INDEX idx_messages_author ON messages(author_id);

CREATE TABLE message_reactions (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id     INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
    user_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    reaction_type  TEXT NOT NULL CHECK (reaction_type IN ('like', 'dislike')),
    created_at     TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (message_id, user_id)
);

CREATE INDEX idx_reactions_message ON message_reactions(message_id);
"#,
];
