//! Thread search for Agora.
//!
//! Case-insensitive substring match on title and description, or an exact
//! tag match. Archived and private threads never appear in results.
//!
//! Case folding is ASCII-only, matching SQLite's `LIKE` and `lower()`:
//! `rust` finds `RUST`, but `café` does not find `CAFÉ`.

use super::thread::Thread;
use super::thread_repository::{ThreadRow, THREAD_SELECT};
use super::types::{PaginatedResult, Pagination};
use crate::db::DbPool;
use crate::{AgoraError, Result};

const SEARCH_WHERE: &str = " WHERE t.status != 'archived' AND t.visibility = 'public' \
     AND (t.title LIKE ?1 ESCAPE '\\' \
          OR t.description LIKE ?1 ESCAPE '\\' \
          OR (',' || lower(t.tags) || ',') LIKE ?2 ESCAPE '\\')";

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Search public, non-archived threads.
///
/// `query` is trimmed; an empty query is a validation error. Tags never
/// contain commas, so a query with a comma only matches title and
/// description.
pub async fn search_threads(
    pool: &DbPool,
    query: &str,
    pagination: Pagination,
) -> Result<PaginatedResult<Thread>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AgoraError::Validation(
            "Search query is required".to_string(),
        ));
    }

    let escaped = escape_like(query);
    let text_pattern = format!("%{escaped}%");
    let tag_pattern =
        (!query.contains(',')).then(|| format!("%,{},%", escaped.to_ascii_lowercase()));

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM threads t{SEARCH_WHERE}"))
        .bind(&text_pattern)
        .bind(&tag_pattern)
        .fetch_one(pool)
        .await
        .map_err(|e| AgoraError::Database(e.to_string()))?;

    let rows = sqlx::query_as::<_, ThreadRow>(&format!(
        "{THREAD_SELECT}{SEARCH_WHERE} ORDER BY t.created_at DESC, t.id DESC LIMIT ?3 OFFSET ?4"
    ))
    .bind(&text_pattern)
    .bind(&tag_pattern)
    .bind(pagination.limit)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await
    .map_err(|e| AgoraError::Database(e.to_string()))?;

    Ok(PaginatedResult::new(
        rows.into_iter().map(ThreadRow::into_thread).collect(),
        total,
        pagination,
    ))
}
