//! Server-rendered HTML pages.
//!
//! Pages read through the same [`ForumService`] as the JSON API, so the
//! visibility rules are identical. Errors render the `error` page with the
//! status the API would have returned.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use super::AppState;
use crate::datetime::format_display;
use crate::forum::{ForumService, Message, Pagination, Thread, ThreadFilter};
use crate::template::{render_page, TemplateContext, Value};
use crate::web::dto::{PageQuery, SearchQuery};
use crate::web::error::ApiError;
use crate::web::middleware::OptionalAuthUser;

fn base_context(state: &AppState) -> TemplateContext {
    let mut context = TemplateContext::new();
    context.set("forum_name", Value::string(&state.forum.name));
    context.set("forum_description", Value::string(&state.forum.description));
    context
}

fn render(state: &AppState, page: &str, title: &str, context: &TemplateContext) -> Response {
    match render_page(&state.templates, page, title, context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(page = page, error = %e, "Failed to render page");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Internal error</h1>".to_string()),
            )
                .into_response()
        }
    }
}

fn error_page(state: &AppState, error: ApiError) -> Response {
    let status = error.code().status_code();
    let title = status.canonical_reason().unwrap_or("Error");

    let mut context = base_context(state);
    context.set("message", Value::string(error.message()));
    let mut response = render(state, "error", title, &context);
    *response.status_mut() = status;
    response
}

fn thread_value(thread: &Thread) -> Value {
    Value::object([
        ("id", Value::Number(thread.id)),
        ("title", Value::string(&thread.title)),
        ("description", Value::string(&thread.description)),
        ("author_name", Value::string(&thread.author_name)),
        ("created_at", Value::String(format_display(&thread.created_at))),
        ("status", Value::string(thread.status.as_str())),
        ("visibility", Value::string(thread.visibility.as_str())),
        ("view_count", Value::Number(thread.view_count)),
        ("message_count", Value::Number(thread.message_count)),
        ("tags", Value::from(thread.tags.clone())),
    ])
}

fn message_value(message: &Message) -> Value {
    Value::object([
        ("id", Value::Number(message.id)),
        ("author_name", Value::string(&message.author_name)),
        ("content", Value::string(&message.content)),
        ("image_url", Value::from(message.image_url.clone())),
        ("likes", Value::Number(message.likes)),
        ("dislikes", Value::Number(message.dislikes)),
        ("created_at", Value::String(format_display(&message.created_at))),
    ])
}

/// GET / and GET /threads - Open public threads, newest first.
pub async fn threads_page(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(claims): OptionalAuthUser,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer = match state.viewer(claims.as_ref()).await {
        Ok(viewer) => viewer,
        Err(e) => return error_page(&state, e),
    };
    let pagination = Pagination::from_page(query.page, query.per_page);

    let result = match ForumService::new(&state.db)
        .list_threads(viewer.as_ref(), ThreadFilter::default(), pagination)
        .await
    {
        Ok(result) => result,
        Err(e) => return error_page(&state, e.into()),
    };

    let page = result.page();
    let mut context = base_context(&state);
    context.set("total", Value::Number(result.total));
    context.set("page", Value::Number(page));
    context.set("has_prev", Value::Bool(page > 1));
    context.set("prev_page", Value::Number(page - 1));
    context.set("has_next", Value::Bool(result.has_more()));
    context.set("next_page", Value::Number(page.saturating_add(1)));
    context.set(
        "threads",
        Value::list(result.items.iter().map(thread_value).collect()),
    );

    render(&state, "threads", "Threads", &context)
}

/// GET /threads/:id - A thread and its newest messages. Counts a view.
pub async fn thread_page(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(claims): OptionalAuthUser,
    Path(id): Path<i64>,
) -> Response {
    let viewer = match state.viewer(claims.as_ref()).await {
        Ok(viewer) => viewer,
        Err(e) => return error_page(&state, e),
    };

    let view = match ForumService::new(&state.db)
        .view_thread(viewer.as_ref(), id)
        .await
    {
        Ok(view) => view,
        Err(e) => return error_page(&state, e.into()),
    };

    let mut context = base_context(&state);
    context.set("thread", thread_value(&view.thread));
    context.set("is_open", Value::Bool(view.thread.status.accepts_messages()));
    context.set(
        "messages",
        Value::list(view.messages.iter().map(message_value).collect()),
    );

    render(&state, "thread", &view.thread.title, &context)
}

/// GET /search?q= - Search form, with results when `q` is given.
pub async fn search_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let q = query.q.as_deref().map(str::trim).unwrap_or("");
    let mut context = base_context(&state);
    context.set("query", Value::string(q));

    if !q.is_empty() {
        let pagination = Pagination::from_page(query.page, query.per_page);
        let result = match ForumService::new(&state.db).search(q, pagination).await {
            Ok(result) => result,
            Err(e) => return error_page(&state, e.into()),
        };
        context.set("total", Value::Number(result.total));
        context.set(
            "results",
            Value::list(result.items.iter().map(thread_value).collect()),
        );
    }

    render(&state, "search", "Search", &context)
}

/// GET /profile - Shell page; the client fills it from the API.
pub async fn profile_page(State(state): State<Arc<AppState>>) -> Response {
    render(&state, "profile", "Profile", &base_context(&state))
}

/// GET /login - Sign-in form; the script stores the token it gets back.
pub async fn login_page(State(state): State<Arc<AppState>>) -> Response {
    render(&state, "login", "Log in", &base_context(&state))
}

/// GET /register
pub async fn register_page(State(state): State<Arc<AppState>>) -> Response {
    render(&state, "register", "Register", &base_context(&state))
}

/// GET /admin/dashboard - Moderation statistics. Admins only.
///
/// The token may be passed as `?token=` since this is a plain page load.
pub async fn admin_dashboard_page(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(claims): OptionalAuthUser,
) -> Response {
    let Some(claims) = claims.filter(|c| c.is_admin()) else {
        return error_page(&state, ApiError::forbidden("Admin access required"));
    };
    let admin = match state.current_user(&claims).await {
        Ok(admin) => admin,
        Err(e) => return error_page(&state, e),
    };

    let stats = match ForumService::new(&state.db).admin_stats(&admin).await {
        Ok(stats) => stats,
        Err(e) => return error_page(&state, e.into()),
    };

    let mut context = base_context(&state);
    context.set(
        "stats",
        Value::object([
            ("total_users", stats.total_users),
            ("active_users", stats.active_users),
            ("banned_users", stats.banned_users),
            ("total_threads", stats.total_threads),
            ("open_threads", stats.open_threads),
            ("closed_threads", stats.closed_threads),
            ("archived_threads", stats.archived_threads),
            ("total_messages", stats.total_messages),
        ]),
    );

    render(&state, "admin_dashboard", "Dashboard", &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::forum::NewThread;
    use crate::template::builtin_engine;
    use crate::Database;

    #[tokio::test]
    async fn test_thread_value_escapes_on_render() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        let thread = ForumService::new(&db)
            .create_thread(
                &user,
                NewThread::new("<script>x</script>", "Body text here", user.id),
            )
            .await
            .unwrap();

        let engine = builtin_engine().unwrap();
        let mut context = TemplateContext::new();
        context.set("thread", thread_value(&thread));
        context.set("is_open", Value::Bool(true));
        context.set("messages", Value::list(vec![]));

        let html = engine.render("thread", &context).unwrap();
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>x"));
        assert!(html.contains("No messages yet."));
    }
}
