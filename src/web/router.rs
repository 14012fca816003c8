//! Router configuration for Web API.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{
    admin_dashboard_page, admin_delete_message, admin_delete_thread, admin_list_threads,
    admin_stats, ban_user, change_password, create_category, create_message, create_thread,
    delete_category, delete_message, delete_thread, dislike_message, get_category, get_profile,
    get_thread, global_stats, like_message, list_categories, list_messages, list_threads,
    list_users, login, login_page, me, moderate_thread, profile_page, register, register_page,
    remove_reaction, search, search_page, set_thread_status, thread_page, threads_page,
    unban_user, update_category, update_message, update_profile, update_thread, user_messages,
    user_stats, user_threads, AppState,
};
use super::middleware::{
    api_rate_limit, create_cors_layer, jwt_auth, login_rate_limit, with_security_headers,
    JwtState, RateLimitState,
};
use crate::config::WebConfig;

/// Create the main API and page router with fresh rate limiters.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    config: &WebConfig,
) -> Router {
    let rate_limits = Arc::new(
        RateLimitState::new(config.login_rate_limit, config.api_rate_limit)
            .with_proxy_headers(config.trust_proxy_headers),
    );
    create_router_with_limits(app_state, jwt_state, rate_limits, &config.cors_origins)
}

/// Create the main router sharing existing rate limiters.
pub fn create_router_with_limits(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limits: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router<()> {
    // Sign-in routes have their own, stricter budget
    let login_limits = rate_limits.clone();
    let auth_public_routes = Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route_layer(middleware::from_fn(move |req, next| {
            login_rate_limit(login_limits.clone(), req, next)
        }));

    let auth_routes = Router::new()
        .merge(auth_public_routes)
        .route("/me", get(me));

    let user_routes = Router::new()
        .route("/me", get(get_profile).put(update_profile))
        .route("/me/password", put(change_password))
        .route("/stats", get(user_stats))
        .route("/threads", get(user_threads))
        .route("/messages", get(user_messages));

    let forum_routes = Router::new()
        .route("/stats", get(global_stats))
        .route("/search", get(search))
        .route("/categories", get(list_categories))
        .route("/categories/:id", get(get_category))
        .route("/threads", get(list_threads).post(create_thread))
        .route(
            "/threads/:id",
            get(get_thread).put(update_thread).delete(delete_thread),
        )
        .route(
            "/threads/:id/messages",
            get(list_messages).post(create_message),
        )
        .route("/messages/:id", put(update_message).delete(delete_message))
        .route("/messages/:id/like", post(like_message))
        .route("/messages/:id/dislike", post(dislike_message))
        .route("/messages/:id/reaction", delete(remove_reaction));

    let admin_routes = Router::new()
        .route("/stats", get(admin_stats))
        .route("/users", get(list_users))
        .route("/users/:id/ban", post(ban_user))
        .route("/users/:id/unban", post(unban_user))
        .route("/threads", get(admin_list_threads))
        .route(
            "/threads/:id",
            put(moderate_thread).delete(admin_delete_thread),
        )
        .route("/threads/:id/status", put(set_thread_status))
        .route("/messages/:id", delete(admin_delete_message))
        .route("/categories", post(create_category))
        .route(
            "/categories/:id",
            put(update_category).delete(delete_category),
        );

    let api_limits = rate_limits;
    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .nest("/admin", admin_routes)
        .merge(forum_routes)
        .layer(middleware::from_fn(move |req, next| {
            api_rate_limit(api_limits.clone(), req, next)
        }));

    let page_routes = Router::new()
        .route("/", get(threads_page))
        .route("/threads", get(threads_page))
        .route("/threads/:id", get(thread_page))
        .route("/search", get(search_page))
        .route("/profile", get(profile_page))
        .route("/login", get(login_page))
        .route("/register", get(register_page))
        .route("/admin/dashboard", get(admin_dashboard_page));

    // Clone jwt_state for the middleware closure
    let jwt_state_for_middleware = jwt_state.clone();

    let router = Router::new()
        .nest("/api", api_routes)
        .merge(page_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        );

    with_security_headers(router).with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Serve `/static/*` from `static_path`, if the directory exists.
pub fn create_static_router(static_path: &str) -> Option<Router> {
    if !Path::new(static_path).is_dir() {
        tracing::warn!(path = %static_path, "Static directory not found, not serving /static");
        return None;
    }
    Some(Router::new().nest_service("/static", ServeDir::new(static_path)))
}

/// Assemble the complete application: API, pages, health, static files and
/// gzip compression.
pub fn create_app(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    rate_limits: Arc<RateLimitState>,
    config: &WebConfig,
) -> Router {
    let mut router = create_router_with_limits(
        app_state,
        jwt_state,
        rate_limits,
        &config.cors_origins,
    )
    .merge(create_health_router());

    if config.serve_static {
        if let Some(static_router) = create_static_router(&config.static_path) {
            router = router.merge(static_router);
        }
    }

    router.layer(CompressionLayer::new())
}
