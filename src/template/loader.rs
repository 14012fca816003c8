//! Built-in page templates.
//!
//! Pages are compiled into the binary from `templates/` and wrapped in a
//! shared layout at render time.

use super::{Result, TemplateContext, TemplateEngine, TemplateError, Value};

/// Name of the shared layout template.
pub const LAYOUT: &str = "layout";

/// All built-in templates as `(name, source)` pairs.
pub const BUILTIN_PAGES: &[(&str, &str)] = &[
    (LAYOUT, include_str!("../../templates/layout.html")),
    ("threads", include_str!("../../templates/threads.html")),
    ("thread", include_str!("../../templates/thread.html")),
    ("search", include_str!("../../templates/search.html")),
    ("profile", include_str!("../../templates/profile.html")),
    ("login", include_str!("../../templates/login.html")),
    ("register", include_str!("../../templates/register.html")),
    (
        "admin_dashboard",
        include_str!("../../templates/admin_dashboard.html"),
    ),
    ("error", include_str!("../../templates/error.html")),
];

/// Create an engine with every built-in template loaded.
pub fn builtin_engine() -> Result<TemplateEngine> {
    let mut engine = TemplateEngine::new();
    for (name, source) in BUILTIN_PAGES {
        engine.load(*name, source).map_err(|e| match e {
            TemplateError::Parse(msg) => TemplateError::Parse(format!("{name}: {msg}")),
            other => other,
        })?;
    }
    Ok(engine)
}

/// Render a page and wrap it in the layout.
///
/// The page body is exposed to the layout as `content`, unescaped.
pub fn render_page(
    engine: &TemplateEngine,
    page: &str,
    title: &str,
    context: &TemplateContext,
) -> Result<String> {
    let body = engine.render(page, context)?;

    let mut layout_context = context.child();
    layout_context.set("title", Value::string(title));
    layout_context.set("content", Value::String(body));
    engine.render(LAYOUT, &layout_context)
}
