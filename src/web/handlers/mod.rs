//! API and page handlers for the Web server.

pub mod admin;
pub mod auth;
pub mod category;
pub mod message;
pub mod pages;
pub mod search;
pub mod stats;
pub mod thread;
pub mod user;

pub use admin::*;
pub use auth::*;
pub use category::*;
pub use message::*;
pub use pages::*;
pub use search::*;
pub use stats::*;
pub use thread::*;
pub use user::*;

use std::str::FromStr;

use crate::web::error::ApiError;

/// Parse an optional request value. Blank counts as absent.
pub(crate) fn parse_param<T>(value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = String>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(ApiError::bad_request),
    }
}

/// Parse a list filter. Absent keeps `default`; `all` clears the criterion.
pub(crate) fn parse_filter_param<T>(
    value: Option<&str>,
    default: Option<T>,
) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = String>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(ApiError::bad_request),
    }
}
