//! Web module for Agora.
//!
//! This module provides the JSON API under `/api` and the server-rendered
//! HTML pages, sharing one router, state and middleware stack.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::{create_app, create_router, create_router_with_limits};
pub use server::WebServer;
