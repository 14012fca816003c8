//! Agora - a discussion forum backend.
//!
//! Users register and sign in with JWT bearer tokens, open threads in
//! categories, post messages and react to them with likes or dislikes.
//! Admins moderate threads and users. The same data is served as a JSON
//! API under `/api` and as server-rendered HTML pages.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod forum;
pub mod logging;
pub mod template;
pub mod web;

pub use auth::{
    authenticate, change_password, hash_password, register, update_profile, validate_password,
    verify_password, LoginError, PasswordError, PermissionError, ProfileError,
    ProfileUpdateRequest, RegistrationError, RegistrationRequest,
};
pub use config::Config;
pub use db::{Database, NewUser, Role, User, UserRepository, UserUpdate};
pub use error::{AgoraError, Result};
pub use forum::{ForumService, ThreadStatus, Visibility};
pub use web::WebServer;
