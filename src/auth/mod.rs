//! Authentication module for Agora.
//!
//! This module provides password hashing, credential checking,
//! registration, profile management and permission checks.

mod login;
mod password;
pub mod permission;
mod profile;
mod registration;
pub mod validation;

pub use login::{authenticate, LoginError};
pub use password::{
    hash_password, needs_rehash, validate_password, verify_password, PasswordError,
    MIN_PASSWORD_LENGTH,
};
pub use permission::{
    can_modify_resource, check_permission, require_admin, require_user, PermissionError,
};
pub use profile::{change_password, update_profile, ProfileError, ProfileUpdateRequest};
pub use registration::{register, register_with_role, RegistrationError, RegistrationRequest};
pub use validation::ValidationError;
