//! User model for Agora.
//!
//! This module defines the User struct and Role enum for account management.

use std::fmt;
use std::str::FromStr;

/// User role for permission management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Role {
    /// Anonymous visitor (never stored).
    Guest = 0,
    /// Registered member.
    #[default]
    User = 1,
    /// Administrator with moderation rights.
    Admin = 2,
}

impl Role {
    /// Convert role to its database and token representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Get display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Guest => "Guest",
            Role::User => "Member",
            Role::Admin => "Administrator",
        }
    }

    /// Check if this role has at least the required permission level.
    ///
    /// # Examples
    ///
    /// ```
    /// use agora::db::Role;
    ///
    /// assert!(Role::Admin.can_access(Role::User));
    /// assert!(Role::User.can_access(Role::User));
    /// assert!(!Role::Guest.can_access(Role::User));
    /// ```
    pub fn can_access(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "guest" => Ok(Role::Guest),
            "user" | "member" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A registered forum account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique, case-insensitive).
    pub username: String,
    /// Email address (unique, case-insensitive).
    pub email: String,
    /// Password hash.
    pub password: String,
    /// User role.
    pub role: Role,
    /// Whether an admin has banned this account.
    pub is_banned: bool,
    /// Number of threads started.
    pub thread_count: i64,
    /// Number of messages posted.
    pub message_count: i64,
    /// Avatar URL.
    pub profile_picture: Option<String>,
    /// Free-form biography.
    pub biography: Option<String>,
    /// Last successful login.
    pub last_connection: Option<String>,
    /// Account creation timestamp.
    pub created_at: String,
    /// Last profile update timestamp.
    pub updated_at: String,
}

impl User {
    /// Check if this user has at least the required role level.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.can_access(required)
    }

    /// Check if this user is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password hash (already hashed).
    pub password: String,
    /// User role (defaults to User).
    pub role: Role,
    /// Avatar URL.
    pub profile_picture: Option<String>,
    /// Biography.
    pub biography: Option<String>,
}

impl NewUser {
    /// Create a new user with the required fields.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            role: Role::User,
            profile_picture: None,
            biography: None,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the avatar URL.
    pub fn with_profile_picture(mut self, url: impl Into<String>) -> Self {
        self.profile_picture = Some(url.into());
        self
    }

    /// Set the biography.
    pub fn with_biography(mut self, biography: impl Into<String>) -> Self {
        self.biography = Some(biography.into());
        self
    }
}

/// Data for updating an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_banned: Option<bool>,
    pub profile_picture: Option<Option<String>>,
    pub biography: Option<Option<String>>,
}

impl UserUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set new email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set new password hash.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set new role.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set ban status.
    pub fn is_banned(mut self, banned: bool) -> Self {
        self.is_banned = Some(banned);
        self
    }

    /// Set avatar URL (None clears it).
    pub fn profile_picture(mut self, url: Option<String>) -> Self {
        self.profile_picture = Some(url);
        self
    }

    /// Set biography (None clears it).
    pub fn biography(mut self, biography: Option<String>) -> Self {
        self.biography = Some(biography);
        self
    }

    /// Check if any field is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.is_banned.is_none()
            && self.profile_picture.is_none()
            && self.biography.is_none()
    }
}
