//! User, role and identity request models.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::Validate;

/// Normalized user role.
///
/// The identity API reports roles either as a bare name or as an object with a
/// `name` field; both shapes are resolved into this value once, on decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RoleRepr", into = "String")]
pub enum Role {
    Admin,
    Staff,
    Student,
    Other(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoleRepr {
    Name(String),
    Named { name: String },
}

impl From<RoleRepr> for Role {
    fn from(repr: RoleRepr) -> Self {
        match repr {
            RoleRepr::Name(name) | RoleRepr::Named { name } => Role::from_name(&name),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl Role {
    /// Resolves a role name, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "admin" | "administrator" => Role::Admin,
            "staff" => Role::Staff,
            "student" => Role::Student,
            _ => Role::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Student => "student",
            Role::Other(name) => name,
        }
    }

    /// Display label shown next to a user's name.
    pub fn label(&self) -> String {
        match self {
            Role::Admin => "System Admin".to_string(),
            Role::Staff => "Staff".to_string(),
            Role::Student => "Student".to_string(),
            Role::Other(name) => capitalize(name),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A user profile as cached in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl UserProfile {
    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }
}

/// Full display name; `"Guest"` without a user, `"User"` when no name is known.
pub fn full_name(user: Option<&UserProfile>) -> String {
    let Some(user) = user else {
        return "Guest".to_string();
    };
    let name = format!(
        "{} {}",
        user.first_name.as_deref().unwrap_or(""),
        user.last_name.as_deref().unwrap_or("")
    );
    let name = name.trim();
    if name.is_empty() {
        "User".to_string()
    } else {
        name.to_string()
    }
}

/// Role label for display; `"Guest"` without a user.
pub fn role_label(user: Option<&UserProfile>) -> String {
    match user {
        None => "Guest".to_string(),
        Some(u) => u.role().map(Role::label).unwrap_or_default(),
    }
}

/// A role entry from `GET /roles/roles`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleEntry {
    pub id: String,
    pub name: String,
}

impl RoleEntry {
    pub fn role(&self) -> Role {
        Role::from_name(&self.name)
    }
}

/// Request payload for creating a role.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,
}

/// Errors raised while assembling identity requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserRequestError {
    #[error("Please select a track for students")]
    TrackRequired,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Full name must not be empty")]
    EmptyName,
}

/// Request payload for `POST /users/login` and `POST /admins/login-admin`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Data returned by a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Request payload for `POST /users/user`.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub role_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl CreateUserRequest {
    /// Builds a request from a single "full name" field.
    ///
    /// The first whitespace-separated word becomes the first name, the rest
    /// the last name. Students must be assigned a track; other roles never
    /// carry one.
    pub fn from_full_name(
        full_name: &str,
        email: impl Into<String>,
        role: &RoleEntry,
        track_id: Option<String>,
    ) -> Result<Self, UserRequestError> {
        let mut parts = full_name.split_whitespace();
        let first_name = parts.next().ok_or(UserRequestError::EmptyName)?.to_string();
        let last_name = parts.collect::<Vec<_>>().join(" ");

        let is_student = role.role() == Role::Student;
        let track_id = if is_student {
            Some(track_id.ok_or(UserRequestError::TrackRequired)?)
        } else {
            None
        };

        Ok(Self {
            first_name,
            last_name,
            email: email.into(),
            role_id: role.id.clone(),
            track_id,
        })
    }
}

/// Request payload for `POST /admins/admin`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateAdminRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub role: String,
}

/// Request payload for `POST /users/forgot-password`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Request payload for `POST /users/reset-password`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub token: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

impl ResetPasswordRequest {
    pub fn new(
        token: impl Into<String>,
        password: impl Into<String>,
        confirm_password: &str,
    ) -> Result<Self, UserRequestError> {
        let password = password.into();
        if password != confirm_password {
            return Err(UserRequestError::PasswordMismatch);
        }
        Ok(Self {
            token: token.into(),
            password,
        })
    }
}
