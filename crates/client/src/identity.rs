//! Identity endpoints: sign-in, password recovery and account management.

use domain::models::user::{
    CreateAdminRequest, CreateUserRequest, ForgotPasswordRequest, LoginRequest, LoginResponse,
    ResetPasswordRequest,
};
use domain::models::Session;
use tracing::info;
use validator::Validate;

use crate::error::ClientError;
use crate::http::ApiClient;

/// Which login endpoint to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKind {
    User,
    Admin,
}

impl LoginKind {
    fn path(&self) -> &'static str {
        match self {
            LoginKind::User => "/users/login",
            LoginKind::Admin => "/admins/login-admin",
        }
    }
}

impl ApiClient {
    /// Signs in and returns the new session. The caller persists it.
    pub async fn login(
        &self,
        request: &LoginRequest,
        kind: LoginKind,
    ) -> Result<Session, ClientError> {
        request.validate()?;
        let response: LoginResponse = self
            .post_public("identity.login", kind.path(), request)
            .await?;
        info!(user_id = %response.user.id, ?kind, "Signed in");
        Ok(Session::authenticated(response.token, response.user))
    }

    /// Requests a password reset email.
    pub async fn forgot_password(
        &self,
        request: &ForgotPasswordRequest,
    ) -> Result<Option<String>, ClientError> {
        request.validate()?;
        self.post_ack(
            "identity.forgot_password",
            "/users/forgot-password",
            request,
            None,
        )
        .await
    }

    /// Sets a new password using a reset token.
    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<Option<String>, ClientError> {
        request.validate()?;
        self.post_ack(
            "identity.reset_password",
            "/users/reset-password",
            request,
            None,
        )
        .await
    }

    /// Registers a staff member or student.
    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
        session: &Session,
    ) -> Result<Option<String>, ClientError> {
        if !session.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        request.validate()?;
        let message = self
            .post_ack("identity.create_user", "/users/user", request, Some(session))
            .await?;
        info!(email = %request.email, "User created");
        Ok(message)
    }

    /// Registers an administrator.
    pub async fn create_admin(
        &self,
        request: &CreateAdminRequest,
        session: &Session,
    ) -> Result<Option<String>, ClientError> {
        if !session.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        request.validate()?;
        self.post_ack("identity.create_admin", "/admins/admin", request, Some(session))
            .await
    }

    pub async fn delete_user(
        &self,
        user_id: &str,
        session: &Session,
    ) -> Result<Option<String>, ClientError> {
        if !session.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        let path = format!("/users/delete/{}", user_id);
        let message = self.delete_ack("identity.delete_user", &path, session).await?;
        info!(user_id = user_id, "User deleted");
        Ok(message)
    }
}
