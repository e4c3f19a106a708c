//! `/api/auth` handlers.
//!
//! Sign-in responses carry a bearer token; the browser client stores it and
//! sends it back as `Authorization: Bearer <token>`.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireActiveUser, RequireAuth};
use crate::models::{User, UserProfile};
use crate::routes::{ApiResponse, NoBody};
use crate::services::auth::AuthService;
use crate::services::email::deliver_verification_code;
use crate::state::AppState;

/// Token plus the profile it belongs to.
#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub token: String,
    pub user: UserProfile,
}

/// A single profile.
#[derive(Debug, Serialize)]
pub struct ProfileBody {
    pub user: UserProfile,
}

fn session(state: &AppState, user: User) -> Result<SessionBody> {
    let token = state.tokens().issue(&user)?;
    Ok(SessionBody {
        token,
        user: user.into(),
    })
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(message.to_owned()));
    }
    Ok(())
}

// ============================================================================
// Sign-in
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login
///
/// # Errors
///
/// 400 on missing fields, 401 on bad credentials, 403 if disabled.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionBody>>> {
    require(&req.email, "Email and password are required")?;
    require(&req.password, "Email and password are required")?;

    let user = AuthService::new(state.pool())
        .login_with_password(&req.email, &req.password)
        .await?;

    tracing::info!(user_id = %user.id, "Password login");
    Ok(ApiResponse::with_message(
        "Login successful",
        session(&state, user)?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct RequestCodeRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /api/auth/request-code
///
/// # Errors
///
/// 429 if a code was sent within the last minute, 502 if mailing fails.
pub async fn request_code(
    State(state): State<AppState>,
    Json(req): Json<RequestCodeRequest>,
) -> Result<Json<ApiResponse<NoBody>>> {
    require(&req.email, "Email is required")?;

    let (email, code) = AuthService::new(state.pool())
        .request_code(&req.email)
        .await?;

    deliver_verification_code(state.mailer(), &email, &code).await?;

    Ok(ApiResponse::message("Verification code sent"))
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
    pub password: Option<String>,
}

/// POST /api/auth/verify-code
///
/// # Errors
///
/// 400 on a malformed code or a missing password for a new account, 401 if
/// the code is wrong, expired or used.
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<ApiResponse<SessionBody>>> {
    require(&req.email, "Email and code are required")?;
    require(&req.code, "Email and code are required")?;

    let user = AuthService::new(state.pool())
        .verify_code(&req.email, req.code.trim(), req.password.as_deref())
        .await?;

    add_breadcrumb("auth", "Signed in with verification code", None);
    Ok(ApiResponse::with_message(
        "Login successful",
        session(&state, user)?,
    ))
}

// ============================================================================
// Account
// ============================================================================

/// GET /api/auth/profile
///
/// # Errors
///
/// 404 if the account was deleted after the token was issued.
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ApiResponse<ProfileBody>>> {
    let user = AuthService::new(state.pool()).current_user(caller.id).await?;
    Ok(ApiResponse::ok(ProfileBody { user: user.into() }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: String,
    pub avatar: Option<String>,
}

/// PUT /api/auth/profile
///
/// # Errors
///
/// 400 if the username is blank, 403 for a disabled account.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireActiveUser(caller): RequireActiveUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileBody>>> {
    let user = AuthService::new(state.pool())
        .update_profile(caller.id, &req.username, req.avatar.as_deref())
        .await?;

    Ok(ApiResponse::with_message(
        "Profile updated",
        ProfileBody { user: user.into() },
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: String,
}

/// PUT /api/auth/password
///
/// # Errors
///
/// 400 if the new password is too short or the current one is missing,
/// 401 if the current password is wrong, 403 for a disabled account.
pub async fn change_password(
    State(state): State<AppState>,
    RequireActiveUser(caller): RequireActiveUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<NoBody>>> {
    AuthService::new(state.pool())
        .change_password(caller.id, req.current_password.as_deref(), &req.new_password)
        .await?;

    Ok(ApiResponse::message("Password updated"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HasPasswordBody {
    pub has_password: bool,
}

/// GET /api/auth/has-password
///
/// # Errors
///
/// 404 if the account no longer exists.
pub async fn has_password(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<ApiResponse<HasPasswordBody>>> {
    let has_password = AuthService::new(state.pool())
        .has_password(caller.id)
        .await?;
    Ok(ApiResponse::ok(HasPasswordBody { has_password }))
}
