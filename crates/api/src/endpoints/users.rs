//! User endpoints: registration, sessions, profile.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{get, patch, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use playtube_common::{AppError, AppResult};
use playtube_core::{
    AuthTokens, ChannelProfile, RegisterInput, UpdateDetailsInput, UserView, WatchHistoryVideo,
};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Login request. Either a username or an email identifies the account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Login payload: the user plus the token pair.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// Password change request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Refresh request body; the cookie takes precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Register a new user from a multipart form.
async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UserView>> {
    let mut username = None;
    let mut email = None;
    let mut full_name = None;
    let mut password = None;
    let mut avatar: Option<(Vec<u8>, String)> = None;
    let mut cover_image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => username = Some(read_text(field).await?),
            "email" => email = Some(read_text(field).await?),
            "fullName" => full_name = Some(read_text(field).await?),
            "password" => password = Some(read_text(field).await?),
            "avatar" => avatar = Some(read_file(field).await?),
            "coverImage" => cover_image = Some(read_file(field).await?),
            _ => {}
        }
    }

    let input = RegisterInput {
        username: username.ok_or_else(|| missing("username"))?,
        email: email.ok_or_else(|| missing("email"))?,
        full_name: full_name.ok_or_else(|| missing("fullName"))?,
        password: password.ok_or_else(|| missing("password"))?,
    };
    let avatar = avatar.ok_or_else(|| missing("avatar"))?;

    let user = state
        .account_service
        .register(input, avatar, cover_image)
        .await?;

    Ok(ApiResponse::created(user, "User registered successfully"))
}

/// Log in and set the token cookies.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> AppResult<(CookieJar, ApiResponse<LoginResponse>)> {
    let identifier = req
        .username
        .or(req.email)
        .ok_or_else(|| AppError::BadRequest("Username or email is required".to_string()))?;

    let (user, tokens) = state.account_service.login(&identifier, &req.password).await?;

    let jar = jar
        .add(auth_cookie("accessToken", tokens.access_token.clone()))
        .add(auth_cookie("refreshToken", tokens.refresh_token.clone()));

    Ok((
        jar,
        ApiResponse::ok(LoginResponse { user, tokens }, "Logged in successfully"),
    ))
}

/// Log out: revoke the refresh token and clear both cookies.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<()>)> {
    state.account_service.logout(&user.id).await?;

    let jar = jar
        .remove(removal_cookie("accessToken"))
        .remove(removal_cookie("refreshToken"));

    Ok((jar, ApiResponse::ok((), "Logged out successfully")))
}

/// Rotate the token pair from the refresh cookie or body.
async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, ApiResponse<AuthTokens>)> {
    let incoming = jar
        .get("refreshToken")
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or(AppError::Unauthorized)?;

    let tokens = state.account_service.refresh(&incoming).await?;

    let jar = jar
        .add(auth_cookie("accessToken", tokens.access_token.clone()))
        .add(auth_cookie("refreshToken", tokens.refresh_token.clone()));

    Ok((jar, ApiResponse::ok(tokens, "Token refreshed")))
}

/// Change the password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .account_service
        .change_password(&user.id, &req.old_password, &req.new_password)
        .await?;

    Ok(ApiResponse::ok((), "Password changed successfully"))
}

/// The authenticated user's own profile.
async fn current_user(AuthUser(user): AuthUser) -> ApiResponse<UserView> {
    ApiResponse::ok(user.into(), "Current user fetched")
}

/// Update display name and email.
async fn update_account(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateDetailsInput>,
) -> AppResult<ApiResponse<UserView>> {
    let updated = state.account_service.update_details(&user.id, input).await?;
    Ok(ApiResponse::ok(updated, "Account details updated"))
}

/// Replace the avatar image.
async fn update_avatar(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<UserView>> {
    let (data, content_type) = single_file(multipart, "avatar").await?;
    let updated = state
        .account_service
        .update_avatar(&user.id, data, &content_type)
        .await?;

    Ok(ApiResponse::ok(updated, "Avatar updated"))
}

/// Replace the cover image.
async fn update_cover_image(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<UserView>> {
    let (data, content_type) = single_file(multipart, "coverImage").await?;
    let updated = state
        .account_service
        .update_cover_image(&user.id, data, &content_type)
        .await?;

    Ok(ApiResponse::ok(updated, "Cover image updated"))
}

/// Channel profile by username, with subscription aggregates.
async fn channel_profile(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ChannelProfile>> {
    let profile = state
        .account_service
        .channel_profile(&username, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;

    Ok(ApiResponse::ok(profile, "Channel profile fetched"))
}

/// The authenticated user's watch history, most recent first.
async fn watch_history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<WatchHistoryVideo>>> {
    let history = state.account_service.watch_history(&user.id).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched"))
}

/// Create the user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/c/{username}", get(channel_profile))
        .route("/history", get(watch_history))
}

// ==================== Multipart helpers ====================

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn read_file(field: axum::extract::multipart::Field<'_>) -> AppResult<(Vec<u8>, String)> {
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok((data.to_vec(), content_type))
}

pub(crate) async fn single_file(
    mut multipart: Multipart,
    field_name: &str,
) -> AppResult<(Vec<u8>, String)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some(field_name) {
            return read_file(field).await;
        }
    }

    Err(missing(field_name))
}

fn missing(field: &str) -> AppError {
    AppError::BadRequest(format!("Missing field: {field}"))
}

fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::None);
    cookie
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::from(name);
    cookie.set_path("/");
    cookie
}
