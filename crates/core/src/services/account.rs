//! Account service: registration, login, token lifecycle, profile.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use playtube_common::{
    config::AuthConfig,
    crypto,
    storage::MediaStorage,
    AppError, AppResult, IdGenerator,
};
use playtube_db::{
    entities::user,
    repositories::{SubscriptionRepository, UserRepository, VideoRepository, WatchHistoryRepository},
};

use crate::services::mail::MailService;
use crate::services::video::VideoView;

/// Registration payload.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    /// Unique handle, stored lowercase.
    #[validate(length(min = 3, max = 30))]
    pub username: String,
    /// Email address.
    #[validate(email)]
    pub email: String,
    /// Display name.
    #[validate(length(min = 1))]
    pub full_name: String,
    /// Plain-text password.
    #[validate(length(min = 8))]
    pub password: String,
}

/// Account details update payload.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDetailsInput {
    /// New display name.
    #[validate(length(min = 1))]
    pub full_name: String,
    /// New email address.
    #[validate(email)]
    pub email: String,
}

/// Access/refresh token pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    /// Short-lived access JWT.
    pub access_token: String,
    /// Long-lived refresh JWT, also persisted on the user row.
    pub refresh_token: String,
}

/// Public view of a user, without credential fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub is_verified: bool,
    pub created_at: sea_orm::prelude::DateTimeWithTimeZone,
}

impl From<user::Model> for UserView {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            avatar_url: model.avatar_url,
            cover_image_url: model.cover_image_url,
            is_verified: model.is_verified,
            created_at: model.created_at,
        }
    }
}

/// Compact user reference embedded in enriched listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

impl From<&user::Model> for UserSummary {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id.clone(),
            username: model.username.clone(),
            full_name: model.full_name.clone(),
            avatar_url: model.avatar_url.clone(),
        }
    }
}

/// Channel profile with subscription aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(flatten)]
    pub user: UserView,
    /// How many users subscribe to this channel.
    pub subscribers_count: u64,
    /// How many channels this user subscribes to.
    pub channels_subscribed_to_count: u64,
    /// Whether the requesting user subscribes to this channel.
    pub is_subscribed: bool,
}

/// One watch history entry, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryVideo {
    #[serde(flatten)]
    pub video: VideoView,
    /// When the user first watched the video.
    pub watched_at: sea_orm::prelude::DateTimeWithTimeZone,
}

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    subscription_repo: SubscriptionRepository,
    video_repo: VideoRepository,
    watch_repo: WatchHistoryRepository,
    storage: Arc<dyn MediaStorage>,
    mail: Option<MailService>,
    auth: AuthConfig,
    server_url: String,
    id_gen: IdGenerator,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        subscription_repo: SubscriptionRepository,
        video_repo: VideoRepository,
        watch_repo: WatchHistoryRepository,
        storage: Arc<dyn MediaStorage>,
        auth: AuthConfig,
        server_url: String,
    ) -> Self {
        Self {
            user_repo,
            subscription_repo,
            video_repo,
            watch_repo,
            storage,
            mail: None,
            auth,
            server_url,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the mail service used for verification mails.
    pub fn set_mail(&mut self, mail: MailService) {
        self.mail = Some(mail);
    }

    /// Register a new user.
    ///
    /// An avatar upload is required, a cover image is optional. A verification
    /// mail is sent when the mail service is configured; mail failures are
    /// logged and never fail the registration.
    pub async fn register(
        &self,
        input: RegisterInput,
        avatar: (Vec<u8>, String),
        cover_image: Option<(Vec<u8>, String)>,
    ) -> AppResult<UserView> {
        input.validate()?;

        if self
            .user_repo
            .exists_by_username_or_email(&input.username, &input.email)
            .await?
        {
            return Err(AppError::Conflict(
                "Username or email already in use".to_string(),
            ));
        }

        let password_hash = crypto::hash_password(&input.password)?;

        let (avatar_data, avatar_type) = avatar;
        let avatar_key = self.media_key("avatars", &avatar_type);
        let avatar = self
            .storage
            .upload(&avatar_key, &avatar_data, &avatar_type)
            .await?;

        let cover_image_url = match cover_image {
            Some((data, content_type)) => {
                let key = self.media_key("covers", &content_type);
                Some(self.storage.upload(&key, &data, &content_type).await?.url)
            }
            None => None,
        };

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.to_lowercase()),
            email: Set(input.email.clone()),
            full_name: Set(input.full_name.clone()),
            password_hash: Set(password_hash),
            avatar_url: Set(avatar.url),
            cover_image_url: Set(cover_image_url),
            refresh_token: Set(None),
            is_verified: Set(false),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.user_repo.create(model).await?;

        if let Some(ref mail) = self.mail
            && let Err(e) = mail
                .send_verification(
                    &created.email,
                    &created.full_name,
                    &created.id,
                    &self.server_url,
                )
                .await
        {
            tracing::warn!(error = %e, user_id = %created.id, "Failed to send verification mail");
        }

        tracing::info!(user_id = %created.id, username = %created.username, "Registered user");
        Ok(created.into())
    }

    /// Log in with a username or email plus password.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> AppResult<(UserView, AuthTokens)> {
        let user = self
            .user_repo
            .find_by_username_or_email(identifier)
            .await?
            .ok_or_else(|| AppError::UserNotFound(identifier.to_string()))?;

        if !crypto::verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_tokens(&user)?;
        self.user_repo
            .set_refresh_token(&user.id, Some(tokens.refresh_token.clone()))
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user.into(), tokens))
    }

    /// Log out: clear the persisted refresh token, revoking all refreshes.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        self.user_repo.set_refresh_token(user_id, None).await
    }

    /// Rotate the token pair from a refresh token.
    ///
    /// The incoming token must verify against the refresh secret and match
    /// the value persisted on the user row exactly.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let claims = crypto::verify_refresh_token(refresh_token, &self.auth.refresh_token_secret)?;
        let user = self.user_repo.get_by_id(&claims.sub).await?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_tokens(&user)?;
        self.user_repo
            .set_refresh_token(&user.id, Some(tokens.refresh_token.clone()))
            .await?;

        Ok(tokens)
    }

    /// Change the password after verifying the old one.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if new_password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(user_id).await?;

        if !crypto::verify_password(old_password, &user.password_hash)? {
            return Err(AppError::BadRequest("Invalid old password".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            password_hash: Set(crypto::hash_password(new_password)?),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        self.user_repo.update(model).await?;
        Ok(())
    }

    /// Update display name and email.
    pub async fn update_details(
        &self,
        user_id: &str,
        input: UpdateDetailsInput,
    ) -> AppResult<UserView> {
        input.validate()?;

        if let Some(existing) = self.user_repo.find_by_email(&input.email).await?
            && existing.id != user_id
        {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            full_name: Set(input.full_name),
            email: Set(input.email),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        let updated = self.user_repo.update(model).await?;
        Ok(updated.into())
    }

    /// Replace the avatar image.
    pub async fn update_avatar(
        &self,
        user_id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> AppResult<UserView> {
        let key = self.media_key("avatars", content_type);
        let uploaded = self.storage.upload(&key, &data, content_type).await?;

        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            avatar_url: Set(uploaded.url),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        let updated = self.user_repo.update(model).await?;
        Ok(updated.into())
    }

    /// Replace the cover image.
    pub async fn update_cover_image(
        &self,
        user_id: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> AppResult<UserView> {
        let key = self.media_key("covers", content_type);
        let uploaded = self.storage.upload(&key, &data, content_type).await?;

        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            cover_image_url: Set(Some(uploaded.url)),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        let updated = self.user_repo.update(model).await?;
        Ok(updated.into())
    }

    /// Channel profile for a username, with subscription aggregates.
    pub async fn channel_profile(
        &self,
        username: &str,
        viewer_id: Option<&str>,
    ) -> AppResult<ChannelProfile> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))?;

        let subscribers_count = self.subscription_repo.count_subscribers(&user.id).await?;
        let channels_subscribed_to_count = self
            .subscription_repo
            .count_subscribed_channels(&user.id)
            .await?;

        let is_subscribed = match viewer_id {
            Some(viewer_id) => {
                self.subscription_repo
                    .is_subscribed(viewer_id, &user.id)
                    .await?
            }
            None => false,
        };

        Ok(ChannelProfile {
            user: user.into(),
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
        })
    }

    /// Watch history for a user, most recently watched first.
    pub async fn watch_history(&self, user_id: &str) -> AppResult<Vec<WatchHistoryVideo>> {
        let entries = self.watch_repo.find_by_user(user_id).await?;

        let video_ids: Vec<String> = entries.iter().map(|e| e.video_id.clone()).collect();
        let videos = self.video_repo.find_by_ids(&video_ids).await?;

        let owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
        let owners = self.user_repo.find_by_ids(&owner_ids).await?;

        let videos_by_id: std::collections::HashMap<_, _> =
            videos.into_iter().map(|v| (v.id.clone(), v)).collect();
        let owners_by_id: std::collections::HashMap<_, _> =
            owners.iter().map(|u| (u.id.clone(), UserSummary::from(u))).collect();

        // Entries whose video disappeared between reads are skipped.
        let history = entries
            .into_iter()
            .filter_map(|entry| {
                videos_by_id.get(&entry.video_id).map(|video| WatchHistoryVideo {
                    video: VideoView::from_model(
                        video.clone(),
                        owners_by_id.get(&video.owner_id).cloned(),
                    ),
                    watched_at: entry.watched_at,
                })
            })
            .collect();

        Ok(history)
    }

    /// Mark a user's mail address as verified.
    pub async fn verify_mail(&self, user_id: &str) -> AppResult<()> {
        // 404 for unknown IDs
        self.user_repo.get_by_id(user_id).await?;
        self.user_repo.set_verified(user_id).await?;

        tracing::info!(user_id = %user_id, "Verified mail address");
        Ok(())
    }

    /// Re-send the verification mail.
    pub async fn send_verification_mail(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let mail = self
            .mail
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("Mail service not configured".to_string()))?;

        mail.send_verification(&user.email, &user.full_name, &user.id, &self.server_url)
            .await
    }

    fn issue_tokens(&self, user: &user::Model) -> AppResult<AuthTokens> {
        let access_token = crypto::issue_access_token(
            &user.id,
            &user.username,
            &user.email,
            &self.auth.access_token_secret,
            self.auth.access_token_ttl_minutes,
        )?;
        let refresh_token = crypto::issue_refresh_token(
            &user.id,
            &self.auth.refresh_token_secret,
            self.auth.refresh_token_ttl_days,
        )?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
        })
    }

    fn media_key(&self, prefix: &str, content_type: &str) -> String {
        let ext = content_type.rsplit('/').next().unwrap_or("bin");
        format!("{prefix}/{}.{ext}", self.id_gen.generate())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use playtube_common::storage::LocalStorage;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::path::PathBuf;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            access_token_secret: "access-secret".to_string(),
            refresh_token_secret: "refresh-secret".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 10,
        }
    }

    fn create_test_user(id: &str, username: &str, password: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: "Test User".to_string(),
            password_hash: crypto::hash_password(password).unwrap(),
            avatar_url: "/media/avatar.png".to_string(),
            cover_image_url: None,
            refresh_token: None,
            is_verified: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(db: MockDatabase) -> AccountService {
        let conn = std::sync::Arc::new(db.into_connection());
        let empty = || std::sync::Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        AccountService::new(
            UserRepository::new(conn),
            SubscriptionRepository::new(empty()),
            VideoRepository::new(empty()),
            WatchHistoryRepository::new(empty()),
            Arc::new(LocalStorage::new(PathBuf::from("/tmp"), "/media".to_string())),
            test_auth_config(),
            "http://localhost:8000".to_string(),
        )
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let existing = create_test_user("u1", "alice", "password123");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]),
        );

        let input = RegisterInput {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            password: "password123".to_string(),
        };

        let result = service
            .register(input, (vec![1, 2, 3], "image/png".to_string()), None)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let input = RegisterInput {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            full_name: "Alice".to_string(),
            password: "password123".to_string(),
        };

        let result = service
            .register(input, (vec![1], "image/png".to_string()), None)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let result = service.login("ghost", "password123").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let user = create_test_user("u1", "alice", "password123");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]),
        );

        let result = service.login("alice", "wrong-password").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_success_returns_tokens() {
        let user = create_test_user("u1", "alice", "password123");
        let mut persisted = user.clone();
        persisted.refresh_token = Some("placeholder".to_string());

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[persisted]]),
        );

        let (view, tokens) = service.login("alice", "password123").await.unwrap();

        assert_eq!(view.username, "alice");
        let claims =
            crypto::verify_access_token(&tokens.access_token, "access-secret").unwrap();
        assert_eq!(claims.sub, "u1");
    }

    #[tokio::test]
    async fn test_refresh_rejects_mismatched_token() {
        let token = crypto::issue_refresh_token("u1", "refresh-secret", 10).unwrap();

        let mut user = create_test_user("u1", "alice", "password123");
        user.refresh_token = Some("a-different-token".to_string());

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]),
        );

        let result = service.refresh(&token).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_after_logout() {
        // Logout cleared the persisted token, so even a valid JWT is refused.
        let token = crypto::issue_refresh_token("u1", "refresh-secret", 10).unwrap();
        let user = create_test_user("u1", "alice", "password123");
        assert!(user.refresh_token.is_none());

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]),
        );

        let result = service.refresh(&token).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_update_details_rejects_taken_email() {
        let other = create_test_user("u2", "bob", "password123");

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[other]]),
        );

        let input = UpdateDetailsInput {
            full_name: "Alice".to_string(),
            email: "bob@example.com".to_string(),
        };

        let result = service.update_details("u1", input).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_details_allows_own_email() {
        let me = create_test_user("u1", "alice", "password123");
        let mut updated = me.clone();
        updated.full_name = "Alice Cooper".to_string();

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[me]])
                .append_query_results([[updated]]),
        );

        let input = UpdateDetailsInput {
            full_name: "Alice Cooper".to_string(),
            email: "alice@example.com".to_string(),
        };

        let view = service.update_details("u1", input).await.unwrap();

        assert_eq!(view.full_name, "Alice Cooper");
    }

    #[tokio::test]
    async fn test_refresh_rejects_garbage_token() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.refresh("not-a-jwt").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
