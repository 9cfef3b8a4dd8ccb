//! Comment service.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use playtube_common::{AppError, AppResult, IdGenerator};
use playtube_db::{
    entities::comment,
    repositories::{CommentRepository, LikeRepository, UserRepository, VideoRepository},
};

use crate::services::account::UserSummary;

/// Payload for adding or editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentInput {
    /// Comment text.
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Comment with owner and like aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub video_id: String,
    /// Owner summary; absent when the owner row is gone.
    pub owner: Option<UserSummary>,
    pub likes_count: u64,
    pub is_liked: bool,
    pub created_at: sea_orm::prelude::DateTimeWithTimeZone,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    video_repo: VideoRepository,
    user_repo: UserRepository,
    like_repo: LikeRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        video_repo: VideoRepository,
        user_repo: UserRepository,
        like_repo: LikeRepository,
    ) -> Self {
        Self {
            comment_repo,
            video_repo,
            user_repo,
            like_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comments on a video, newest first, paginated and enriched.
    ///
    /// Returns the page of comments plus the total page count.
    pub async fn list_by_video(
        &self,
        video_id: &str,
        viewer_id: Option<&str>,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<CommentView>, u64)> {
        // Listing a missing video's comments is a 404, not an empty page.
        self.video_repo.get_by_id(video_id).await?;

        let (comments, total_pages) = self
            .comment_repo
            .find_by_video(video_id, page.max(1), limit.clamp(1, 100))
            .await?;

        let comment_ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();
        let likes = self.like_repo.find_for_comments(&comment_ids).await?;

        let owner_ids: Vec<String> = comments.iter().map(|c| c.owner_id.clone()).collect();
        let owners = self.user_repo.find_by_ids(&owner_ids).await?;
        let owners_by_id: HashMap<_, _> = owners
            .iter()
            .map(|u| (u.id.clone(), UserSummary::from(u)))
            .collect();

        let mut like_counts: HashMap<String, u64> = HashMap::new();
        let mut liked_by_viewer: std::collections::HashSet<String> =
            std::collections::HashSet::new();
        for like in likes {
            if let Some(comment_id) = like.comment_id {
                *like_counts.entry(comment_id.clone()).or_default() += 1;
                if viewer_id == Some(like.liked_by.as_str()) {
                    liked_by_viewer.insert(comment_id);
                }
            }
        }

        let views = comments
            .into_iter()
            .map(|c| CommentView {
                likes_count: like_counts.get(&c.id).copied().unwrap_or(0),
                is_liked: liked_by_viewer.contains(&c.id),
                owner: owners_by_id.get(&c.owner_id).cloned(),
                id: c.id,
                content: c.content,
                video_id: c.video_id,
                created_at: c.created_at,
            })
            .collect();

        Ok((views, total_pages))
    }

    /// Add a comment to a video.
    pub async fn add(
        &self,
        user_id: &str,
        video_id: &str,
        input: AddCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        // Commenting on a missing video is a 404.
        self.video_repo.get_by_id(video_id).await?;

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            content: Set(input.content),
            video_id: Set(video_id.to_string()),
            owner_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.comment_repo.create(model).await
    }

    /// Edit a comment. Owner only.
    pub async fn update(
        &self,
        user_id: &str,
        comment_id: &str,
        input: AddCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let comment = self.owned_comment(user_id, comment_id).await?;

        let model = comment::ActiveModel {
            id: Set(comment.id),
            content: Set(input.content),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        self.comment_repo.update(model).await
    }

    /// Delete a comment. Owner only. Likes cascade at the storage layer.
    pub async fn delete(&self, user_id: &str, comment_id: &str) -> AppResult<()> {
        self.owned_comment(user_id, comment_id).await?;
        self.comment_repo.delete(comment_id).await?;
        Ok(())
    }

    async fn owned_comment(&self, user_id: &str, comment_id: &str) -> AppResult<comment::Model> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        if comment.owner_id != user_id {
            return Err(AppError::Forbidden(
                "Only the owner can modify this comment".to_string(),
            ));
        }

        Ok(comment)
    }
}
