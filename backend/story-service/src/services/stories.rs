use std::path::Path;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::story_repo;
use crate::error::{AppError, Result};
use crate::models::{Story, StoryDraft, StoryWithAuthor};
use crate::services::media::ImageStore;

/// Outcome of an ownership-gated operation. An absent record is an
/// `AppError::NotFound` instead; `NotOwner` means the record exists but
/// belongs to someone else, which handlers surface as a redirect rather
/// than a page (the record's existence is already public knowledge on
/// these paths).
pub enum OwnerGate {
    Owned(Story),
    NotOwner,
}

pub struct StoryService {
    pool: PgPool,
    images: Arc<dyn ImageStore>,
}

impl StoryService {
    pub fn new(pool: PgPool, images: Arc<dyn ImageStore>) -> Self {
        Self { pool, images }
    }

    /// Upload the image, then create the record. No record is ever created
    /// without a stored image; if the insert fails after the upload
    /// succeeded, the fresh object is destroyed on a best-effort basis so
    /// media is not orphaned.
    pub async fn create_story(
        &self,
        user_id: Uuid,
        draft: &StoryDraft,
        local_path: &Path,
        content_type: &str,
    ) -> Result<Story> {
        let image = self.images.upload(local_path, content_type).await?;

        match story_repo::create_story(&self.pool, user_id, draft, &image).await {
            Ok(story) => {
                tracing::info!(story_id = %story.id, %user_id, "story created");
                Ok(story)
            }
            Err(err) => {
                if let Err(cleanup_err) = self.images.destroy(&image.key).await {
                    tracing::warn!(
                        key = %image.key,
                        "failed to clean up image after aborted create: {}",
                        cleanup_err
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Fetch a story for a viewer. Private stories are indistinguishable
    /// from absent ones for everyone but their owner.
    pub async fn visible_story(&self, story_id: Uuid, viewer_id: Uuid) -> Result<StoryWithAuthor> {
        let story = story_repo::find_story_with_author(&self.pool, story_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if story.story.is_private() && !story.story.is_owned_by(viewer_id) {
            return Err(AppError::NotFound);
        }

        Ok(story)
    }

    pub async fn list_public(&self) -> Result<Vec<StoryWithAuthor>> {
        Ok(story_repo::list_public_stories(&self.pool).await?)
    }

    pub async fn list_owner_public(&self, owner_id: Uuid) -> Result<Vec<StoryWithAuthor>> {
        Ok(story_repo::list_public_stories_by_owner(&self.pool, owner_id).await?)
    }

    /// Fetch a story for an owner-only operation (edit form).
    pub async fn owned_story(&self, story_id: Uuid, user_id: Uuid) -> Result<OwnerGate> {
        let story = story_repo::find_story_by_id(&self.pool, story_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !story.is_owned_by(user_id) {
            return Ok(OwnerGate::NotOwner);
        }

        Ok(OwnerGate::Owned(story))
    }

    /// Full-replacement update of the form-editable fields. Non-owners
    /// leave the record untouched.
    pub async fn update_story(
        &self,
        story_id: Uuid,
        user_id: Uuid,
        draft: &StoryDraft,
    ) -> Result<OwnerGate> {
        match self.owned_story(story_id, user_id).await? {
            OwnerGate::NotOwner => Ok(OwnerGate::NotOwner),
            OwnerGate::Owned(_) => {
                let updated = story_repo::update_story(&self.pool, story_id, draft)
                    .await?
                    .ok_or(AppError::NotFound)?;
                Ok(OwnerGate::Owned(updated))
            }
        }
    }

    /// Delete a story. Ownership is verified before anything irreversible
    /// happens: a non-owner request leaves both the record and the remote
    /// media untouched. For the owner, the remote image is released first;
    /// a destroy failure is logged but does not block the row deletion.
    pub async fn delete_story(&self, story_id: Uuid, user_id: Uuid) -> Result<OwnerGate> {
        let story = match self.owned_story(story_id, user_id).await? {
            OwnerGate::NotOwner => return Ok(OwnerGate::NotOwner),
            OwnerGate::Owned(story) => story,
        };

        match self.images.destroy(&story.media_key).await {
            Ok(outcome) => {
                tracing::debug!(key = %story.media_key, ?outcome, "story image released");
            }
            Err(err) => {
                tracing::warn!(
                    key = %story.media_key,
                    "failed to release story image, deleting record anyway: {}",
                    err
                );
            }
        }

        story_repo::delete_story(&self.pool, story_id).await?;
        tracing::info!(%story_id, %user_id, "story deleted");

        Ok(OwnerGate::Owned(story))
    }

    /// Atomic like increment. No ownership or visibility check by design:
    /// any authenticated requester may like any story id. An unknown id is
    /// a no-op on this path.
    pub async fn like_story(&self, story_id: Uuid) -> Result<()> {
        let touched = story_repo::increment_likes(&self.pool, story_id).await?;
        if touched == 0 {
            tracing::debug!(%story_id, "like for unknown story ignored");
        }
        Ok(())
    }
}
