use crate::models::{Story, StoryDraft, StoryWithAuthor};
use crate::services::media::StoredImage;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Create a new story owned by `user_id`; likes start at zero.
pub async fn create_story(
    pool: &PgPool,
    user_id: Uuid,
    draft: &StoryDraft,
    image: &StoredImage,
) -> Result<Story, sqlx::Error> {
    let story = sqlx::query_as::<_, Story>(
        r#"
        INSERT INTO stories (title, image_url, media_key, body, colors,
                             pattern_type, pattern_link, status, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, title, image_url, media_key, body, colors, likes,
                  pattern_type, pattern_link, status, user_id, created_at
        "#,
    )
    .bind(&draft.title)
    .bind(&image.url)
    .bind(&image.key)
    .bind(&draft.body)
    .bind(&draft.colors)
    .bind(&draft.pattern_type)
    .bind(&draft.pattern_link)
    .bind(draft.status.as_str())
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(story)
}

/// Find a story by ID
pub async fn find_story_by_id(pool: &PgPool, story_id: Uuid) -> Result<Option<Story>, sqlx::Error> {
    let story = sqlx::query_as::<_, Story>(
        r#"
        SELECT id, title, image_url, media_key, body, colors, likes,
               pattern_type, pattern_link, status, user_id, created_at
        FROM stories
        WHERE id = $1
        "#,
    )
    .bind(story_id)
    .fetch_optional(pool)
    .await?;

    Ok(story)
}

/// Find a story by ID with its author populated
pub async fn find_story_with_author(
    pool: &PgPool,
    story_id: Uuid,
) -> Result<Option<StoryWithAuthor>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT s.id, s.title, s.image_url, s.media_key, s.body, s.colors, s.likes,
               s.pattern_type, s.pattern_link, s.status, s.user_id, s.created_at,
               u.display_name
        FROM stories s
        JOIN users u ON u.id = s.user_id
        WHERE s.id = $1
        "#,
    )
    .bind(story_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_story_with_author))
}

/// All public stories with authors, newest first
pub async fn list_public_stories(pool: &PgPool) -> Result<Vec<StoryWithAuthor>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.title, s.image_url, s.media_key, s.body, s.colors, s.likes,
               s.pattern_type, s.pattern_link, s.status, s.user_id, s.created_at,
               u.display_name
        FROM stories s
        JOIN users u ON u.id = s.user_id
        WHERE s.status = 'public'
        ORDER BY s.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_story_with_author).collect())
}

/// A given owner's public stories with authors. Private stories are
/// excluded even when the owner is the one asking; this listing is the
/// public shelf, not the dashboard.
pub async fn list_public_stories_by_owner(
    pool: &PgPool,
    owner_id: Uuid,
) -> Result<Vec<StoryWithAuthor>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.title, s.image_url, s.media_key, s.body, s.colors, s.likes,
               s.pattern_type, s.pattern_link, s.status, s.user_id, s.created_at,
               u.display_name
        FROM stories s
        JOIN users u ON u.id = s.user_id
        WHERE s.user_id = $1 AND s.status = 'public'
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_story_with_author).collect())
}

/// Full replacement of the form-editable fields, revalidated upstream.
/// Image, media handle, likes, owner, and creation time are untouched.
pub async fn update_story(
    pool: &PgPool,
    story_id: Uuid,
    draft: &StoryDraft,
) -> Result<Option<Story>, sqlx::Error> {
    let story = sqlx::query_as::<_, Story>(
        r#"
        UPDATE stories
        SET title = $1, body = $2, colors = $3, pattern_type = $4,
            pattern_link = $5, status = $6
        WHERE id = $7
        RETURNING id, title, image_url, media_key, body, colors, likes,
                  pattern_type, pattern_link, status, user_id, created_at
        "#,
    )
    .bind(&draft.title)
    .bind(&draft.body)
    .bind(&draft.colors)
    .bind(&draft.pattern_type)
    .bind(&draft.pattern_link)
    .bind(draft.status.as_str())
    .bind(story_id)
    .fetch_optional(pool)
    .await?;

    Ok(story)
}

/// Atomic single-statement increment; concurrent likes never lose updates.
/// Returns the number of rows touched (zero when the id is unknown).
pub async fn increment_likes(pool: &PgPool, story_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE stories SET likes = likes + 1 WHERE id = $1")
        .bind(story_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Delete a story row. Returns false when the id is unknown.
pub async fn delete_story(pool: &PgPool, story_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stories WHERE id = $1")
        .bind(story_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn row_to_story_with_author(row: &PgRow) -> StoryWithAuthor {
    StoryWithAuthor {
        story: Story {
            id: row.get("id"),
            title: row.get("title"),
            image_url: row.get("image_url"),
            media_key: row.get("media_key"),
            body: row.get("body"),
            colors: row.get("colors"),
            likes: row.get("likes"),
            pattern_type: row.get("pattern_type"),
            pattern_link: row.get("pattern_link"),
            status: row.get("status"),
            user_id: row.get("user_id"),
            created_at: row.get("created_at"),
        },
        author_name: row.get("display_name"),
    }
}
