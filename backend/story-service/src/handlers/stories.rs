/// Story handlers - HTTP endpoints for the story resource
///
/// Every handler resolves to a rendered page or a redirect. Failures are
/// converted at this boundary by `AppError`'s response mapping: absent
/// records become the not-found page, bad input becomes the bad-request
/// page, and everything else becomes the server-error page.
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use sqlx::PgPool;
use tempfile::NamedTempFile;
use tera::Context;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::handlers::DASHBOARD_PATH;
use crate::middleware::UserId;
use crate::models::{StoryDraft, StoryUpdateForm};
use crate::services::media::{content_type_for, ImageStore};
use crate::services::{OwnerGate, StoryService};
use crate::views;

const STORIES_PATH: &str = "/stories";
const ADD_FORM_PATH: &str = "/stories/add";

/// Uploads above this size are rejected before touching the image store.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

fn service(pool: &web::Data<PgPool>, images: &web::Data<Arc<dyn ImageStore>>) -> StoryService {
    StoryService::new(pool.get_ref().clone(), images.get_ref().clone())
}

fn parse_story_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("invalid story id '{}'", raw)))
}

/// Show add page
/// GET /stories/add
pub async fn add_story_form(req: HttpRequest) -> Result<HttpResponse> {
    let flash = views::take_flash(&req);

    let mut ctx = Context::new();
    ctx.insert("flash", &flash);
    let mut response = views::page("stories/add.html", &ctx)?;

    if flash.is_some() {
        response
            .add_cookie(&views::clear_flash_cookie())
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    Ok(response)
}

/// Process add form (multipart body with file + fields)
/// POST /stories
pub async fn create_story(
    pool: web::Data<PgPool>,
    images: web::Data<Arc<dyn ImageStore>>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let (fields, file) = read_story_form(payload).await?;

    let Some(upload) = file else {
        return Ok(views::redirect_with_flash(ADD_FORM_PATH, "No file selected."));
    };

    let draft = draft_from_fields(&fields)?;

    service(&pool, &images)
        .create_story(user_id.0, &draft, upload.file.path(), &upload.content_type)
        .await?;

    Ok(views::redirect(DASHBOARD_PATH))
}

/// Show all public stories, newest first
/// GET /stories
pub async fn list_stories(
    pool: web::Data<PgPool>,
    images: web::Data<Arc<dyn ImageStore>>,
    _user_id: UserId,
) -> Result<HttpResponse> {
    let stories = service(&pool, &images).list_public().await?;

    let mut ctx = Context::new();
    ctx.insert("stories", &stories);
    views::page("stories/index.html", &ctx)
}

/// Show single story; private stories render not-found for non-owners
/// GET /stories/{id}
pub async fn show_story(
    pool: web::Data<PgPool>,
    images: web::Data<Arc<dyn ImageStore>>,
    user_id: UserId,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let story_id = parse_story_id(&id)?;
    let story = service(&pool, &images)
        .visible_story(story_id, user_id.0)
        .await?;

    let mut ctx = Context::new();
    ctx.insert("story", &story);
    views::page("stories/show.html", &ctx)
}

/// Show edit page; non-owners are redirected to the story list
/// GET /stories/edit/{id}
pub async fn edit_story_form(
    pool: web::Data<PgPool>,
    images: web::Data<Arc<dyn ImageStore>>,
    user_id: UserId,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let story_id = parse_story_id(&id)?;

    match service(&pool, &images).owned_story(story_id, user_id.0).await? {
        OwnerGate::NotOwner => Ok(views::redirect(STORIES_PATH)),
        OwnerGate::Owned(story) => {
            let mut ctx = Context::new();
            ctx.insert("story", &story);
            views::page("stories/edit.html", &ctx)
        }
    }
}

/// Update story: full field replacement with revalidation; media untouched
/// PUT /stories/{id}
pub async fn update_story(
    pool: web::Data<PgPool>,
    images: web::Data<Arc<dyn ImageStore>>,
    user_id: UserId,
    id: web::Path<String>,
    form: web::Form<StoryUpdateForm>,
) -> Result<HttpResponse> {
    let story_id = parse_story_id(&id)?;
    let draft = StoryDraft::try_from(form.into_inner())?;

    match service(&pool, &images)
        .update_story(story_id, user_id.0, &draft)
        .await?
    {
        OwnerGate::NotOwner => Ok(views::redirect(STORIES_PATH)),
        OwnerGate::Owned(_) => Ok(views::redirect(DASHBOARD_PATH)),
    }
}

/// Delete story and release its remote image
/// DELETE /stories/{id}
pub async fn delete_story(
    pool: web::Data<PgPool>,
    images: web::Data<Arc<dyn ImageStore>>,
    user_id: UserId,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let story_id = parse_story_id(&id)?;

    match service(&pool, &images)
        .delete_story(story_id, user_id.0)
        .await?
    {
        OwnerGate::NotOwner => Ok(views::redirect(STORIES_PATH)),
        OwnerGate::Owned(_) => Ok(views::redirect(DASHBOARD_PATH)),
    }
}

/// Like a story: atomic increment, no visibility check
/// PUT /stories/likeStory/{id}
pub async fn like_story(
    pool: web::Data<PgPool>,
    images: web::Data<Arc<dyn ImageStore>>,
    _user_id: UserId,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let story_id = parse_story_id(&id)?;
    service(&pool, &images).like_story(story_id).await?;

    Ok(views::redirect(&format!("/stories/{}", story_id)))
}

/// A given user's public stories (private ones excluded even for the owner)
/// GET /stories/user/{user_id}
pub async fn user_stories(
    pool: web::Data<PgPool>,
    images: web::Data<Arc<dyn ImageStore>>,
    _user_id: UserId,
    owner_id: web::Path<String>,
) -> Result<HttpResponse> {
    let owner_id = Uuid::parse_str(&owner_id)
        .map_err(|_| AppError::Validation(format!("invalid user id '{}'", owner_id)))?;

    let stories = service(&pool, &images).list_owner_public(owner_id).await?;

    let mut ctx = Context::new();
    ctx.insert("stories", &stories);
    views::page("stories/index.html", &ctx)
}

// =====================================================================
// Multipart form intake
// =====================================================================

struct FileUpload {
    file: NamedTempFile,
    content_type: String,
}

/// Drain the multipart stream: text fields into a map, the image field
/// spooled to a temp file. A file part with no filename or no bytes counts
/// as "no file selected".
async fn read_story_form(
    mut payload: Multipart,
) -> Result<(HashMap<String, String>, Option<FileUpload>)> {
    let mut fields = HashMap::new();
    let mut file: Option<FileUpload> = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::Validation(format!("malformed upload: {}", e)))?;

        let (name, filename) = {
            let Some(cd) = field.content_disposition() else {
                continue;
            };
            (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            )
        };
        let Some(name) = name else { continue };

        if name == "file" {
            let Some(filename) = filename.filter(|f| !f.is_empty()) else {
                drain_field(&mut field).await?;
                continue;
            };

            if let Some(mime_type) = field.content_type() {
                if mime_type.type_() != mime::IMAGE {
                    return Err(AppError::Validation(format!(
                        "unsupported upload type '{}'",
                        mime_type
                    )));
                }
            }

            let content_type = content_type_for(&filename).ok_or_else(|| {
                AppError::Validation(format!("unsupported image file '{}'", filename))
            })?;

            let mut tmp = NamedTempFile::new()
                .map_err(|e| AppError::Internal(format!("temp file creation failed: {}", e)))?;
            let mut total_bytes: usize = 0;

            while let Some(chunk) = field.next().await {
                let bytes =
                    chunk.map_err(|e| AppError::Validation(format!("upload aborted: {}", e)))?;
                total_bytes += bytes.len();
                if total_bytes > MAX_UPLOAD_BYTES {
                    return Err(AppError::Validation("image exceeds the 10 MB limit".into()));
                }
                tmp.write_all(&bytes)
                    .map_err(|e| AppError::Internal(format!("temp file write failed: {}", e)))?;
            }

            if total_bytes > 0 {
                file = Some(FileUpload {
                    file: tmp,
                    content_type: content_type.to_string(),
                });
            }
        } else {
            let mut value = Vec::new();
            while let Some(chunk) = field.next().await {
                let bytes =
                    chunk.map_err(|e| AppError::Validation(format!("upload aborted: {}", e)))?;
                value.extend_from_slice(&bytes);
                if value.len() > MAX_UPLOAD_BYTES {
                    return Err(AppError::Validation("form field too large".into()));
                }
            }
            fields.insert(name, String::from_utf8_lossy(&value).into_owned());
        }
    }

    Ok((fields, file))
}

async fn drain_field(field: &mut actix_multipart::Field) -> Result<()> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| AppError::Validation(format!("upload aborted: {}", e)))?;
    }
    Ok(())
}

fn draft_from_fields(fields: &HashMap<String, String>) -> Result<StoryDraft> {
    StoryDraft::new(
        fields.get("title").map(String::as_str).unwrap_or_default(),
        fields.get("body").map(String::as_str).unwrap_or_default(),
        fields.get("colors").map(String::as_str),
        fields.get("patternType").map(String::as_str),
        fields.get("patternLink").map(String::as_str),
        fields.get("status").map(String::as_str),
    )
}
