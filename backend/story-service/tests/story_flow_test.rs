//! Integration tests: story handler flows
//!
//! Drives the HTTP surface end-to-end with a containerized Postgres and a
//! recording image store in place of S3:
//! - auth gate redirect for anonymous requests
//! - create happy path and the no-file flash redirect
//! - private-story visibility (owner vs. non-owner)
//! - ownership rules on update and delete, including that a non-owner
//!   delete never reaches the media delegate
//! - like increment and redirect, including likes on private stories
//! - public and per-owner listing filters
mod common;

use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use common::{seed_user, setup_test_db, RecordingImageStore};
use story_service::config::AuthConfig;
use story_service::db::story_repo;
use story_service::handlers;
use story_service::middleware::mint_token;
use story_service::models::{Story, StoryDraft, StoryStatus};
use story_service::services::{ImageStore, StoredImage};

const SECRET: &str = "test-secret";
const BOUNDARY: &str = "----story-service-test-boundary";

fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: SECRET.to_string(),
    }
}

fn session_cookie(user_id: Uuid) -> Cookie<'static> {
    Cookie::new(
        "session",
        mint_token(SECRET, user_id, 3600).expect("mint token"),
    )
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_content_type() -> (header::HeaderName, String) {
    (
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    )
}

async fn seed_story(
    pool: &Pool<Postgres>,
    owner: Uuid,
    title: &str,
    status: StoryStatus,
) -> Story {
    let draft = StoryDraft::new(
        title,
        "seeded body",
        Some("teal"),
        None,
        None,
        Some(status.as_str()),
    )
    .expect("valid draft");
    let image = StoredImage {
        url: format!("http://images.test/stories/{}.jpg", Uuid::new_v4()),
        key: format!("stories/seed-{}.jpg", Uuid::new_v4()),
    };

    story_repo::create_story(pool, owner, &draft, &image)
        .await
        .expect("seed story")
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .expect("ascii location")
        .to_string()
}

macro_rules! build_app {
    ($pool:expr, $images:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new($images.clone()))
                .service(handlers::stories_scope(&auth_config())),
        )
        .await
    };
}

fn recording_store() -> (Arc<RecordingImageStore>, Arc<dyn ImageStore>) {
    let recorder = Arc::new(RecordingImageStore::default());
    let images: Arc<dyn ImageStore> = recorder.clone();
    (recorder, images)
}

#[tokio::test]
async fn anonymous_requests_redirect_to_login() {
    let pool = setup_test_db().await.expect("db");
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let req = test::TestRequest::get().uri("/stories").to_request();

    // The gate may short-circuit as an error or a ready response depending
    // on where the middleware sits; both must surface the login redirect.
    let (status, location) = match test::try_call_service(&app, req).await {
        Ok(resp) => (resp.status(), location(&resp)),
        Err(err) => {
            let resp = err.error_response();
            let loc = resp
                .headers()
                .get(header::LOCATION)
                .expect("Location header")
                .to_str()
                .unwrap()
                .to_string();
            (resp.status(), loc)
        }
    };

    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, "/auth/login");
}

#[tokio::test]
async fn create_stores_one_story_with_zero_likes_for_requester() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let (recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let body = multipart_body(
        &[
            ("title", "Woven shawl"),
            ("body", "Notes on the weave"),
            ("colors", "teal, cream"),
            ("patternType", "shawl"),
            ("patternLink", "https://example.com/p"),
            ("status", "public"),
        ],
        Some(("shawl.png", b"png-bytes")),
    );
    let req = test::TestRequest::post()
        .uri("/stories")
        .cookie(session_cookie(owner))
        .insert_header(multipart_content_type())
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let listed = story_repo::list_public_stories(&pool).await.expect("list");
    assert_eq!(listed.len(), 1);
    let story = &listed[0].story;
    assert_eq!(story.title, "Woven shawl");
    assert_eq!(story.likes, 0);
    assert_eq!(story.user_id, owner);
    assert_eq!(story.colors, vec!["teal", "cream"]);

    assert_eq!(recorder.uploaded(), vec!["image/png".to_string()]);
    assert_eq!(story.media_key, "stories/img-0.jpg");
}

#[tokio::test]
async fn create_without_file_flashes_and_creates_nothing() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let (recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let body = multipart_body(&[("title", "No image"), ("body", "text")], None);
    let req = test::TestRequest::post()
        .uri("/stories")
        .cookie(session_cookie(owner))
        .insert_header(multipart_content_type())
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/stories/add");

    let flash = resp
        .response()
        .cookies()
        .find(|c| c.name() == "flash")
        .expect("flash cookie");
    assert!(!flash.value().is_empty());

    assert!(story_repo::list_public_stories(&pool)
        .await
        .expect("list")
        .is_empty());
    assert!(recorder.uploaded().is_empty());
}

#[tokio::test]
async fn private_story_renders_not_found_for_non_owner() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let other = seed_user(&pool, "brin").await;
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let story = seed_story(&pool, owner, "Secret shawl", StoryStatus::Private).await;

    let req = test::TestRequest::get()
        .uri(&format!("/stories/{}", story.id))
        .cookie(session_cookie(owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = String::from_utf8_lossy(&test::read_body(resp).await).into_owned();
    assert!(page.contains("Secret shawl"));

    let req = test::TestRequest::get()
        .uri(&format!("/stories/{}", story.id))
        .cookie(session_cookie(other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let page = String::from_utf8_lossy(&test::read_body(resp).await).into_owned();
    assert!(!page.contains("Secret shawl"));
}

#[tokio::test]
async fn show_unknown_story_renders_not_found() {
    let pool = setup_test_db().await.expect("db");
    let viewer = seed_user(&pool, "ada").await;
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let req = test::TestRequest::get()
        .uri(&format!("/stories/{}", Uuid::new_v4()))
        .cookie(session_cookie(viewer))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_form_redirects_non_owner_away() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let other = seed_user(&pool, "brin").await;
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let story = seed_story(&pool, owner, "Editable", StoryStatus::Public).await;

    let req = test::TestRequest::get()
        .uri(&format!("/stories/edit/{}", story.id))
        .cookie(session_cookie(owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/stories/edit/{}", story.id))
        .cookie(session_cookie(other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/stories");
}

#[tokio::test]
async fn update_by_non_owner_leaves_record_unchanged() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let other = seed_user(&pool, "brin").await;
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let story = seed_story(&pool, owner, "Original", StoryStatus::Public).await;

    let req = test::TestRequest::put()
        .uri(&format!("/stories/{}", story.id))
        .cookie(session_cookie(other))
        .insert_header(header::ContentType::form_url_encoded())
        .set_payload("title=Hijacked&body=gone&status=private")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/stories");

    let unchanged = story_repo::find_story_by_id(&pool, story.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(unchanged.title, "Original");
    assert_eq!(unchanged.status, "public");
}

#[tokio::test]
async fn update_by_owner_replaces_fields_and_redirects_to_dashboard() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let story = seed_story(&pool, owner, "Original", StoryStatus::Public).await;

    let req = test::TestRequest::put()
        .uri(&format!("/stories/{}", story.id))
        .cookie(session_cookie(owner))
        .insert_header(header::ContentType::form_url_encoded())
        .set_payload("title=Renamed&body=fresh+body&colors=rust%2C+cream&status=private")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let updated = story_repo::find_story_by_id(&pool, story.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.body, "fresh body");
    assert_eq!(updated.colors, vec!["rust", "cream"]);
    assert_eq!(updated.status, "private");
    assert_eq!(updated.media_key, story.media_key);
}

#[tokio::test]
async fn update_with_invalid_status_renders_bad_request() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let story = seed_story(&pool, owner, "Original", StoryStatus::Public).await;

    let req = test::TestRequest::put()
        .uri(&format!("/stories/{}", story.id))
        .cookie(session_cookie(owner))
        .insert_header(header::ContentType::form_url_encoded())
        .set_payload("title=Renamed&body=x&status=unlisted")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_by_owner_releases_media_and_removes_record() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let (recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let story = seed_story(&pool, owner, "Doomed", StoryStatus::Public).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/stories/{}", story.id))
        .cookie(session_cookie(owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    assert_eq!(recorder.destroyed(), vec![story.media_key.clone()]);
    assert!(story_repo::find_story_by_id(&pool, story.id)
        .await
        .expect("find")
        .is_none());
}

#[tokio::test]
async fn delete_by_non_owner_never_reaches_the_media_delegate() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let other = seed_user(&pool, "brin").await;
    let (recorder, images) = recording_store();
    let app = build_app!(pool, images);

    let story = seed_story(&pool, owner, "Coveted", StoryStatus::Public).await;

    let req = test::TestRequest::delete()
        .uri(&format!("/stories/{}", story.id))
        .cookie(session_cookie(other))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/stories");

    assert!(recorder.destroyed().is_empty());
    assert!(story_repo::find_story_by_id(&pool, story.id)
        .await
        .expect("find")
        .is_some());
}

#[tokio::test]
async fn like_increments_once_and_redirects_to_detail() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let fan = seed_user(&pool, "brin").await;
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    // Visibility is deliberately not checked on this path: a private story
    // can be liked by any authenticated requester who knows its id.
    let story = seed_story(&pool, owner, "Liked", StoryStatus::Private).await;

    let req = test::TestRequest::put()
        .uri(&format!("/stories/likeStory/{}", story.id))
        .cookie(session_cookie(fan))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/stories/{}", story.id));

    let after = story_repo::find_story_by_id(&pool, story.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(after.likes, 1);
}

#[tokio::test]
async fn public_list_excludes_private_stories() {
    let pool = setup_test_db().await.expect("db");
    let owner = seed_user(&pool, "ada").await;
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    seed_story(&pool, owner, "Shown on the shelf", StoryStatus::Public).await;
    seed_story(&pool, owner, "Kept in the drawer", StoryStatus::Private).await;

    let req = test::TestRequest::get()
        .uri("/stories")
        .cookie(session_cookie(owner))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page = String::from_utf8_lossy(&test::read_body(resp).await).into_owned();
    assert!(page.contains("Shown on the shelf"));
    assert!(!page.contains("Kept in the drawer"));
}

#[tokio::test]
async fn owner_listing_filters_to_their_public_stories_even_for_the_owner() {
    let pool = setup_test_db().await.expect("db");
    let ada = seed_user(&pool, "ada").await;
    let brin = seed_user(&pool, "brin").await;
    let (_recorder, images) = recording_store();
    let app = build_app!(pool, images);

    seed_story(&pool, ada, "Ada public", StoryStatus::Public).await;
    seed_story(&pool, ada, "Ada private", StoryStatus::Private).await;
    seed_story(&pool, brin, "Brin public", StoryStatus::Public).await;

    // Even Ada viewing her own listing sees only her public stories.
    let req = test::TestRequest::get()
        .uri(&format!("/stories/user/{}", ada))
        .cookie(session_cookie(ada))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let page = String::from_utf8_lossy(&test::read_body(resp).await).into_owned();
    assert!(page.contains("Ada public"));
    assert!(!page.contains("Ada private"));
    assert!(!page.contains("Brin public"));
}
