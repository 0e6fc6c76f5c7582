/// HTTP request handlers
pub mod stories;

use actix_web::dev::HttpServiceFactory;
use actix_web::web;

use crate::config::AuthConfig;
use crate::middleware::AuthMiddleware;

/// Authentication entry point users are sent to when no identity is
/// attached. Owned by the external identity provider.
pub const LOGIN_PATH: &str = "/auth/login";

/// Post-mutation landing page, outside this service's surface.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// The `/stories` resource behind the auth gate. Literal segments are
/// registered ahead of `/{id}` so they are never swallowed by it.
pub fn stories_scope(auth: &AuthConfig) -> impl HttpServiceFactory {
    web::scope("/stories")
        .wrap(AuthMiddleware::new(auth))
        .route("/add", web::get().to(stories::add_story_form))
        .route("", web::post().to(stories::create_story))
        .route("", web::get().to(stories::list_stories))
        .route("/edit/{id}", web::get().to(stories::edit_story_form))
        .route("/likeStory/{id}", web::put().to(stories::like_story))
        .route("/user/{user_id}", web::get().to(stories::user_stories))
        .route("/{id}", web::get().to(stories::show_story))
        .route("/{id}", web::put().to(stories::update_story))
        .route("/{id}", web::delete().to(stories::delete_story))
}
