/// Template registry and render helpers
///
/// Templates are embedded into the binary and compiled once into a shared
/// Tera instance. Handlers produce either a rendered page or a redirect;
/// the flash message for the add-form round trip rides a short-lived
/// cookie.
use actix_web::cookie::{time::Duration, Cookie};
use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use once_cell::sync::Lazy;
use tera::{Context, Tera};

const FLASH_COOKIE: &str = "flash";

static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("layout.html", include_str!("../../templates/layout.html")),
        (
            "stories/index.html",
            include_str!("../../templates/stories/index.html"),
        ),
        (
            "stories/show.html",
            include_str!("../../templates/stories/show.html"),
        ),
        (
            "stories/add.html",
            include_str!("../../templates/stories/add.html"),
        ),
        (
            "stories/edit.html",
            include_str!("../../templates/stories/edit.html"),
        ),
        (
            "error/400.html",
            include_str!("../../templates/error/400.html"),
        ),
        (
            "error/404.html",
            include_str!("../../templates/error/404.html"),
        ),
        (
            "error/500.html",
            include_str!("../../templates/error/500.html"),
        ),
    ])
    .expect("embedded templates must parse");
    tera
});

/// Render a template into a 200 text/html response.
pub fn page(name: &str, ctx: &Context) -> crate::Result<HttpResponse> {
    let body = TEMPLATES.render(name, ctx)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// Render the error page matching `status`. Falls back to a plain body if
/// the template itself fails, so error reporting can never recurse.
pub fn error_page(status: StatusCode) -> HttpResponse {
    let name = match status {
        StatusCode::NOT_FOUND => "error/404.html",
        StatusCode::BAD_REQUEST => "error/400.html",
        _ => "error/500.html",
    };

    let body = TEMPLATES
        .render(name, &Context::new())
        .unwrap_or_else(|err| {
            tracing::error!("error template {} failed to render: {}", name, err);
            format!("{}", status)
        });

    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// 303 redirect; PUT/DELETE form submissions must not be replayed against
/// the redirect target.
pub fn redirect(path: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, path))
        .finish()
}

/// Redirect carrying a one-shot flash message for the target page.
pub fn redirect_with_flash(path: &str, message: &str) -> HttpResponse {
    let cookie = Cookie::build(FLASH_COOKIE, urlencoding::encode(message).into_owned())
        .path("/")
        .http_only(true)
        .max_age(Duration::minutes(5))
        .finish();

    HttpResponse::SeeOther()
        .insert_header((LOCATION, path))
        .cookie(cookie)
        .finish()
}

/// Read and decode the pending flash message, if any.
pub fn take_flash(req: &HttpRequest) -> Option<String> {
    let cookie = req.cookie(FLASH_COOKIE)?;
    Some(urlencoding::decode(cookie.value()).ok()?.into_owned())
}

/// Expired cookie that clears a consumed flash message.
pub fn clear_flash_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    cookie
}
