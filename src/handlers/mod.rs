pub mod announcement_handlers;
pub mod auth_handlers;
pub mod event_handlers;
pub mod member_handlers;
pub mod profile_handlers;
pub mod role_handlers;

use actix_web::{HttpRequest, HttpResponse, error, middleware::from_fn, web};

use crate::auth::middleware::require_auth;
use crate::errors::AppError;

/// Malformed JSON bodies answer with the same `{error}` shape as every
/// other failure.
fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::InvalidArgument(err.to_string()).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::InvalidArgument(err.to_string()).into()
}

/// GET /health
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Register every route. Public routes first; the protected scope matches
/// everything else, so anything mounted after it is unreachable.
pub fn configure(cfg: &mut web::ServiceConfig, max_photo_bytes: usize) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .route("/health", web::get().to(health))
        .route("/auth/login", web::get().to(auth_handlers::login))
        .route("/auth/callback", web::get().to(auth_handlers::callback))
        .service(
            web::scope("")
                .wrap(from_fn(require_auth))
                .route("/auth/me", web::get().to(auth_handlers::me))
                // Events: fixed segments before /events/{id}
                .route("/events", web::get().to(event_handlers::list))
                .route("/events", web::post().to(event_handlers::create))
                .route("/events", web::put().to(event_handlers::update))
                .route("/events/checkin/{id}", web::post().to(event_handlers::check_in))
                .route("/events/rsvp/{id}", web::post().to(event_handlers::rsvp))
                .route("/events/{id}", web::get().to(event_handlers::read))
                .route("/events/{id}", web::delete().to(event_handlers::delete))
                .route("/events/{id}/attendance", web::get().to(event_handlers::attendance))
                // Announcements
                .route("/announcements", web::get().to(announcement_handlers::list))
                .route("/announcements", web::post().to(announcement_handlers::create))
                .route("/announcements", web::put().to(announcement_handlers::update))
                .route("/announcements/{id}", web::get().to(announcement_handlers::read))
                .route("/announcements/{id}", web::delete().to(announcement_handlers::delete))
                // Member info
                .route("/members", web::get().to(member_handlers::list))
                .route("/members", web::post().to(member_handlers::create))
                .route("/members", web::put().to(member_handlers::update))
                .route("/members/{user_id}", web::get().to(member_handlers::read))
                .route("/members/{user_id}", web::delete().to(member_handlers::delete))
                // User roles
                .route("/roles", web::get().to(role_handlers::list))
                .route("/roles", web::post().to(role_handlers::create))
                .route("/roles", web::put().to(role_handlers::update))
                .route("/roles/user/{user_id}", web::get().to(role_handlers::for_user))
                .route("/roles/{id}", web::get().to(role_handlers::read))
                .route("/roles/{id}", web::delete().to(role_handlers::delete))
                // Profile photo
                .service(
                    web::resource("/profile/photo")
                        .app_data(web::PayloadConfig::new(max_photo_bytes))
                        .route(web::post().to(profile_handlers::upload_photo))
                        .route(web::delete().to(profile_handlers::remove_photo)),
                ),
        );
}
