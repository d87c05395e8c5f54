use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, middleware, web};

use chapter_portal::config::AppConfig;
use chapter_portal::{build_state, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("{e}");
        std::io::Error::other(e.to_string())
    })?;

    let state = build_state(&config).await.map_err(|e| {
        log::error!("Startup failed: {e}");
        std::io::Error::other(e.to_string())
    })?;

    let secret_key = config.cookie_key();
    let secure_cookies = config.public_url.starts_with("https://");
    let upload_dir = config.upload_dir.clone();
    let max_photo_bytes = config.max_photo_bytes;
    let state = web::Data::new(state);

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        // Holds only the pending OAuth state and PKCE verifier.
        let session_mw =
            SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                .cookie_secure(secure_cookies)
                .cookie_http_only(true)
                .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            // Uploaded objects; must precede the protected catch-all scope
            .service(actix_files::Files::new("/storage", upload_dir.clone()))
            .configure(|cfg| handlers::configure(cfg, max_photo_bytes))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
