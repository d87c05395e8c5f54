//! Profile photo upload tests against a temporary upload directory.

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;

use chapter_portal::auth::principal::Role;
use chapter_portal::provider::Table;
use common::*;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";

fn stored_path(h: &Harness, url: &str) -> std::path::PathBuf {
    let relative = url
        .strip_prefix(&format!("{STORAGE_URL}/"))
        .expect("url under storage base");
    h.uploads.path().join(relative)
}

#[actix_web::test]
async fn test_upload_stores_object_and_updates_profile() {
    let h = Harness::new();
    let app = init_app!(h);
    let user = h.add_user(Some(Role::Student));

    let req = test::TestRequest::post()
        .uri("/profile/photo")
        .insert_header(h.bearer(user))
        .insert_header(("Content-Type", "image/png"))
        .set_payload(PNG)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let url = body["profile_photo_url"].as_str().unwrap().to_string();
    assert!(url.starts_with(&format!("{STORAGE_URL}/avatars/{user}/")));
    assert!(url.ends_with(".png"));
    assert_eq!(std::fs::read(stored_path(&h, &url)).unwrap(), PNG);
    assert_eq!(h.provider.rows(Table::Users)[0]["profile_photo_url"], url.as_str());
}

#[actix_web::test]
async fn test_replacing_photo_removes_previous_object() {
    let h = Harness::new();
    let app = init_app!(h);
    let user = h.add_user(Some(Role::Student));

    let mut urls = Vec::new();
    for content_type in ["image/png", "image/webp"] {
        let req = test::TestRequest::post()
            .uri("/profile/photo")
            .insert_header(h.bearer(user))
            .insert_header(("Content-Type", content_type))
            .set_payload(PNG)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        urls.push(body["profile_photo_url"].as_str().unwrap().to_string());
    }

    assert_ne!(urls[0], urls[1]);
    assert!(!stored_path(&h, &urls[0]).exists());
    assert!(stored_path(&h, &urls[1]).exists());
}

#[actix_web::test]
async fn test_rejects_unsupported_or_empty_uploads() {
    let h = Harness::new();
    let app = init_app!(h);
    let user = h.add_user(Some(Role::Student));

    let cases: [(&str, &'static [u8]); 3] = [
        ("image/gif", PNG),
        ("image/png", b""),
        ("text/plain", b"hello"),
    ];
    for (content_type, payload) in cases {
        let req = test::TestRequest::post()
            .uri("/profile/photo")
            .insert_header(h.bearer(user))
            .insert_header(("Content-Type", content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{content_type}");
    }
    assert!(h.provider.rows(Table::Users)[0]["profile_photo_url"].is_null());
}

#[actix_web::test]
async fn test_oversized_upload_is_refused() {
    let h = Harness::new();
    let app = init_app!(h);
    let user = h.add_user(Some(Role::Student));

    let req = test::TestRequest::post()
        .uri("/profile/photo")
        .insert_header(h.bearer(user))
        .insert_header(("Content-Type", "image/png"))
        .set_payload(vec![0u8; MAX_PHOTO_BYTES + 1])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
    assert!(h.provider.rows(Table::Users)[0]["profile_photo_url"].is_null());
}

#[actix_web::test]
async fn test_delete_clears_photo() {
    let h = Harness::new();
    let app = init_app!(h);
    let user = h.add_user(Some(Role::Student));

    let req = test::TestRequest::post()
        .uri("/profile/photo")
        .insert_header(h.bearer(user))
        .insert_header(("Content-Type", "image/jpeg"))
        .set_payload(PNG)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let url = body["profile_photo_url"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri("/profile/photo")
        .insert_header(h.bearer(user))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["profile_photo_url"].is_null());
    assert!(!stored_path(&h, &url).exists());
}
