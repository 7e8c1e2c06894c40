use crate::helpers::{
    image_part, registration_form, spawn_app, spawn_app_with, token_settings, FakeMediaHost,
};
use account_server::configuration::TokenSettings;
use reqwest::multipart::Form;
use serde_json::Value;

#[tokio::test]
async fn register_returns_201_with_public_profile() {
    let app = spawn_app();

    let response = app
        .post_register(registration_form("Alice", "Alice@Example.com"))
        .await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["statusCode"], 201);
    assert_eq!(body["success"], true);

    let user = &body["data"];
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["fullName"], "Test User");
    assert!(user["avatar"].as_str().unwrap().starts_with("https://media.test/"));
    assert!(user["coverImage"].is_null());
    assert!(user.get("password").is_none());
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("refreshToken").is_none());

    assert_eq!(app.store.len(), 1);
    assert_eq!(app.media.upload_count(), 1);
}

#[tokio::test]
async fn register_uploads_optional_cover_image() {
    let app = spawn_app();

    let form = registration_form("carol", "carol@example.com")
        .part("coverImage", image_part("cover.jpg"));
    let response = app.post_register(form).await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["coverImage"]
        .as_str()
        .unwrap()
        .ends_with("cover.jpg"));
    assert_eq!(app.media.upload_count(), 2);
}

#[tokio::test]
async fn register_does_not_need_token_secrets() {
    let tokens = TokenSettings {
        access_token_secret: String::new(),
        refresh_token_secret: String::new(),
        ..token_settings()
    };
    let app = spawn_app_with(tokens, FakeMediaHost::accepting());

    let response = app
        .post_register(registration_form("nosecret", "nosecret@example.com"))
        .await;

    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn register_rejects_duplicate_username_ignoring_case() {
    let app = spawn_app();
    app.register("dave", "dave@example.com").await;

    let response = app
        .post_register(registration_form("DAVE", "other@example.com"))
        .await;

    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "User with this username already exists");
    assert_eq!(app.store.len(), 1);
    // The conflict is detected before anything is uploaded
    assert_eq!(app.media.upload_count(), 1);
}

#[tokio::test]
async fn register_rejects_duplicate_email_ignoring_case() {
    let app = spawn_app();
    app.register("erin", "erin@example.com").await;

    let response = app
        .post_register(registration_form("erin2", "ERIN@example.com"))
        .await;

    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User with this email already exists");
}

#[tokio::test]
async fn register_returns_400_when_a_field_is_missing() {
    let app = spawn_app();

    let test_cases = vec![
        (
            Form::new()
                .text("email", "a@example.com")
                .text("username", "abc")
                .text("password", "pw")
                .part("avatar", image_part("a.png")),
            "missing fullName",
        ),
        (
            Form::new()
                .text("fullName", "   ")
                .text("email", "a@example.com")
                .text("username", "abc")
                .text("password", "pw")
                .part("avatar", image_part("a.png")),
            "blank fullName",
        ),
        (
            Form::new()
                .text("fullName", "A")
                .text("username", "abc")
                .text("password", "pw")
                .part("avatar", image_part("a.png")),
            "missing email",
        ),
        (
            Form::new()
                .text("fullName", "A")
                .text("email", "a@example.com")
                .text("password", "pw")
                .part("avatar", image_part("a.png")),
            "missing username",
        ),
        (
            Form::new()
                .text("fullName", "A")
                .text("email", "a@example.com")
                .text("username", "abc")
                .part("avatar", image_part("a.png")),
            "missing password",
        ),
    ];

    for (form, description) in test_cases {
        let response = app.post_register(form).await;
        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 when the payload was {}.",
            description
        );
    }

    assert!(app.store.is_empty());
    assert_eq!(app.media.upload_count(), 0);
}

#[tokio::test]
async fn register_returns_400_without_avatar() {
    let app = spawn_app();

    let form = Form::new()
        .text("fullName", "No Avatar")
        .text("email", "noavatar@example.com")
        .text("username", "noavatar")
        .text("password", "pw")
        .part("coverImage", image_part("cover.png"));
    let response = app.post_register(form).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Avatar file is missing");
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn register_returns_400_for_invalid_email_or_username() {
    let app = spawn_app();

    for (username, email) in [("validname", "not-an-email"), ("no spaces!", "ok@example.com")] {
        let response = app.post_register(registration_form(username, email)).await;
        assert_eq!(response.status().as_u16(), 400);
    }
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn register_returns_400_when_media_host_rejects_avatar() {
    let app = spawn_app_with(token_settings(), FakeMediaHost::rejecting());

    let response = app
        .post_register(registration_form("frank", "frank@example.com"))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Error while uploading file");
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn staged_files_are_removed_after_the_request() {
    let app = spawn_app();

    let form = registration_form("grace", "grace@example.com")
        .part("coverImage", image_part("cover.png"));
    let response = app.post_register(form).await;
    assert_eq!(response.status().as_u16(), 201);
    assert_eq!(app.staged_file_count(), 0);

    // Failure path: the duplicate is rejected and its files are still cleaned up
    let response = app
        .post_register(registration_form("grace", "grace2@example.com"))
        .await;
    assert_eq!(response.status().as_u16(), 409);
    assert_eq!(app.staged_file_count(), 0);
}
