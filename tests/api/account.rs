use crate::helpers::{image_part, spawn_app, PASSWORD};
use reqwest::multipart::Form;
use serde_json::{json, Value};

#[tokio::test]
async fn change_password_requires_the_old_password() {
    let app = spawn_app();
    app.register("alice", "alice@example.com").await;
    let session = app.login("alice@example.com").await;

    let response = app
        .client
        .post(app.url("/change-password"))
        .bearer_auth(&session.access_token)
        .json(&json!({ "oldPassword": "not it", "newPassword": "brand new secret" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid old password");

    // Nothing changed
    assert_eq!(app.post_login("alice@example.com", PASSWORD).await.status().as_u16(), 200);
}

#[tokio::test]
async fn change_password_replaces_the_credential() {
    let app = spawn_app();
    app.register("bob", "bob@example.com").await;
    let session = app.login("bob@example.com").await;

    let response = app
        .client
        .post(app.url("/change-password"))
        .bearer_auth(&session.access_token)
        .json(&json!({ "oldPassword": PASSWORD, "newPassword": "brand new secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    assert_eq!(app.post_login("bob@example.com", PASSWORD).await.status().as_u16(), 401);
    assert_eq!(
        app.post_login("bob@example.com", "brand new secret")
            .await
            .status()
            .as_u16(),
        200
    );
}

#[tokio::test]
async fn update_account_merges_given_fields() {
    let app = spawn_app();
    app.register("carol", "carol@example.com").await;
    let session = app.login("carol@example.com").await;

    let response = app
        .client
        .patch(app.url("/update-account"))
        .bearer_auth(&session.access_token)
        .json(&json!({ "fullName": "Carol Danvers" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["fullName"], "Carol Danvers");
    assert_eq!(body["data"]["email"], "carol@example.com");

    let response = app
        .client
        .patch(app.url("/update-account"))
        .bearer_auth(&session.access_token)
        .json(&json!({ "email": "Captain@Example.com" }))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["fullName"], "Carol Danvers");
    assert_eq!(body["data"]["email"], "captain@example.com");
}

#[tokio::test]
async fn update_account_rejects_empty_payload_and_taken_email() {
    let app = spawn_app();
    app.register("dave", "dave@example.com").await;
    app.register("erin", "erin@example.com").await;
    let session = app.login("dave@example.com").await;

    let empty = app
        .client
        .patch(app.url("/update-account"))
        .bearer_auth(&session.access_token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status().as_u16(), 400);

    let taken = app
        .client
        .patch(app.url("/update-account"))
        .bearer_auth(&session.access_token)
        .json(&json!({ "email": "erin@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(taken.status().as_u16(), 409);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = spawn_app();

    let response = app
        .client
        .post(app.url("/login"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn avatar_and_cover_image_can_be_replaced() {
    let app = spawn_app();
    let registered = app.register("frank", "frank@example.com").await;
    let session = app.login("frank@example.com").await;

    let response = app
        .client
        .patch(app.url("/avatar"))
        .bearer_auth(&session.access_token)
        .multipart(Form::new().part("avatar", image_part("new-avatar.png")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_ne!(body["data"]["avatar"], registered["data"]["avatar"]);
    assert!(body["data"]["avatar"]
        .as_str()
        .unwrap()
        .ends_with("new-avatar.png"));

    let response = app
        .client
        .patch(app.url("/cover-image"))
        .bearer_auth(&session.access_token)
        .multipart(Form::new().part("coverImage", image_part("cover.png")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["coverImage"]
        .as_str()
        .unwrap()
        .ends_with("cover.png"));

    assert_eq!(app.staged_file_count(), 0);
}

#[tokio::test]
async fn avatar_update_requires_a_file() {
    let app = spawn_app();
    app.register("gina", "gina@example.com").await;
    let session = app.login("gina@example.com").await;

    let response = app
        .client
        .patch(app.url("/avatar"))
        .bearer_auth(&session.access_token)
        .multipart(Form::new().text("note", "no file here"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Avatar file is missing");
}

#[tokio::test]
async fn avatar_update_requires_authentication() {
    let app = spawn_app();

    let response = app
        .client
        .patch(app.url("/avatar"))
        .multipart(Form::new().part("avatar", image_part("a.png")))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(app.media.upload_count(), 0);
}
