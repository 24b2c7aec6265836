//! Request helpers shared by the integration tests.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};

use super::{TEST_ADMIN_PASSWORD, TEST_BASE_URL};

/// Smallest valid-looking JPEG header followed by filler bytes.
pub fn fake_jpeg(len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.resize(len.max(4), 0x42);
    data
}

pub fn file_part(data: Vec<u8>, file_name: &str, mime_type: &str) -> Part {
    Part::bytes(bytes::Bytes::from(data))
        .file_name(file_name)
        .mime_type(mime_type)
}

/// Multipart body of the create-event form.
pub fn create_event_form(name: &str, password: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("eventName", name)
        .add_text("eventDate", "2024-06-01")
        .add_text("eventPlace", "Rooftop")
        .add_text("password", password)
        .add_part("bgPhoto", file_part(fake_jpeg(512), "bg.jpg", "image/jpeg"))
}

pub async fn post_create_event(client: &TestServer, form: MultipartForm) -> TestResponse {
    client
        .post("/admin/create")
        .add_header("Accept", "application/json")
        .multipart(form)
        .await
}

/// Create an event through the admin endpoint and return its JSON summary.
pub async fn create_event(client: &TestServer, name: &str) -> serde_json::Value {
    let response =
        post_create_event(client, create_event_form(name, TEST_ADMIN_PASSWORD)).await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json()
}

pub fn event_id(summary: &serde_json::Value) -> String {
    summary
        .get("id")
        .and_then(|v| v.as_str())
        .expect("Expected 'id' in event summary")
        .to_string()
}

pub async fn upload_guest_file(
    client: &TestServer,
    event_id: &str,
    data: Vec<u8>,
    file_name: &str,
) -> TestResponse {
    let form = MultipartForm::new().add_part("file", file_part(data, file_name, "image/jpeg"));
    client
        .post(&format!("/event/{}/upload", event_id))
        .add_header("Accept", "application/json")
        .multipart(form)
        .await
}

pub async fn list_uploads(client: &TestServer, event_id: &str) -> serde_json::Value {
    let response = client
        .get(&format!("/admin/photos/{}", event_id))
        .add_header("Accept", "application/json")
        .add_query_param("password", TEST_ADMIN_PASSWORD)
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json()
}

/// Split a local `/files` URL into its route path and retrieval token.
pub fn split_signed_url(url: &str) -> (String, String) {
    let relative = url
        .strip_prefix(TEST_BASE_URL)
        .expect("Signed URL should point at this server");
    let (path, query) = relative
        .split_once("?token=")
        .expect("Signed URL should carry a token");
    (path.to_string(), query.to_string())
}
