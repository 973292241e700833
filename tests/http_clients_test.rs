use httpmock::prelude::*;
use portfolio_rs::config::{CloudinaryConfig, ScreenshotConfig};
use portfolio_rs::services::{AssetStore, CloudinaryClient, HttpScreenshotRenderer, ScreenshotRenderer};
use serde_json::json;

const PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
// base64("key:secret")
const BASIC_AUTH: &str = "Basic a2V5OnNlY3JldA==";

fn renderer_for(server: &MockServer) -> HttpScreenshotRenderer {
    HttpScreenshotRenderer::new(&ScreenshotConfig {
        api_url: server.url("/take"),
        api_key: "test-key".to_string(),
        timeout_secs: 5,
        min_capture_ms: 0,
        settle_delay_ms: 0,
        stagger_ms: 0,
    })
    .unwrap()
}

fn cloudinary_for(server: &MockServer) -> CloudinaryClient {
    CloudinaryClient::new(&CloudinaryConfig {
        api_url: server.base_url(),
        cloud_name: "demo".to_string(),
        api_key: "key".to_string(),
        api_secret: "secret".to_string(),
        folder: "portfolio".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_renderer_returns_image_bytes() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/take")
                .query_param("access_key", "test-key")
                .query_param("format", "png")
                .query_param("viewport_width", "1440")
                .query_param("cache", "false");
            then.status(200).header("content-type", "image/png").body(PNG.to_vec());
        })
        .await;

    let image = renderer_for(&server).capture("https://x.test").await.unwrap();

    mock.assert_async().await;
    assert_eq!(image, PNG.to_vec());
}

#[tokio::test]
async fn test_renderer_error_status_is_a_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/take");
            then.status(500).body("renderer exploded");
        })
        .await;

    let error = renderer_for(&server).capture("https://x.test").await.unwrap_err();
    assert!(error.to_string().contains("500"), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_renderer_empty_body_is_a_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/take");
            then.status(200);
        })
        .await;

    assert!(renderer_for(&server).capture("https://x.test").await.is_err());
}

#[tokio::test]
async fn test_cloudinary_upload_returns_secure_url() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1_1/demo/image/upload");
            then.status(200).json_body(json!({
                "public_id": "portfolio/screenshots/abc",
                "secure_url": "https://res.cloudinary.test/demo/abc.webp",
                "format": "webp"
            }));
        })
        .await;

    let uploaded = cloudinary_for(&server).upload(&PNG, "portfolio/screenshots").await.unwrap();

    mock.assert_async().await;
    assert_eq!(uploaded.public_id, "portfolio/screenshots/abc");
    assert_eq!(uploaded.url, "https://res.cloudinary.test/demo/abc.webp");
}

#[tokio::test]
async fn test_cloudinary_upload_error_carries_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1_1/demo/image/upload");
            then.status(401).json_body(json!({ "error": { "message": "Invalid Signature" } }));
        })
        .await;

    let error = cloudinary_for(&server).upload(&PNG, "portfolio/screenshots").await.unwrap_err();
    assert!(error.to_string().contains("Invalid Signature"), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_cloudinary_destroy_treats_not_found_as_done() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1_1/demo/image/destroy");
            then.status(200).json_body(json!({ "result": "not found" }));
        })
        .await;

    assert!(cloudinary_for(&server).destroy("portfolio/screenshots/gone").await.is_ok());
}

#[tokio::test]
async fn test_cloudinary_destroy_rejects_unexpected_result() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1_1/demo/image/destroy");
            then.status(200).json_body(json!({ "result": "error" }));
        })
        .await;

    assert!(cloudinary_for(&server).destroy("portfolio/screenshots/a").await.is_err());
}

#[tokio::test]
async fn test_cloudinary_list_uses_admin_auth_and_prefix() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1_1/demo/resources/image/upload")
                .header("authorization", BASIC_AUTH)
                .query_param("prefix", "portfolio/")
                .query_param("type", "upload");
            then.status(200).json_body(json!({
                "resources": [
                    {
                        "public_id": "portfolio/screenshots/a",
                        "secure_url": "https://res.cloudinary.test/a.webp",
                        "bytes": 2048,
                        "format": "webp",
                        "created_at": "2024-05-01T10:00:00Z"
                    },
                    {
                        "public_id": "portfolio/certificates/b",
                        "secure_url": "https://res.cloudinary.test/b.webp",
                        "bytes": 1024,
                        "format": "webp",
                        "created_at": "2024-05-02T10:00:00Z"
                    }
                ]
            }));
        })
        .await;

    let assets = cloudinary_for(&server).list("portfolio/").await.unwrap();

    mock.assert_async().await;
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0].public_id, "portfolio/screenshots/a");
    assert_eq!(assets[0].bytes, 2048);
}

#[tokio::test]
async fn test_cloudinary_delete_by_prefix_counts_deleted() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/v1_1/demo/resources/image/upload")
                .header("authorization", BASIC_AUTH)
                .query_param("prefix", "portfolio/screenshots/");
            then.status(200).json_body(json!({
                "deleted": {
                    "portfolio/screenshots/a": "deleted",
                    "portfolio/screenshots/b": "deleted",
                    "portfolio/screenshots/c": "not_found"
                },
                "partial": false
            }));
        })
        .await;

    let deleted = cloudinary_for(&server).delete_by_prefix("portfolio/screenshots/").await.unwrap();

    mock.assert_async().await;
    assert_eq!(deleted, 2);
}
