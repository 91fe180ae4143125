use base64::{Engine as _, engine::general_purpose::STANDARD};
use lucinka_client::LucinkaClient;
use lucinka_client::http_client::ReqwestLucinkaClient;
use secrecy::SecretString;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn photo_server(bytes: &'static [u8]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1, "username": "mama"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/photos/12.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn download_photo_returns_base64_without_path() {
    let server = photo_server(b"\xFF\xD8jpegdata").await;
    let client = ReqwestLucinkaClient::new(&server.uri(), "mama", SecretString::new("pw".into()));

    let encoded = client
        .download_photo("12.jpg", None)
        .await
        .expect("download")
        .expect("inline content");
    assert_eq!(STANDARD.decode(encoded).unwrap(), b"\xFF\xD8jpegdata");
}

#[tokio::test]
async fn download_photo_streams_to_file() {
    let server = photo_server(b"0123456789").await;
    let client = ReqwestLucinkaClient::new(&server.uri(), "mama", SecretString::new("pw".into()));

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("12.jpg");
    let res = client
        .download_photo("12.jpg", Some(target.clone()))
        .await
        .expect("download");
    assert!(res.is_none());
    assert_eq!(std::fs::read(&target).unwrap(), b"0123456789");
}

#[tokio::test]
async fn download_missing_photo_is_not_found() {
    let server = photo_server(b"").await;
    Mock::given(method("GET"))
        .and(path("/api/photos/99.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let client = ReqwestLucinkaClient::new(&server.uri(), "mama", SecretString::new("pw".into()));
    let err = client.download_photo("99.png", None).await.unwrap_err();
    assert!(matches!(err, lucinka_client::LucinkaError::NotFound(_)));
}
