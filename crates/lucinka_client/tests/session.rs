use lucinka_client::LucinkaClient;
use lucinka_client::http_client::ReqwestLucinkaClient;
use secrecy::SecretString;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn expired_session_is_renewed_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=fresh; Path=/")
                .set_body_json(serde_json::json!({"id": 1, "username": "mama", "is_admin": false})),
        )
        .expect(2)
        .mount(&server)
        .await;

    // First data call is rejected as if the server restarted and forgot the session.
    Mock::given(method("GET"))
        .and(path("/api/visits"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "Not authenticated"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/visits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = ReqwestLucinkaClient::new(&server.uri(), "mama", SecretString::new("pw".into()));
    let visits = client.get_visits().await.expect("visits after relogin");
    assert!(visits.is_empty());
}

#[tokio::test]
async fn persistent_rejection_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1, "username": "mama"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/activities"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "Not authenticated"})))
        .mount(&server)
        .await;

    let client = ReqwestLucinkaClient::new(&server.uri(), "mama", SecretString::new("pw".into()));
    let err = client.get_activities().await.unwrap_err();
    assert!(err.is_session_invalid());
}

#[tokio::test]
async fn logout_clears_session_and_next_call_logs_in_again() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1, "username": "mama"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = ReqwestLucinkaClient::new(&server.uri(), "mama", SecretString::new("pw".into()));
    client.get_photos().await.expect("photos");
    client.logout().await.expect("logout");
    client.get_photos().await.expect("photos again");
}
