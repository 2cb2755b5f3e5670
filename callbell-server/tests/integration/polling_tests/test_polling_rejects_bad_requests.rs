use reqwest::StatusCode;
use serde_json::Value;

use crate::integration::init_tracing;
use crate::utils::TestServer;

#[tokio::test]
async fn test_polling_rejects_bad_requests() {
    init_tracing();

    let server = TestServer::start().await.expect("Failed to start server");
    let http = reqwest::Client::new();

    let unknown = server.http_url("/signal/poll/6f1c2f1e-9a55-4c47-9d0e-0b8c4b6c1a11");
    assert_eq!(
        http.get(&unknown).send().await.unwrap().status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        http.post(&unknown).body("{}").send().await.unwrap().status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        http.get(server.http_url("/signal/poll/not-a-uuid"))
            .send()
            .await
            .unwrap()
            .status(),
        StatusCode::NOT_FOUND
    );

    let body: Value = http
        .post(server.http_url("/signal/poll"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session = server.http_url(&format!(
        "/signal/poll/{}",
        body["connectionId"].as_str().unwrap()
    ));

    let garbage = http.post(&session).body("not json").send().await.unwrap();
    assert_eq!(garbage.status(), StatusCode::BAD_REQUEST);

    let health: Value = http
        .get(server.http_url("/healthz"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["connections"], 1);
    assert_eq!(health["announced"], 0);
}
