use crate::helpers::{spawn_app, spawn_app_with, valid_submission};
use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn the_sixth_request_in_the_window_is_rejected() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(5)
        .mount(&app.email_server)
        .await;

    for _ in 0..5 {
        let response = app.post_send(&valid_submission()).await;
        assert_eq!(200, response.status().as_u16());
    }
    let response = app.post_send(&valid_submission()).await;

    assert_eq!(429, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({"error": "Too many requests. Please try again later."})
    );
}

#[tokio::test]
async fn rejected_submissions_count_against_the_quota() {
    let app = spawn_app_with(|c| c.rate_limit.max_requests = 2).await;

    for _ in 0..2 {
        let response = app.post_send(&serde_json::json!({})).await;
        assert_eq!(400, response.status().as_u16());
    }
    let response = app.post_send(&valid_submission()).await;

    assert_eq!(429, response.status().as_u16());
}

#[tokio::test]
async fn the_forwarded_client_address_is_rate_limited_separately() {
    let app = spawn_app_with(|c| c.rate_limit.max_requests = 1).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let first = app.post_send_from("203.0.113.1", &valid_submission()).await;
    let blocked = app
        .post_send_from("203.0.113.1, 10.0.0.1", &valid_submission())
        .await;
    let other = app.post_send_from("203.0.113.2", &valid_submission()).await;

    assert_eq!(200, first.status().as_u16());
    assert_eq!(429, blocked.status().as_u16());
    assert_eq!(200, other.status().as_u16());
}

#[tokio::test]
async fn requests_are_accepted_again_after_the_window() {
    let app = spawn_app_with(|c| {
        c.rate_limit.max_requests = 1;
        c.rate_limit.window_seconds = 1;
    })
    .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    assert_eq!(200, app.post_send(&valid_submission()).await.status().as_u16());
    assert_eq!(429, app.post_send(&valid_submission()).await.status().as_u16());

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    assert_eq!(200, app.post_send(&valid_submission()).await.status().as_u16());
}
