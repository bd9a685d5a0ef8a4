//! Storefront pages driven through the router without a database.

use axum::http::StatusCode;

use crumb_integration_tests::{body_text, get, offline_state, post_form, router, send};

#[tokio::test]
async fn test_health_and_security_headers() {
    let app = router(offline_state());
    let response = send(&app, get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = router(offline_state());
    let response = send(&app, get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_home_shows_fixture_gallery_in_mock_mode() {
    let app = router(offline_state());
    let response = send(&app, get("/", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("The Crocheted Crumb"));
    assert!(body.contains("Plushies"));
    assert!(body.contains("Home Decor"));
}

#[tokio::test]
async fn test_empty_cart_page() {
    let app = router(offline_state());
    let response = send(&app, get("/cart", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_checkout_with_empty_cart_redirects_to_cart() {
    let app = router(offline_state());
    let response = send(&app, get("/checkout", None)).await;

    assert!(response.status().is_redirection());
    assert_eq!(crumb_integration_tests::location(&response), Some("/cart"));
}

#[tokio::test]
async fn test_foreign_order_confirmation_is_hidden() {
    let app = router(offline_state());
    let response = send(&app, get("/order/1", None)).await;

    assert!(response.status().is_redirection());
    assert_eq!(crumb_integration_tests::location(&response), Some("/"));
}

#[tokio::test]
async fn test_contact_page_shows_fixture_details() {
    let app = router(offline_state());
    let response = send(&app, get("/contact", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("hello@crochetedcrumb.test"));
}

#[tokio::test]
async fn test_invalid_contact_form_is_rerendered() {
    let app = router(offline_state());
    let response = send(
        &app,
        post_form("/contact", "name=Ada&email=nope&message=", "203.0.113.10", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Please enter a valid email address."));
    assert!(body.contains("Please enter a message."));
    assert!(body.contains("value=\"Ada\""));
}

#[tokio::test]
async fn test_contact_form_is_rate_limited_per_client() {
    let app = router(offline_state());

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let response = send(&app, post_form("/contact", "", "203.0.113.20", None)).await;
        statuses.push(response.status());
    }
    assert!(statuses[..5].iter().all(|s| *s == StatusCode::OK));
    assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);

    // Another client is unaffected
    let response = send(&app, post_form("/contact", "", "203.0.113.21", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_payment_webhook_is_acknowledged() {
    let app = router(offline_state());
    let request = axum::http::Request::post("/webhooks/payments")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            r#"{"id":"evt_123","type":"payment_intent.succeeded"}"#,
        ))
        .expect("request");

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let ack: serde_json::Value =
        serde_json::from_str(&body_text(response).await).expect("json body");
    assert_eq!(ack["received"], true);
    assert_eq!(ack["event_id"], "evt_123");
    assert_eq!(ack["event_type"], "payment_intent.succeeded");
}
