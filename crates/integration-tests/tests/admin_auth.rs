//! Admin login, logout and the login guard.

use axum::http::StatusCode;

use crumb_integration_tests::{
    ADMIN_USERNAME, body_text, get, location, login, offline_state, post_form, router, send,
    session_cookie,
};

#[tokio::test]
async fn test_admin_pages_require_login() {
    let app = router(offline_state());

    for path in [
        "/admin",
        "/admin/dashboard",
        "/admin/customers",
        "/admin/products/new",
        "/admin/orders/1",
        "/admin/inquiries",
    ] {
        let response = send(&app, get(path, None)).await;
        assert!(response.status().is_redirection(), "{path} should redirect");
        assert_eq!(location(&response), Some("/admin/login"), "{path}");
    }
}

#[tokio::test]
async fn test_admin_posts_require_login() {
    let app = router(offline_state());
    let response = send(
        &app,
        post_form("/admin/orders/1/refund", "", "198.51.100.1", None),
    )
    .await;
    assert_eq!(location(&response), Some("/admin/login"));
}

#[tokio::test]
async fn test_guard_explains_redirect() {
    let app = router(offline_state());
    let response = send(&app, get("/admin", None)).await;
    let cookie = session_cookie(&response).expect("flash should create a session");

    let page = send(&app, get("/admin/login", Some(&cookie))).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(
        body_text(page)
            .await
            .contains("Please log in to access the admin area.")
    );
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = router(offline_state());
    let body = format!("username={ADMIN_USERNAME}&password=not-the-password");
    let response = send(&app, post_form("/admin/login", &body, "198.51.100.2", None)).await;

    assert_eq!(location(&response), Some("/admin/login"));
    let cookie = session_cookie(&response).expect("flash cookie");

    let guarded = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(location(&guarded), Some("/admin/login"));

    let page = send(&app, get("/admin/login", Some(&cookie))).await;
    assert!(body_text(page).await.contains("Invalid username or password."));
}

#[tokio::test]
async fn test_login_then_logout() {
    let app = router(offline_state());
    let cookie = login(&app, "198.51.100.3").await;

    // Already logged in: the login page bounces to the dashboard
    let response = send(&app, get("/admin/login", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/admin"));

    let response = send(&app, get("/admin/logout", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/admin/login"));

    let response = send(&app, get("/admin/customers", Some(&cookie))).await;
    assert_eq!(location(&response), Some("/admin/login"));
}

#[tokio::test]
async fn test_dashboard_renders_when_database_is_down() {
    let app = router(offline_state());
    let cookie = login(&app, "198.51.100.4").await;

    let response = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_text(response).await;
    assert!(body.contains("Dashboard"));
    assert!(body.contains("Welcome back!"));
    assert!(body.contains(ADMIN_USERNAME));
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = router(offline_state());
    let mut last = StatusCode::OK;
    for _ in 0..6 {
        let response = send(
            &app,
            post_form("/admin/login", "username=x&password=y", "198.51.100.5", None),
        )
        .await;
        last = response.status();
    }
    assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);
}
