//! The shopper's path from product page to confirmation, over HTTP.
//!
//! Requires `TEST_DATABASE_URL`. Run with:
//! `cargo test -p crumb-integration-tests -- --ignored`

use axum::http::StatusCode;
use rust_decimal::Decimal;

use crumb_core::Category;
use crumb_integration_tests::{
    body_text, get, location, post_form, router, send, session_cookie, test_config, test_pool,
};
use crumb_web::db::{OrderItemRepository, OrderRepository, ProductRepository};
use crumb_web::models::NewProduct;
use crumb_web::state::AppState;

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_cart_to_confirmation() {
    let pool = test_pool().await.expect("TEST_DATABASE_URL must be set");
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL");
    let state = AppState::new(test_config(&url, false), pool.clone()).expect("state");
    let app = router(state);

    let product_id = ProductRepository::new(&pool)
        .create(&NewProduct {
            name: "Flow Bunny".to_string(),
            description: None,
            price: Decimal::new(2500, 2),
            category: Some(Category::Plushies),
            image_url: None,
            stock_quantity: 5,
        })
        .await
        .expect("create product");

    // Adding twice merges into one line of two
    let response = send(
        &app,
        post_form(&format!("/cart/add/{product_id}"), "quantity=1", "192.0.2.1", None),
    )
    .await;
    assert_eq!(location(&response), Some("/cart"));
    let cookie = session_cookie(&response).expect("cart cookie");

    send(
        &app,
        post_form(&format!("/cart/add/{product_id}"), "", "192.0.2.1", Some(&cookie)),
    )
    .await;

    let cart = body_text(send(&app, get("/cart", Some(&cookie))).await).await;
    assert!(cart.contains("Flow Bunny"));
    assert!(cart.contains("$50.00"));

    let email = format!("flow-{}@crumb.test", uuid::Uuid::new_v4().simple());
    let form = format!("name=Flow+Shopper&email={email}&phone=&address=1+Yarn+St");
    let response = send(&app, post_form("/checkout", &form, "192.0.2.1", Some(&cookie))).await;
    assert!(response.status().is_redirection());
    let confirmation = location(&response).expect("redirect").to_owned();
    assert!(confirmation.starts_with("/order/"));

    let order_id: crumb_core::OrderId = confirmation
        .trim_start_matches("/order/")
        .parse()
        .expect("order id");
    let order = OrderRepository::new(&pool)
        .get_by_id(order_id)
        .await
        .expect("query")
        .expect("order");
    assert_eq!(order.order.total_amount, Decimal::new(5000, 2));
    assert_eq!(order.order.status.to_string(), "paid");

    let items = OrderItemRepository::new(&pool)
        .list_for_order(order_id)
        .await
        .expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item.quantity, 2);

    let page = send(&app, get(&confirmation, Some(&cookie))).await;
    assert_eq!(page.status(), StatusCode::OK);
    let body = body_text(page).await;
    assert!(body.contains("Thank you for your order!"));
    assert!(body.contains("$50.00"));

    let cart = body_text(send(&app, get("/cart", Some(&cookie))).await).await;
    assert!(cart.contains("Your cart is empty"));

    // Another session cannot view the order
    let response = send(&app, get(&confirmation, None)).await;
    assert_eq!(location(&response), Some("/"));
}
