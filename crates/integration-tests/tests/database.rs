//! Repository and checkout tests against a real `PostgreSQL`.
//!
//! These tests require `TEST_DATABASE_URL`. Run with:
//! `cargo test -p crumb-integration-tests -- --ignored`

use rust_decimal::Decimal;

use crumb_core::{Category, InquiryStatus, OrderStatus};
use crumb_integration_tests::{test_config, test_pool, unique_email};
use crumb_web::db::{
    CustomerRepository, InquiryRepository, OrderItemRepository, OrderRepository, Page,
    ProductRepository, RepositoryError,
};
use crumb_web::models::{Cart, CustomerPatch, NewCustomer, NewInquiry, NewProduct, ProductPatch};
use crumb_web::services::checkout::{CheckoutDetails, CheckoutError, CheckoutService};
use crumb_web::services::payments::StubPaymentGateway;

async fn pool() -> sqlx::PgPool {
    test_pool().await.expect("TEST_DATABASE_URL must be set")
}

fn payments() -> StubPaymentGateway {
    StubPaymentGateway::new(&test_config("postgres://unused", false).payments)
}

async fn create_product(pool: &sqlx::PgPool, name: &str, price: Decimal) -> crumb_core::ProductId {
    ProductRepository::new(pool)
        .create(&NewProduct {
            name: name.to_string(),
            description: Some("Handmade".to_string()),
            price,
            category: Some(Category::Plushies),
            image_url: None,
            stock_quantity: 3,
        })
        .await
        .expect("create product")
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_schema_initialization_is_idempotent() {
    let pool = pool().await;
    crumb_web::db::initialize_schema(&pool)
        .await
        .expect("second run should succeed");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_customer_roundtrip_and_patch() {
    let pool = pool().await;
    let repo = CustomerRepository::new(&pool);
    let email = unique_email("roundtrip");

    let id = repo
        .create(&NewCustomer {
            name: "Ada Lovelace".to_string(),
            email: email.clone(),
            phone: None,
            address: Some("12 Loom Lane".to_string()),
        })
        .await
        .expect("create customer");

    let stored = repo.get_by_email(&email).await.expect("query").expect("row");
    assert_eq!(stored.id, id);
    assert_eq!(stored.address.as_deref(), Some("12 Loom Lane"));

    let updated = repo
        .update(
            id,
            &CustomerPatch {
                phone: Some("555-0100".to_string()),
                ..CustomerPatch::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.phone.as_deref(), Some("555-0100"));
    assert_eq!(updated.name, "Ada Lovelace");
    assert!(updated.updated_at >= stored.updated_at);

    assert!(matches!(
        repo.update(id, &CustomerPatch::default()).await,
        Err(RepositoryError::NothingToUpdate)
    ));

    let found = repo.search("lovelace", 10).await.expect("search");
    assert!(found.iter().any(|c| c.id == id));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_duplicate_customer_email_conflicts() {
    let pool = pool().await;
    let repo = CustomerRepository::new(&pool);
    let customer = NewCustomer {
        name: "Twin".to_string(),
        email: unique_email("dupe"),
        phone: None,
        address: None,
    };

    repo.create(&customer).await.expect("first insert");
    assert!(matches!(
        repo.create(&customer).await,
        Err(RepositoryError::Conflict(_))
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_product_patch_keeps_unset_fields() {
    let pool = pool().await;
    let repo = ProductRepository::new(&pool);
    let id = create_product(&pool, "Patchable Bear", Decimal::new(1800, 2)).await;

    let updated = repo
        .update(
            id,
            &ProductPatch {
                price: Some(Decimal::new(2000, 2)),
                ..ProductPatch::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.price, Decimal::new(2000, 2));
    assert_eq!(updated.name, "Patchable Bear");
    assert_eq!(updated.stock_quantity, 3);

    let listed = repo
        .list(Some(Category::Plushies), Page::default())
        .await
        .expect("list");
    assert!(listed.iter().any(|p| p.id == id));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_checkout_creates_paid_order() {
    let pool = pool().await;
    let payments = payments();
    let product_id = create_product(&pool, "Checkout Bunny", Decimal::new(2500, 2)).await;

    let mut cart = Cart::default();
    cart.add(product_id, 2).expect("add to cart");

    let details = CheckoutDetails {
        name: "Grace Hopper".to_string(),
        email: unique_email("checkout"),
        phone: None,
        address: Some("1 Harbor Rd".to_string()),
    };

    let placed = CheckoutService::new(&pool, &payments)
        .place_order(&cart, &details)
        .await
        .expect("place order");
    assert_eq!(placed.total, Decimal::new(5000, 2));
    assert!(placed.payment_intent_id.starts_with("pi_"));

    let order = OrderRepository::new(&pool)
        .get_by_id(placed.order_id)
        .await
        .expect("query")
        .expect("order row");
    assert_eq!(order.order.status.known(), Some(OrderStatus::Paid));
    assert_eq!(order.order.total_amount, Decimal::new(5000, 2));
    assert_eq!(order.customer_email.as_ref(), Some(&details.email));

    let items = OrderItemRepository::new(&pool)
        .list_for_order(placed.order_id)
        .await
        .expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item.quantity, 2);
    assert_eq!(items[0].item.price_at_purchase, Decimal::new(2500, 2));

    // A second order from the same email reuses the customer
    let again = CheckoutService::new(&pool, &payments)
        .place_order(&cart, &details)
        .await
        .expect("second order");
    let customer = CustomerRepository::new(&pool)
        .get_by_email(&details.email)
        .await
        .expect("query")
        .expect("customer");
    let history = OrderRepository::new(&pool)
        .get_by_customer(customer.id)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, again.order_id);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_price_change_does_not_touch_placed_orders() {
    let pool = pool().await;
    let payments = payments();
    let product_id = create_product(&pool, "Snapshot Scarf", Decimal::new(3000, 2)).await;

    let mut cart = Cart::default();
    cart.add(product_id, 1).expect("add to cart");
    let placed = CheckoutService::new(&pool, &payments)
        .place_order(
            &cart,
            &CheckoutDetails {
                name: "Snapshot".to_string(),
                email: unique_email("snapshot"),
                phone: None,
                address: None,
            },
        )
        .await
        .expect("place order");

    ProductRepository::new(&pool)
        .update(
            product_id,
            &ProductPatch {
                price: Some(Decimal::new(4500, 2)),
                ..ProductPatch::default()
            },
        )
        .await
        .expect("reprice");

    let items = OrderItemRepository::new(&pool)
        .list_for_order(placed.order_id)
        .await
        .expect("items");
    assert_eq!(items[0].item.price_at_purchase, Decimal::new(3000, 2));

    let order = OrderRepository::new(&pool)
        .get_by_id(placed.order_id)
        .await
        .expect("query")
        .expect("order");
    assert_eq!(order.order.total_amount, Decimal::new(3000, 2));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_checkout_with_unknown_product_leaves_no_rows() {
    let pool = pool().await;
    let payments = payments();
    let email = unique_email("ghost");

    let mut cart = Cart::default();
    cart.add(crumb_core::ProductId::new(i32::MAX), 1).expect("add to cart");

    let result = CheckoutService::new(&pool, &payments)
        .place_order(
            &cart,
            &CheckoutDetails {
                name: "Ghost".to_string(),
                email: email.clone(),
                phone: None,
                address: None,
            },
        )
        .await;
    assert!(matches!(result, Err(CheckoutError::UnknownProduct(_))));

    let customer = CustomerRepository::new(&pool)
        .get_by_email(&email)
        .await
        .expect("query");
    assert!(customer.is_none(), "failed checkout must roll back the customer");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_inquiry_status_stamps_responded_at() {
    let pool = pool().await;
    let repo = InquiryRepository::new(&pool);

    let id = repo
        .create(&NewInquiry {
            name: "Commission".to_string(),
            email: unique_email("inquiry"),
            message: "Could you make a dragon?".to_string(),
        })
        .await
        .expect("create inquiry");

    let inquiry = repo.get_by_id(id).await.expect("query").expect("row");
    assert_eq!(inquiry.status.known(), Some(InquiryStatus::New));
    assert!(inquiry.responded_at.is_none());

    let responded = repo
        .update_status(id, InquiryStatus::Responded)
        .await
        .expect("respond");
    let stamped = responded.responded_at.expect("responded_at set");

    // Reopening keeps the original stamp
    let reopened = repo.update_status(id, InquiryStatus::New).await.expect("reopen");
    assert_eq!(reopened.responded_at, Some(stamped));

    assert!(matches!(
        repo.update_status(crumb_core::InquiryId::new(i32::MAX), InquiryStatus::Closed)
            .await,
        Err(RepositoryError::NotFound)
    ));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_any_order_status_transition_is_allowed() {
    let pool = pool().await;
    let payments = payments();
    let product_id = create_product(&pool, "Status Hat", Decimal::new(1500, 2)).await;

    let mut cart = Cart::default();
    cart.add(product_id, 1).expect("add to cart");
    let placed = CheckoutService::new(&pool, &payments)
        .place_order(
            &cart,
            &CheckoutDetails {
                name: "Status".to_string(),
                email: unique_email("status"),
                phone: None,
                address: None,
            },
        )
        .await
        .expect("place order");

    let repo = OrderRepository::new(&pool);
    for status in [OrderStatus::Delivered, OrderStatus::Pending, OrderStatus::Cancelled] {
        let order = repo
            .update_status(placed.order_id, status)
            .await
            .expect("update status");
        assert_eq!(order.status.known(), Some(status));
    }
}
