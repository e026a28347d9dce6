//! A guest order moving through the kitchen, seen from both sides.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use trattoria_core::OrderStatus;
use trattoria_integration_tests::{
    admin_login, admin_url, client, location, place_guest_order, storefront_url,
};

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_servers_are_healthy() {
    let client = client().unwrap();
    for base in [storefront_url(), admin_url()] {
        let response = client.get(format!("{base}/health/ready")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{base} not ready");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_pages_require_login() {
    let client = client().unwrap();
    let response = client
        .get(format!("{}/orders", admin_url()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/auth/login"));
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_admin_login_rejects_wrong_password() {
    let client = client().unwrap();
    let response = client
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", "nobody@example.com"), ("password", "not-the-password")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running servers, a seeded menu, and admin credentials"]
async fn test_order_moves_through_pickup_lifecycle() {
    let customer = client().unwrap();
    let staff = client().unwrap();
    let order_id = place_guest_order(&customer).await.unwrap();
    admin_login(&staff).await.unwrap();

    let admin = admin_url();
    let order_page = staff
        .get(format!("{admin}/orders/{order_id}"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(order_page.contains("Test Guest"));
    assert!(order_page.contains("Mark Confirmed"));

    // Skipping ahead is refused and leaves the order alone
    let response = staff
        .post(format!("{admin}/orders/{order_id}/status"))
        .form(&[("status", OrderStatus::Ready.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ] {
        let response = staff
            .post(format!("{admin}/orders/{order_id}/status"))
            .form(&[("status", status.as_str())])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "move to {status}");
        assert_eq!(
            location(&response).as_deref(),
            Some(format!("/orders/{order_id}").as_str())
        );
    }

    // The customer's tracking fragment reflects the final status
    let fragment = customer
        .get(format!("{}/orders/{order_id}/status", storefront_url()))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(fragment.contains(OrderStatus::Completed.label()));

    // Completed orders cannot be canceled
    let response = staff
        .post(format!("{admin}/orders/{order_id}/status"))
        .form(&[("status", OrderStatus::Canceled.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running servers, a seeded menu, and admin credentials"]
async fn test_customer_cancel_shows_up_in_admin() {
    let customer = client().unwrap();
    let staff = client().unwrap();
    let order_id = place_guest_order(&customer).await.unwrap();

    let response = customer
        .post(format!("{}/orders/{order_id}/cancel", storefront_url()))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success() || response.status().is_redirection());

    admin_login(&staff).await.unwrap();
    let page = staff
        .get(format!("{}/orders?status=canceled&q=%23{order_id}", admin_url()))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(&format!("/orders/{order_id}\"")));
}
