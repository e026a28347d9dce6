//! End-to-end tests for Trattoria.
//!
//! The tests drive a running storefront and admin over HTTP, the way a
//! customer and a member of staff would. They are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! trattoria-cli migrate
//! trattoria-cli seed menu
//! trattoria-cli admin create -e staff@example.com -n Staff -r admin -p '...'
//! cargo run -p trattoria-storefront &
//! cargo run -p trattoria-admin &
//!
//! TRATTORIA_TEST_ADMIN_EMAIL=staff@example.com \
//! TRATTORIA_TEST_ADMIN_PASSWORD='...' \
//!     cargo test -p trattoria-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_BASE_URL` - defaults to `http://localhost:3000`
//! - `ADMIN_BASE_URL` - defaults to `http://localhost:3001`
//! - `TRATTORIA_TEST_ADMIN_EMAIL`, `TRATTORIA_TEST_ADMIN_PASSWORD` - an
//!   account with write access

use reqwest::{Client, StatusCode, header};

/// Errors from the test helpers.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0} is not set")]
    MissingEnv(&'static str),
    #[error("{0}")]
    Unexpected(String),
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Base URL of the running storefront.
#[must_use]
pub fn storefront_url() -> String {
    env_or("STOREFRONT_BASE_URL", "http://localhost:3000")
        .trim_end_matches('/')
        .to_string()
}

/// Base URL of the running admin panel.
#[must_use]
pub fn admin_url() -> String {
    env_or("ADMIN_BASE_URL", "http://localhost:3001")
        .trim_end_matches('/')
        .to_string()
}

/// A client with its own cookie jar that does not follow redirects.
///
/// # Errors
///
/// Returns `TestError::Http` if the client cannot be built.
pub fn client() -> Result<Client, TestError> {
    Ok(Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Pull the first number following `prefix` out of an HTML page.
#[must_use]
pub fn first_id_after(html: &str, prefix: &str) -> Option<i32> {
    let start = html.find(prefix)? + prefix.len();
    let digits: String = html
        .get(start..)?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Sign in to the admin panel with the test account.
///
/// # Errors
///
/// Returns `TestError::MissingEnv` without credentials and
/// `TestError::Unexpected` if the login is refused.
pub async fn admin_login(client: &Client) -> Result<(), TestError> {
    let email = std::env::var("TRATTORIA_TEST_ADMIN_EMAIL")
        .map_err(|_| TestError::MissingEnv("TRATTORIA_TEST_ADMIN_EMAIL"))?;
    let password = std::env::var("TRATTORIA_TEST_ADMIN_PASSWORD")
        .map_err(|_| TestError::MissingEnv("TRATTORIA_TEST_ADMIN_PASSWORD"))?;

    let response = client
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", email.as_str()), ("password", password.as_str())])
        .send()
        .await?;
    if response.status() != StatusCode::SEE_OTHER {
        return Err(TestError::Unexpected(format!(
            "admin login returned {}",
            response.status()
        )));
    }
    Ok(())
}

/// Place a pickup order for the first dish on the menu as a guest.
///
/// Returns the new order's number.
///
/// # Errors
///
/// Returns `TestError::Unexpected` if the menu is empty or checkout does
/// not redirect to the tracking page.
pub async fn place_guest_order(client: &Client) -> Result<i32, TestError> {
    let base = storefront_url();
    let menu = client.get(format!("{base}/menu")).send().await?.text().await?;
    let product_id = first_id_after(&menu, "href=\"/menu/")
        .ok_or_else(|| TestError::Unexpected("menu has no dishes; run seed menu".into()))?;

    client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", product_id.to_string()), ("quantity", "2".to_string())])
        .send()
        .await?
        .error_for_status()?;

    let response = client
        .post(format!("{base}/checkout"))
        .form(&[
            ("name", "Test Guest"),
            ("email", "guest@example.com"),
            ("phone", "555-0100"),
            ("order_type", "pickup"),
            ("payment_method", "cash"),
            ("notes", "integration test"),
        ])
        .send()
        .await?;

    location(&response)
        .as_deref()
        .and_then(|to| first_id_after(to, "/orders/"))
        .ok_or_else(|| {
            TestError::Unexpected(format!("checkout returned {}", response.status()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_id_after() {
        let html = r#"<a href="/menu/42">Margherita</a><a href="/menu/7">"#;
        assert_eq!(first_id_after(html, "href=\"/menu/"), Some(42));
        assert_eq!(first_id_after("/orders/17", "/orders/"), Some(17));
        assert_eq!(first_id_after("/orders/", "/orders/"), None);
        assert_eq!(first_id_after("<p>empty</p>", "href=\"/menu/"), None);
    }
}
