//! Integration tests for Bookshop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bookshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_and_checkout` - Basket invariants and the checkout state machine
//!   driven through the public core API
//! - `storefront_shell` - Scripted shell sessions against a catalog file
//!
//! Shared fixtures live here so both suites build baskets the same way.

#![cfg_attr(not(test), forbid(unsafe_code))]

use bookshop_cli::{JsonCatalog, Storefront};
use bookshop_core::checkout::{AddressInput, PaymentInput};
use bookshop_core::{BookId, CartCandidate, CurrencyCode, Price, SearchState};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A small catalog dump in the volume search response shape.
pub const CATALOG_JSON: &str = r#"{
    "kind": "books#volumes",
    "totalItems": 4,
    "items": [
        {
            "id": "goodparts",
            "volumeInfo": {
                "title": "JavaScript: The Good Parts",
                "authors": ["Douglas Crockford"],
                "description": "<p>Most programming languages contain <i>good</i> and bad parts.</p>",
                "imageLinks": { "smallThumbnail": "http://img/gp-s", "thumbnail": "http://img/gp" }
            },
            "saleInfo": { "listPrice": { "amount": 19.99, "currencyCode": "USD" } }
        },
        {
            "id": "eloquent",
            "volumeInfo": { "title": "Eloquent JavaScript", "authors": ["Marijn Haverbeke"] },
            "saleInfo": { "listPrice": { "amount": 4.01, "currencyCode": "USD" } }
        },
        {
            "id": "ydkjs",
            "volumeInfo": { "title": "You Don't Know JS", "authors": ["Kyle Simpson"] },
            "saleInfo": { "saleability": "FREE" }
        },
        {
            "id": "rustbook",
            "volumeInfo": { "title": "The Rust Programming Language", "authors": ["Steve Klabnik", "Carol Nichols"] },
            "saleInfo": { "listPrice": { "amount": 39.95, "currencyCode": "USD" } }
        }
    ]
}"#;

/// Fixed "today" for expiry checks.
///
/// # Panics
///
/// Never; the date is a valid constant.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

/// A USD candidate priced in cents.
///
/// # Panics
///
/// Panics if `cents` is negative.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn candidate(id: &str, cents: i64) -> CartCandidate {
    CartCandidate {
        id: BookId::from(id),
        title: format!("Book {id}"),
        authors: vec!["Anon".to_owned()],
        thumbnail: String::new(),
        unit_price: Price::new(Decimal::new(cents, 2), CurrencyCode::USD).unwrap(),
    }
}

#[must_use]
pub fn valid_address() -> AddressInput {
    AddressInput {
        first_name: "Grace".to_owned(),
        last_name: "Hopper".to_owned(),
        address: "1 Compiler Way".to_owned(),
    }
}

#[must_use]
pub fn valid_payment() -> PaymentInput {
    PaymentInput {
        card_number: "4242 4242 4242 4242".to_owned(),
        expiry_date: "12/99".to_owned(),
        cvc: "123".to_owned(),
    }
}

/// A storefront backed by [`CATALOG_JSON`].
///
/// # Panics
///
/// Panics if the fixture catalog fails to parse.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn storefront() -> Storefront<JsonCatalog> {
    let catalog = JsonCatalog::from_json(CATALOG_JSON, CurrencyCode::USD).unwrap();
    Storefront::new(catalog, SearchState::new("javascript", 2), CurrencyCode::USD)
}
