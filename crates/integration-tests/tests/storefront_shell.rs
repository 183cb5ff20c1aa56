//! Integration tests for scripted storefront sessions.
//!
//! These feed shell scripts to a `Storefront` backed by a catalog file and
//! check both the printed output and the resulting basket.

use std::io::Write;

use bookshop_cli::{CliConfig, JsonCatalog, Storefront};
use bookshop_core::{BookId, CheckoutStep, CurrencyCode, SearchState};
use bookshop_integration_tests::{CATALOG_JSON, storefront};

fn run_script(store: &mut Storefront<JsonCatalog>, script: &str) -> String {
    let mut out = Vec::new();
    store
        .run(script.as_bytes(), &mut out, false)
        .expect("script runs");
    String::from_utf8(out).expect("utf-8 output")
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[test]
fn test_catalog_file_through_config() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(CATALOG_JSON.as_bytes()).expect("write catalog");
    let path = file.path().to_string_lossy().into_owned();

    let config = CliConfig::from_lookup(None, |key| match key {
        "BOOKSHOP_CATALOG_PATH" => Some(path.clone()),
        "BOOKSHOP_PAGE_SIZE" => Some("1".to_owned()),
        _ => None,
    })
    .expect("config loads");

    let catalog = JsonCatalog::open(&config.catalog_path, config.currency).expect("catalog opens");
    assert_eq!(catalog.len(), 4);

    let search = SearchState::new(&config.default_query, config.page_size);
    let mut store = Storefront::new(catalog, search, config.currency);
    let output = run_script(&mut store, "search\nnext\nnext\n");

    assert!(output.contains("Results for \"javascript\" (page 1):"));
    assert!(output.contains("goodparts  JavaScript: The Good Parts by Douglas Crockford - $19.99"));
    assert!(output.contains("eloquent  Eloquent JavaScript by Marijn Haverbeke - $4.01"));
    assert!(output.contains("Results for \"javascript\" (page 3):\n  No books found."));
}

#[test]
fn test_paging_and_blank_query() {
    let mut store = storefront();
    let output = run_script(&mut store, "prev\nsearch rust\nsearch\n");

    assert!(output.contains("Already on the first page."));
    assert!(output.contains("rustbook  The Rust Programming Language by Steve Klabnik, Carol Nichols - $39.95"));
    assert_eq!(store.search().query(), "javascript");
}

#[test]
fn test_free_book_shows_zero_price() {
    let mut store = storefront();
    let output = run_script(&mut store, "show ydkjs\nadd ydkjs\ncart\n");

    assert!(output.contains("Price: $0.00"));
    assert!(output.contains("Total amount: $0.00"));
    assert_eq!(store.cart().total_item_count(), 1);
}

// =============================================================================
// Basket Tests
// =============================================================================

#[test]
fn test_basket_commands() {
    let mut store = storefront();
    let output = run_script(
        &mut store,
        concat!(
            "add goodparts\n",
            "add goodparts\n",
            "inc goodparts\n",
            "add eloquent\n",
            "dec eloquent\n",
            "rm nothing\n",
            "cart\n",
        ),
    );

    assert!(output.contains("JavaScript: The Good Parts: quantity 3."));
    assert!(output.contains("Removed eloquent from the basket."));
    assert!(output.contains("nothing is not in the basket."));
    assert!(output.contains("Total items: 3"));
    assert!(output.contains("Total amount: $59.97"));
    assert_eq!(store.badge(), 3);
    assert!(!store.cart().contains(&BookId::from("eloquent")));
}

// =============================================================================
// Checkout Tests
// =============================================================================

#[test]
fn test_scripted_order_end_to_end() {
    let mut store = storefront();
    let output = run_script(
        &mut store,
        concat!(
            "# two books, one address fix, one card fix\n",
            "add goodparts\n",
            "add eloquent\n",
            "checkout\n",
            "address --first-name Grace --last-name Hopper --address ' '\n",
            "address --first-name Grace --last-name Hopper --address '1 Compiler Way'\n",
            "payment --card 4242-4242-4242-4242 --expiry 12/99 --cvc 123\n",
            "payment --card '4242 4242 4242 4242' --expiry 12/99 --cvc 123\n",
            "cart\n",
        ),
    );

    assert!(output.contains("  address: Address is required"));
    assert!(output.contains("  cardNumber: Invalid card number"));
    assert!(output.contains("Shipping to Grace Hopper, 1 Compiler Way"));
    assert!(output.contains("2 item(s), total $24.00 charged to **** **** **** 4242 (exp 12/99)."));
    assert!(output.ends_with("Your basket is empty.\n"));
    assert!(!output.contains("4242 4242 4242 4242"));
    assert!(store.checkout().is_none());
}

#[test]
fn test_back_then_resubmit_address() {
    let mut store = storefront();
    let output = run_script(
        &mut store,
        concat!(
            "add rustbook\n",
            "checkout\n",
            "address --first-name Grace --last-name Hopper --address Arlington\n",
            "back\n",
            "payment --card '4242 4242 4242 4242' --expiry 12/99 --cvc 123\n",
            "address --first-name Grace --last-name Hopper --address Washington\n",
        ),
    );

    assert!(output.contains("Saved: Grace Hopper, Arlington"));
    assert!(output.contains("Checkout is on the address step, not payment."));
    assert_eq!(
        store.checkout().and_then(|flow| flow.step()),
        Some(CheckoutStep::Payment)
    );
    assert_eq!(store.cart().total_item_count(), 1);
}

#[test]
fn test_checkout_in_other_currency() {
    let catalog = JsonCatalog::from_json(
        r#"[{"id": "x", "volumeInfo": {"title": "Untitled"}}]"#,
        CurrencyCode::EUR,
    )
    .expect("catalog parses");
    let mut store = Storefront::new(catalog, SearchState::default(), CurrencyCode::EUR);
    let output = run_script(&mut store, "add x\nadd x\ncart\n");

    assert!(output.contains("Total items: 2"));
    assert!(output.contains("Total amount: €0.00"));
}
