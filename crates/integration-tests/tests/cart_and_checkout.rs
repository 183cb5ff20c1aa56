//! Integration tests for the basket and the two-step checkout.
//!
//! These drive the public `bookshop-core` API the way the storefront does:
//! one owned `CartStore`, one `CheckoutFlow` per attempt.

use std::sync::{Arc, Mutex};

use bookshop_core::checkout::{AddressInput, Field, PaymentInput};
use bookshop_core::{
    BookId, CartCandidate, CartChange, CartError, CartStore, CheckoutError, CheckoutFlow,
    CheckoutStep, CurrencyCode, Price,
};
use bookshop_integration_tests::{candidate, today, valid_address, valid_payment};
use chrono::NaiveDate;
use rust_decimal::Decimal;

// =============================================================================
// Basket Invariant Tests
// =============================================================================

#[test]
fn test_repeated_adds_merge_into_one_line() {
    for calls in 1..=5u32 {
        let mut cart = CartStore::default();
        for _ in 0..calls {
            cart.add_item(candidate("a", 100)).expect("same currency");
        }

        assert_eq!(cart.distinct_item_count(), 1);
        assert_eq!(cart.quantity_of(&BookId::from("a")), calls);
    }
}

#[test]
fn test_decrement_to_zero_removes_line() {
    let mut cart = CartStore::default();
    let id = BookId::from("a");
    for _ in 0..3 {
        cart.add_item(candidate("a", 100)).expect("same currency");
    }

    for _ in 0..3 {
        assert!(cart.decrement_quantity(&id).is_applied());
    }

    assert!(!cart.contains(&id));
    assert!(cart.is_empty());
    assert!(!cart.decrement_quantity(&id).is_applied());
}

#[test]
fn test_total_item_count_sums_quantities() {
    let mut cart = CartStore::default();
    cart.add_item(candidate("a", 100)).expect("same currency");
    cart.add_item(candidate("a", 100)).expect("same currency");
    cart.add_item(candidate("a", 100)).expect("same currency");
    cart.add_item(candidate("b", 100)).expect("same currency");

    assert_eq!(cart.total_item_count(), 4);
    assert_eq!(cart.distinct_item_count(), 2);
}

#[test]
fn test_total_price_ignores_add_order() {
    let mut forward = CartStore::default();
    let mut backward = CartStore::default();
    let adds = [("a", 1999), ("b", 401), ("a", 1999), ("c", 1)];

    for (id, cents) in adds {
        forward.add_item(candidate(id, cents)).expect("same currency");
    }
    for (id, cents) in adds.iter().rev() {
        backward.add_item(candidate(id, *cents)).expect("same currency");
    }

    assert_eq!(forward.total_price(), backward.total_price());
    assert_eq!(forward.total_price().display(), "$44.00");
}

#[test]
fn test_remove_missing_id_leaves_basket_identical() {
    let mut cart = CartStore::default();
    cart.add_item(candidate("a", 100)).expect("same currency");
    cart.add_item(candidate("b", 200)).expect("same currency");
    let before = cart.items().to_vec();

    assert!(!cart.remove_item(&BookId::from("zzz")).is_applied());
    assert_eq!(cart.items(), before.as_slice());
}

#[test]
fn test_subscribers_see_every_change_in_order() {
    let mut cart = CartStore::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handle = cart.subscribe(move |change, items| {
        sink.lock()
            .expect("lock poisoned")
            .push((change.clone(), items.len()));
    });

    let a = BookId::from("a");
    cart.add_item(candidate("a", 100)).expect("same currency");
    let _ = cart.increment_quantity(&a);
    let _ = cart.decrement_quantity(&a);
    let _ = cart.remove_item(&a);
    cart.clear_basket();
    assert!(cart.unsubscribe(handle));
    cart.add_item(candidate("b", 100)).expect("same currency");

    let seen = seen.lock().expect("lock poisoned");
    assert_eq!(
        *seen,
        vec![
            (CartChange::Added { id: a.clone() }, 1),
            (CartChange::Incremented { id: a.clone(), quantity: 2 }, 1),
            (CartChange::Decremented { id: a.clone(), quantity: 1 }, 1),
            (CartChange::Removed { id: a }, 0),
            (CartChange::Cleared, 0),
        ]
    );
}

#[test]
fn test_foreign_currency_never_mixes_into_total() {
    let mut cart = CartStore::default();
    cart.add_item(candidate("a", 1000)).expect("same currency");
    let euro = CartCandidate {
        unit_price: Price::new(Decimal::new(1000, 2), CurrencyCode::EUR).expect("valid price"),
        ..candidate("b", 0)
    };

    assert!(matches!(
        cart.add_item(euro),
        Err(CartError::CurrencyMismatch { found: CurrencyCode::EUR, .. })
    ));
    assert_eq!(cart.total_price().display(), "$10.00");
    assert_eq!(cart.distinct_item_count(), 1);
}

// =============================================================================
// Checkout Flow Tests
// =============================================================================

#[test]
fn test_blank_address_never_reaches_payment() {
    let mut flow = CheckoutFlow::start();
    let blanks = [
        AddressInput {
            address: String::new(),
            ..valid_address()
        },
        AddressInput {
            first_name: "   ".to_owned(),
            ..valid_address()
        },
        AddressInput::default(),
    ];

    for input in &blanks {
        let err = flow.submit_address(input).expect_err("blank field accepted");
        assert!(err.validation().is_some());
        assert_eq!(flow.step(), Some(CheckoutStep::Address));
    }

    let errors = flow
        .submit_address(&AddressInput::default())
        .expect_err("empty form accepted");
    let errors = errors.validation().expect("validation error");
    assert_eq!(errors.len(), 3);
    assert_eq!(errors.message_for(Field::FirstName), Some("First name is required"));
}

#[test]
fn test_payment_field_rules() {
    let after_jan_2024 = NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid date");
    let cases = [
        ("4242 4242 4242 4242", "12/99", "123", None),
        ("4242-4242-4242-4242", "12/99", "123", Some(Field::CardNumber)),
        ("4242 4242 4242 4242", "01/24", "123", Some(Field::ExpiryDate)),
        ("4242 4242 4242 4242", "13/30", "123", Some(Field::ExpiryDate)),
        ("4242 4242 4242 4242", "12/99", "12a", Some(Field::Cvc)),
        ("٤٢٤٢ ٤٢٤٢ ٤٢٤٢ ٤٢٤٢", "12/99", "123", Some(Field::CardNumber)),
        ("4242 4242 4242 4242", "12/99", "１２３", Some(Field::Cvc)),
    ];

    for (card_number, expiry_date, cvc, failing) in cases {
        let mut cart = CartStore::default();
        cart.add_item(candidate("a", 100)).expect("same currency");
        let mut flow = CheckoutFlow::start();
        flow.submit_address(&valid_address()).expect("address accepted");

        let input = PaymentInput {
            card_number: card_number.to_owned(),
            expiry_date: expiry_date.to_owned(),
            cvc: cvc.to_owned(),
        };
        let result = flow.submit_payment_at(&input, &mut cart, after_jan_2024);

        match failing {
            None => assert!(result.is_ok(), "{card_number} {expiry_date} {cvc} rejected"),
            Some(field) => {
                let err = result.expect_err("invalid payment accepted");
                assert!(err.validation().expect("validation error").has(field));
                assert_eq!(cart.total_item_count(), 1);
            }
        }
    }
}

#[test]
fn test_expiry_in_current_month_is_accepted() {
    let mut cart = CartStore::default();
    cart.add_item(candidate("a", 100)).expect("same currency");
    let mut flow = CheckoutFlow::start();
    flow.submit_address(&valid_address()).expect("address accepted");

    let input = PaymentInput {
        expiry_date: "06/24".to_owned(),
        ..valid_payment()
    };
    assert!(flow.submit_payment_at(&input, &mut cart, today()).is_ok());
}

#[test]
fn test_successful_payment_clears_two_item_basket() {
    let mut cart = CartStore::default();
    cart.add_item(candidate("a", 1500)).expect("same currency");
    cart.add_item(candidate("b", 899)).expect("same currency");
    assert_eq!(cart.total_item_count(), 2);

    let mut flow = CheckoutFlow::start();
    assert_eq!(
        flow.submit_address(&valid_address()).expect("address accepted"),
        CheckoutStep::Payment
    );
    let receipt = flow
        .submit_payment_at(&valid_payment(), &mut cart, today())
        .expect("payment accepted");

    assert_eq!(cart.total_item_count(), 0);
    assert_eq!(receipt.item_count, 2);
    assert_eq!(receipt.total.display(), "$23.99");
    assert_eq!(receipt.address.first_name, "Grace");
    assert!(!flow.is_active());

    let json = serde_json::to_value(&receipt).expect("receipt serialises");
    assert_eq!(json.get("itemCount"), Some(&serde_json::json!(2)));
    assert_eq!(json.pointer("/address/lastName"), Some(&serde_json::json!("Hopper")));
    assert!(json.get("lines").is_some_and(serde_json::Value::is_array));
}

#[test]
fn test_steps_cannot_be_skipped_or_replayed() {
    let mut cart = CartStore::default();
    cart.add_item(candidate("a", 100)).expect("same currency");
    let mut flow = CheckoutFlow::start();

    assert!(matches!(
        flow.submit_payment_at(&valid_payment(), &mut cart, today()),
        Err(CheckoutError::WrongStep { .. })
    ));

    flow.submit_address(&valid_address()).expect("address accepted");
    assert!(matches!(
        flow.submit_address(&valid_address()),
        Err(CheckoutError::WrongStep {
            expected: CheckoutStep::Address,
            actual: CheckoutStep::Payment
        })
    ));

    flow.submit_payment_at(&valid_payment(), &mut cart, today())
        .expect("payment accepted");
    assert!(matches!(
        flow.submit_address(&valid_address()),
        Err(CheckoutError::Closed)
    ));
}

#[test]
fn test_cancel_from_payment_keeps_basket() {
    let mut cart = CartStore::default();
    cart.add_item(candidate("a", 100)).expect("same currency");
    let mut flow = CheckoutFlow::start();
    flow.submit_address(&valid_address()).expect("address accepted");

    flow.cancel();

    assert!(!flow.is_active());
    assert_eq!(cart.total_item_count(), 1);
    assert!(matches!(
        flow.submit_payment_at(&valid_payment(), &mut cart, today()),
        Err(CheckoutError::Closed)
    ));
}
