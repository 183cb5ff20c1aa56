//! Bookshop Core - basket state and checkout validation.
//!
//! This crate holds the parts of the Bookshop storefront that carry real
//! invariants:
//! - [`cart`] - the basket (merge on duplicate add, prune at zero, totals,
//!   change notifications)
//! - [`checkout`] - the two-step address/payment flow and its validators
//! - [`catalog`] - book records handed over by a catalog provider
//!
//! # Architecture
//!
//! The core crate contains only types, state machines and traits - no I/O,
//! no terminal, no network. Every operation is synchronous and runs to
//! completion; callers own the [`CartStore`] and pass it where it is needed.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod types;

pub use cart::{CartCandidate, CartChange, CartError, CartStore, CartUpdate, LineItem};
pub use catalog::{BookRecord, CatalogError, CatalogProvider, SearchState};
pub use checkout::{
    AddressInput, CheckoutError, CheckoutFlow, CheckoutReceipt, CheckoutStep, PaymentInput,
};
pub use types::*;
