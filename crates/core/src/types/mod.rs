//! Core types for the Bookshop storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;

pub use id::{BookId, CheckoutSessionId, SubscriptionId};
pub use price::{CurrencyCode, Price, PriceError};
