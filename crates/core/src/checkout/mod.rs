//! Two-step checkout.
//!
//! A [`CheckoutFlow`] walks one [`CheckoutSession`] through the address step
//! and then the payment step. Each submit validates the whole step; on
//! failure the session is left exactly as it was. A valid payment completes
//! the checkout: the basket is cleared, a [`CheckoutReceipt`] is returned and
//! the session is closed. No payment gateway is contacted.
//!
//! ```text
//!            submit_address (valid)
//!   Address ───────────────────────► Payment ──── submit_payment (valid) ──► closed
//!      ▲                               │
//!      └──────── go_back_to_address ───┘
//!
//!   cancel: any state ──► closed (basket untouched)
//! ```

pub mod validation;

use core::fmt;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

pub use validation::{
    AddressInfo, AddressInput, CardNumber, ExpiryDate, Field, FieldCheck, FieldError,
    PaymentInfo, PaymentInput, ValidationErrors, validate_address, validate_payment,
};

use crate::cart::{CartStore, LineItem};
use crate::types::{CheckoutSessionId, Price};

/// Checkout step currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Address,
    Payment,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Payment => write!(f, "payment"),
        }
    }
}

/// Errors returned by [`CheckoutFlow`] operations.
///
/// None of these change the session.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// One or more fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The submit does not belong to the current step.
    #[error("Checkout is on the {actual} step, not {expected}")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },

    /// The session was completed or cancelled.
    #[error("Checkout session is closed")]
    Closed,

    /// Payment was submitted for an empty basket.
    #[error("Basket is empty")]
    EmptyBasket,
}

impl CheckoutError {
    /// Field errors, if this is a validation failure.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Transient state of one checkout attempt.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    id: CheckoutSessionId,
    step: CheckoutStep,
    address: Option<AddressInfo>,
    payment: Option<PaymentInfo>,
}

impl CheckoutSession {
    fn new() -> Self {
        Self {
            id: CheckoutSessionId::generate(),
            step: CheckoutStep::Address,
            address: None,
            payment: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> CheckoutSessionId {
        self.id
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Address accepted by the last successful address submit.
    #[must_use]
    pub const fn address(&self) -> Option<&AddressInfo> {
        self.address.as_ref()
    }

    #[must_use]
    pub const fn payment(&self) -> Option<&PaymentInfo> {
        self.payment.as_ref()
    }
}

/// Result of a completed checkout.
///
/// Secrets are not carried; the card appears masked.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub session_id: CheckoutSessionId,
    pub address: AddressInfo,
    pub card: String,
    pub expiry: String,
    pub lines: Vec<LineItem>,
    pub item_count: u32,
    pub total: Price,
}

/// Drives a single checkout session.
#[derive(Debug)]
pub struct CheckoutFlow {
    session: Option<CheckoutSession>,
}

impl CheckoutFlow {
    /// Open a new session on the address step.
    #[must_use]
    pub fn start() -> Self {
        let session = CheckoutSession::new();
        info!(session_id = %session.id, "Checkout started");
        Self {
            session: Some(session),
        }
    }

    /// The open session, or `None` once completed or cancelled.
    #[must_use]
    pub const fn session(&self) -> Option<&CheckoutSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Current step of the open session.
    #[must_use]
    pub fn step(&self) -> Option<CheckoutStep> {
        self.session.as_ref().map(CheckoutSession::step)
    }

    /// Gate for the address "proceed" action: on the address step and
    /// every field filled in. Format is checked on submit.
    #[must_use]
    pub fn can_submit_address(&self, input: &AddressInput) -> bool {
        self.step() == Some(CheckoutStep::Address) && input.is_complete()
    }

    /// Gate for the payment "proceed" action.
    #[must_use]
    pub fn can_submit_payment(&self, input: &PaymentInput) -> bool {
        self.step() == Some(CheckoutStep::Payment) && input.is_complete()
    }

    /// Validate the address and move to the payment step.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Validation`] if any field is blank
    /// - [`CheckoutError::WrongStep`] if the session is on the payment step
    /// - [`CheckoutError::Closed`] if the session has ended
    pub fn submit_address(&mut self, input: &AddressInput) -> Result<CheckoutStep, CheckoutError> {
        let session = self.open_on(CheckoutStep::Address)?;
        let address = validate_address(input).inspect_err(|errors| {
            debug!(session_id = %session.id, %errors, "Address rejected");
        })?;

        session.address = Some(address);
        session.step = CheckoutStep::Payment;
        info!(session_id = %session.id, "Address accepted, moving to payment");
        Ok(session.step)
    }

    /// Validate payment against today's date and complete the checkout.
    ///
    /// # Errors
    ///
    /// See [`submit_payment_at`](Self::submit_payment_at).
    pub fn submit_payment(
        &mut self,
        input: &PaymentInput,
        cart: &mut CartStore,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        self.submit_payment_at(input, cart, Local::now().date_naive())
    }

    /// Validate payment against `today` and complete the checkout.
    ///
    /// On success the basket is cleared and the session is closed.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Validation`] if any payment field is invalid
    /// - [`CheckoutError::WrongStep`] if the session is on the address step
    /// - [`CheckoutError::Closed`] if the session has ended
    /// - [`CheckoutError::EmptyBasket`] if there is nothing to pay for
    pub fn submit_payment_at(
        &mut self,
        input: &PaymentInput,
        cart: &mut CartStore,
        today: NaiveDate,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let session = self.open_on(CheckoutStep::Payment)?;
        if cart.is_empty() {
            debug!(session_id = %session.id, "Payment rejected, basket is empty");
            return Err(CheckoutError::EmptyBasket);
        }
        let payment = validate_payment(input, today).inspect_err(|errors| {
            debug!(session_id = %session.id, %errors, "Payment rejected");
        })?;

        // The address step always runs before payment, so this is only
        // `None` if the session was constructed by hand.
        let address = session.address.clone().ok_or(CheckoutError::WrongStep {
            expected: CheckoutStep::Address,
            actual: CheckoutStep::Payment,
        })?;

        let receipt = CheckoutReceipt {
            session_id: session.id,
            address,
            card: payment.card_number.masked(),
            expiry: payment.expiry.to_string(),
            lines: cart.items().to_vec(),
            item_count: cart.total_item_count(),
            total: cart.total_price(),
        };
        session.payment = Some(payment);

        info!(
            session_id = %receipt.session_id,
            card = %receipt.card,
            items = receipt.item_count,
            total = %receipt.total,
            "Checkout completed"
        );

        cart.clear_basket();
        self.session = None;
        Ok(receipt)
    }

    /// Return to the address step without validation. The accepted address
    /// is kept so the form can be pre-filled.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Closed`] if the session has ended.
    pub fn go_back_to_address(&mut self) -> Result<CheckoutStep, CheckoutError> {
        let session = self.session.as_mut().ok_or(CheckoutError::Closed)?;
        if session.step != CheckoutStep::Address {
            debug!(session_id = %session.id, "Going back to address step");
        }
        session.step = CheckoutStep::Address;
        Ok(session.step)
    }

    /// Discard the session from any state. The basket is not touched.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            info!(session_id = %session.id, step = %session.step, "Checkout cancelled");
        }
    }

    fn open_on(&mut self, expected: CheckoutStep) -> Result<&mut CheckoutSession, CheckoutError> {
        let session = self.session.as_mut().ok_or(CheckoutError::Closed)?;
        if session.step != expected {
            return Err(CheckoutError::WrongStep {
                expected,
                actual: session.step,
            });
        }
        Ok(session)
    }
}
