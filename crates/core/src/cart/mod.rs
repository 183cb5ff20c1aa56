//! In-memory basket state.
//!
//! [`CartStore`] owns the ordered list of [`LineItem`]s and is the only way
//! to change it. Two invariants hold after every operation:
//!
//! - at most one line per [`BookId`]
//! - every line has a quantity of at least 1
//! - every line is priced in the store's currency
//!
//! Operations on an id that is not in the basket are silent no-ops. They
//! report [`CartUpdate::NotFound`] so a caller can tell, but they are never
//! errors.
//!
//! Observers register with [`CartStore::subscribe`] and are called
//! synchronously, in subscription order, after each change is applied.

mod line_item;

pub use line_item::{CartCandidate, LineItem};

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{BookId, CurrencyCode, Price, SubscriptionId};

/// Errors from adding to the basket.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// The candidate is priced in a different currency than the basket.
    #[error("{id} is priced in {found}, the basket is in {expected}")]
    CurrencyMismatch {
        id: BookId,
        expected: CurrencyCode,
        found: CurrencyCode,
    },
}

/// What a mutation did to the basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum CartUpdate {
    /// The basket changed.
    Applied,
    /// The id was not in the basket; nothing changed.
    NotFound,
}

impl CartUpdate {
    /// Whether the basket changed.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Change notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartChange {
    /// A new line was appended.
    Added { id: BookId },
    /// An existing line went up by one.
    Incremented { id: BookId, quantity: u32 },
    /// An existing line went down by one and is still in the basket.
    Decremented { id: BookId, quantity: u32 },
    /// A line left the basket, either explicitly or by reaching zero.
    Removed { id: BookId },
    /// The basket was emptied.
    Cleared,
}

/// Subscriber callback. Receives the change and the basket after it.
pub type CartListener = Box<dyn FnMut(&CartChange, &[LineItem]) + Send>;

/// Owner of the basket.
pub struct CartStore {
    items: Vec<LineItem>,
    currency: CurrencyCode,
    subscribers: Vec<(SubscriptionId, CartListener)>,
    next_subscription: u64,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(CurrencyCode::default())
    }
}

impl core::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.items)
            .field("currency", &self.currency)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl CartStore {
    /// Create an empty basket priced in `currency`.
    #[must_use]
    pub const fn new(currency: CurrencyCode) -> Self {
        Self {
            items: Vec::new(),
            currency,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `candidate`.
    ///
    /// If the id is already in the basket this is the same as
    /// [`increment_quantity`](Self::increment_quantity); otherwise a new line
    /// with quantity 1 is appended.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the candidate is not priced
    /// in the store's currency. The basket is left unchanged.
    pub fn add_item(&mut self, candidate: CartCandidate) -> Result<(), CartError> {
        let found = candidate.unit_price.currency_code();
        if found != self.currency {
            warn!(
                id = %candidate.id,
                %found,
                expected = %self.currency,
                "Rejected item in foreign currency"
            );
            return Err(CartError::CurrencyMismatch {
                id: candidate.id,
                expected: self.currency,
                found,
            });
        }

        if self.position(&candidate.id).is_some() {
            let _ = self.increment_quantity(&candidate.id);
            return Ok(());
        }

        debug!(id = %candidate.id, title = %candidate.title, "Adding item to basket");
        let id = candidate.id.clone();
        self.items.push(LineItem::first_of(candidate));
        self.notify(&CartChange::Added { id });
        Ok(())
    }

    /// Increase the quantity of `id` by one. Never creates a line.
    pub fn increment_quantity(&mut self, id: &BookId) -> CartUpdate {
        let Some(line) = self.items.iter_mut().find(|line| &line.id == id) else {
            warn!(%id, "Increment for item not in basket");
            return CartUpdate::NotFound;
        };

        line.increment();
        let quantity = line.quantity.get();
        debug!(%id, quantity, "Incremented basket quantity");
        self.notify(&CartChange::Incremented {
            id: id.clone(),
            quantity,
        });
        CartUpdate::Applied
    }

    /// Decrease the quantity of `id` by one, removing the line at zero.
    pub fn decrement_quantity(&mut self, id: &BookId) -> CartUpdate {
        let Some(index) = self.position(id) else {
            warn!(%id, "Decrement for item not in basket");
            return CartUpdate::NotFound;
        };

        let still_present = self
            .items
            .get_mut(index)
            .is_some_and(LineItem::decrement);
        let change = if still_present {
            CartChange::Decremented {
                id: id.clone(),
                quantity: self.quantity_of(id),
            }
        } else {
            self.items.remove(index);
            CartChange::Removed { id: id.clone() }
        };

        debug!(?change, "Decremented basket quantity");
        self.notify(&change);
        CartUpdate::Applied
    }

    /// Remove the line for `id` regardless of its quantity.
    pub fn remove_item(&mut self, id: &BookId) -> CartUpdate {
        let Some(index) = self.position(id) else {
            warn!(%id, "Remove for item not in basket");
            return CartUpdate::NotFound;
        };

        self.items.remove(index);
        debug!(%id, "Removed item from basket");
        self.notify(&CartChange::Removed { id: id.clone() });
        CartUpdate::Applied
    }

    /// Empty the basket. Subscribers are notified even if it was empty.
    pub fn clear_basket(&mut self) {
        debug!(lines = self.items.len(), "Clearing basket");
        self.items.clear();
        self.notify(&CartChange::Cleared);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Quantity of `id`, or 0 if it is not in the basket.
    #[must_use]
    pub fn quantity_of(&self, id: &BookId) -> u32 {
        self.get(id).map_or(0, |line| line.quantity.get())
    }

    /// Sum of all quantities (not the number of distinct lines).
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity.get()))
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn distinct_item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of unit price times quantity in the store's currency, rounded to
    /// two decimals.
    #[must_use]
    pub fn total_price(&self) -> Price {
        let currency = self.currency;
        let amount: Decimal = self
            .items
            .iter()
            .map(|line| line.line_total().amount())
            .sum();

        Price::new(amount, currency)
            .unwrap_or_else(|_| Price::zero(currency))
            .rounded()
    }

    /// Currency every line is priced in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: &BookId) -> Option<&LineItem> {
        self.items.iter().find(|line| &line.id == id)
    }

    /// Whether `id` has a line in the basket.
    #[must_use]
    pub fn contains(&self, id: &BookId) -> bool {
        self.get(id).is_some()
    }

    /// Whether the basket has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Register a callback invoked after every change to the basket.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CartChange, &[LineItem]) + Send + 'static,
    {
        let id = SubscriptionId::new(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns `false` if the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self, change: &CartChange) {
        for (_, listener) in &mut self.subscribers {
            listener(change, &self.items);
        }
    }

    fn position(&self, id: &BookId) -> Option<usize> {
        self.items.iter().position(|line| &line.id == id)
    }
}
