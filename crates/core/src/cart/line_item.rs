//! Basket line items.

use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::types::{BookId, Price};

/// A catalog item offered to the basket, before it has a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCandidate {
    pub id: BookId,
    pub title: String,
    pub authors: Vec<String>,
    /// Opaque image reference, usually a URL.
    pub thumbnail: String,
    pub unit_price: Price,
}

/// One basket entry.
///
/// The quantity is a [`NonZeroU32`], so a line at quantity zero cannot be
/// represented. The cart drops the line instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: BookId,
    pub title: String,
    pub authors: Vec<String>,
    pub thumbnail: String,
    pub unit_price: Price,
    pub quantity: NonZeroU32,
}

impl LineItem {
    /// Create a line for a freshly added candidate (quantity 1).
    #[must_use]
    pub fn first_of(candidate: CartCandidate) -> Self {
        Self {
            id: candidate.id,
            title: candidate.title,
            authors: candidate.authors,
            thumbnail: candidate.thumbnail,
            unit_price: candidate.unit_price,
            quantity: NonZeroU32::MIN,
        }
    }

    /// Unit price multiplied by quantity, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity.get())
    }

    /// Authors joined for display ("A, B").
    #[must_use]
    pub fn authors_display(&self) -> String {
        self.authors.join(", ")
    }

    /// Increase quantity by one, saturating at `u32::MAX`.
    pub(crate) const fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    /// Decrease quantity by one.
    ///
    /// Returns `false` when the line would reach zero; the caller must then
    /// remove it. The stored quantity is left untouched in that case.
    pub(crate) fn decrement(&mut self) -> bool {
        match NonZeroU32::new(self.quantity.get() - 1) {
            Some(quantity) => {
                self.quantity = quantity;
                true
            }
            None => false,
        }
    }
}
