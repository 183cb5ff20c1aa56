//! File-backed catalog provider.
//!
//! Reads a JSON dump in the catalog API's volume shape, either a bare array
//! of volumes or a `{ "items": [...] }` search response, and serves searches
//! from memory.

use std::path::Path;

use bookshop_core::catalog::{BookRecord, CatalogError, CatalogProvider};
use bookshop_core::{BookId, CurrencyCode, Price};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

const PLACEHOLDER_THUMBNAIL: &str = "https://via.placeholder.com/150";
const PLACEHOLDER_SMALL_THUMBNAIL: &str = "https://via.placeholder.com/100";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VolumeDump {
    Response {
        #[serde(default)]
        items: Vec<Volume>,
    },
    List(Vec<Volume>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    volume_info: VolumeInfo,
    #[serde(default)]
    sale_info: Option<SaleInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_links: Option<ImageLinks>,
    #[serde(default)]
    info_link: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleInfo {
    #[serde(default)]
    list_price: Option<Money>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Money {
    amount: serde_json::Number,
    currency_code: String,
}

// =============================================================================
// Type Conversions
// =============================================================================

fn convert_price(money: &Money, id: &str, fallback: CurrencyCode) -> Option<Price> {
    let amount = match money.amount.to_string().parse::<Decimal>() {
        Ok(amount) => amount,
        Err(e) => {
            warn!(id, amount = %money.amount, "Unparseable list price: {e}");
            return None;
        }
    };
    let currency = money.currency_code.parse().unwrap_or_else(|_| {
        warn!(id, code = %money.currency_code, "Unknown currency, using fallback");
        fallback
    });

    match Price::new(amount, currency) {
        Ok(price) => Some(price),
        Err(e) => {
            warn!(id, "Discarding list price: {e}");
            None
        }
    }
}

fn convert_volume(volume: Volume, fallback: CurrencyCode) -> BookRecord {
    let info = volume.volume_info;
    let images = info.image_links.unwrap_or_default();
    let list_price = volume
        .sale_info
        .and_then(|sale| sale.list_price)
        .and_then(|money| convert_price(&money, &volume.id, fallback));

    BookRecord {
        id: BookId::from(volume.id),
        title: info.title,
        authors: info.authors,
        description: info.description,
        thumbnail: images
            .thumbnail
            .unwrap_or_else(|| PLACEHOLDER_THUMBNAIL.to_string()),
        small_thumbnail: images
            .small_thumbnail
            .unwrap_or_else(|| PLACEHOLDER_SMALL_THUMBNAIL.to_string()),
        info_link: info.info_link,
        list_price,
    }
}

// =============================================================================
// Provider
// =============================================================================

/// In-memory catalog loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    books: Vec<BookRecord>,
}

impl JsonCatalog {
    /// Load a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unavailable`] if the file cannot be read and
    /// [`CatalogError::Malformed`] if it is not a volume dump.
    pub fn open(path: &Path, fallback: CurrencyCode) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Unavailable(format!("{}: {e}", path.display())))?;
        let catalog = Self::from_json(&json, fallback)?;
        info!(path = %path.display(), books = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// Parse a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Malformed`] if the JSON is not a volume dump.
    pub fn from_json(json: &str, fallback: CurrencyCode) -> Result<Self, CatalogError> {
        let dump: VolumeDump =
            serde_json::from_str(json).map_err(|e| CatalogError::Malformed(e.to_string()))?;
        let volumes = match dump {
            VolumeDump::Response { items } => items,
            VolumeDump::List(items) => items,
        };

        Ok(Self {
            books: volumes
                .into_iter()
                .map(|volume| convert_volume(volume, fallback))
                .collect(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

fn matches_query(book: &BookRecord, needle: &str) -> bool {
    book.title.to_lowercase().contains(needle)
        || book
            .authors
            .iter()
            .any(|author| author.to_lowercase().contains(needle))
}

impl CatalogProvider for JsonCatalog {
    fn search(
        &self,
        query: &str,
        start_index: usize,
        page_size: usize,
    ) -> Result<Vec<BookRecord>, CatalogError> {
        let needle = query.trim().to_lowercase();
        let results: Vec<BookRecord> = self
            .books
            .iter()
            .filter(|book| matches_query(book, &needle))
            .skip(start_index)
            .take(page_size)
            .cloned()
            .collect();

        debug!(query, start_index, hits = results.len(), "Catalog search");
        Ok(results)
    }

    fn book(&self, id: &BookId) -> Result<Option<BookRecord>, CatalogError> {
        Ok(self.books.iter().find(|book| &book.id == id).cloned())
    }
}
