//! Catalog records and the provider seam.
//!
//! The catalog itself lives elsewhere. The core only sees fully parsed
//! [`BookRecord`]s handed over by a [`CatalogProvider`], and turns them into
//! [`CartCandidate`]s.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cart::CartCandidate;
use crate::types::{BookId, CurrencyCode, Price};

/// Query used when the user has not typed anything.
pub const DEFAULT_QUERY: &str = "javascript";

/// Results per search page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Errors from a catalog provider.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The backing source could not be read.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),

    /// The backing source returned something we could not understand.
    #[error("Malformed catalog data: {0}")]
    Malformed(String),
}

/// A book as returned by the catalog provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Description, possibly containing HTML markup.
    #[serde(default)]
    pub description: Option<String>,
    pub thumbnail: String,
    pub small_thumbnail: String,
    #[serde(default)]
    pub info_link: Option<String>,
    /// Missing for books that are not for sale.
    #[serde(default)]
    pub list_price: Option<Price>,
}

impl BookRecord {
    /// Description with markup removed and common entities decoded.
    #[must_use]
    pub fn plain_description(&self) -> String {
        self.description
            .as_deref()
            .map(strip_html)
            .unwrap_or_default()
    }

    /// List price, or zero in `fallback` when the book has none.
    #[must_use]
    pub fn price_or_zero(&self, fallback: CurrencyCode) -> Price {
        self.list_price.unwrap_or(Price::zero(fallback))
    }

    /// Basket candidate for this book.
    #[must_use]
    pub fn to_candidate(&self, fallback: CurrencyCode) -> CartCandidate {
        CartCandidate {
            id: self.id.clone(),
            title: self.title.clone(),
            authors: self.authors.clone(),
            thumbnail: self.small_thumbnail.clone(),
            unit_price: self.price_or_zero(fallback),
        }
    }
}

impl From<&BookRecord> for CartCandidate {
    fn from(record: &BookRecord) -> Self {
        record.to_candidate(CurrencyCode::default())
    }
}

/// Remove tags, decode the handful of entities catalog descriptions use,
/// and collapse whitespace.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Source of book records.
pub trait CatalogProvider {
    /// One page of results for `query`, starting at `start_index`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the source cannot be queried.
    fn search(
        &self,
        query: &str,
        start_index: usize,
        page_size: usize,
    ) -> Result<Vec<BookRecord>, CatalogError>;

    /// A single book by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the source cannot be queried.
    fn book(&self, id: &BookId) -> Result<Option<BookRecord>, CatalogError>;
}

/// Current search query and page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    query: String,
    default_query: String,
    page: usize,
    page_size: usize,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY, DEFAULT_PAGE_SIZE)
    }
}

impl SearchState {
    #[must_use]
    pub fn new(default_query: &str, page_size: usize) -> Self {
        Self {
            query: default_query.to_owned(),
            default_query: default_query.to_owned(),
            page: 0,
            page_size: page_size.max(1),
        }
    }

    /// Set a new query and go back to the first page. A blank query falls
    /// back to the default.
    pub fn set_query(&mut self, query: &str) {
        let query = query.trim();
        self.query = if query.is_empty() {
            self.default_query.clone()
        } else {
            query.to_owned()
        };
        self.page = 0;
    }

    pub const fn next_page(&mut self) {
        self.page += 1;
    }

    /// Returns `false` when already on the first page.
    pub const fn previous_page(&mut self) -> bool {
        if self.page == 0 {
            return false;
        }
        self.page -= 1;
        true
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Index of the first result on the current page.
    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.page * self.page_size
    }

    /// Run the current query against `provider`.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error.
    pub fn run(&self, provider: &dyn CatalogProvider) -> Result<Vec<BookRecord>, CatalogError> {
        provider.search(&self.query, self.start_index(), self.page_size)
    }
}
