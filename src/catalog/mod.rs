//! Food catalog (OpenFoodFacts) adapter
//!
//! Search and product lookup against the public catalog, normalised into
//! [`CatalogProduct`] records, with a read-through cache for searches.

pub mod cache;
pub mod client;
pub mod product;
pub mod transport;

use thiserror::Error;

pub use cache::{CacheError, CacheStore, MemoryCache, SqliteCache};
pub use client::{is_barcode, CatalogClient};
pub use product::{to_float, CatalogProduct};
pub use transport::{CatalogTransport, HttpResponse, HttpTransport};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Network(String),

    #[error("Catalog returned HTTP {0}")]
    Status(u16),

    #[error("Catalog response could not be decoded: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CatalogError::Decode(e.to_string())
        } else {
            CatalogError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Decode(e.to_string())
    }
}
