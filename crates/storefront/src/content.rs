//! Product catalog loading.
//!
//! The catalog is a JSON file read once at startup. Names, prices and images
//! come from this file only; cart requests carry nothing but a product id.
//!
//! ```json
//! {
//!   "currency": "INR",
//!   "products": [
//!     { "id": "alphonso-box", "name": "Alphonso Mango Box", "price": "₹1,200",
//!       "images": ["/static/img/alphonso-1.svg"] }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use bazaar_core::{Catalog, CatalogError};
use thiserror::Error;

/// Errors that can occur when loading the catalog.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        source: CatalogError,
    },
}

/// Read and validate the catalog at `path`.
///
/// # Errors
///
/// Returns `ContentError` if the file can't be read or any product is invalid.
pub fn load_catalog(path: &Path) -> Result<Catalog, ContentError> {
    let json = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let catalog = Catalog::from_json(&json).map_err(|source| ContentError::Catalog {
        path: path.to_path_buf(),
        source,
    })?;

    if catalog.is_empty() {
        tracing::warn!(path = %path.display(), "Catalog has no products");
    }

    Ok(catalog)
}
