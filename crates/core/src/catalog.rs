//! Read-only product catalog.
//!
//! The catalog is the only source of product names, prices and images. Cart
//! requests name a product by id and the cart copies everything else from
//! here, so prices are validated once when the catalog is loaded and never
//! taken from the page.
//!
//! # File Format
//!
//! ```json
//! {
//!   "currency": "INR",
//!   "products": [
//!     { "id": "mango-pickle", "name": "Mango Pickle", "price": "₹249", "images": ["/static/images/mango-1.jpg"] }
//!   ]
//! }
//! ```
//!
//! `price` may be a string (parsed like page text) or a JSON number.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{CurrencyCode, Price, PriceError, ProductId, ProductIdError};

/// Errors that can occur when building a [`Catalog`].
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// The catalog file is not valid JSON or has the wrong shape.
    #[error("invalid catalog file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A product id is malformed.
    #[error("invalid product id {id:?}: {source}")]
    InvalidId {
        id: String,
        #[source]
        source: ProductIdError,
    },

    /// A product price is malformed or negative.
    #[error("invalid price for product {id}: {source}")]
    InvalidPrice {
        id: ProductId,
        #[source]
        source: PriceError,
    },

    /// A product has an empty or whitespace-only name.
    #[error("product {0} has a blank name")]
    BlankName(ProductId),

    /// Two products share an id.
    #[error("duplicate product id: {0}")]
    DuplicateProduct(ProductId),
}

/// A product as listed on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    /// Image references in carousel order. The first one is active on load.
    pub images: Vec<String>,
}

impl CatalogProduct {
    /// Image reference for the carousel position `active`.
    ///
    /// Falls back to the first image when no position is given or it is out
    /// of range, and to `""` when the product has no images.
    #[must_use]
    pub fn image_ref(&self, active: Option<usize>) -> &str {
        active
            .and_then(|index| self.images.get(index))
            .or_else(|| self.images.first())
            .map_or("", String::as_str)
    }
}

/// The storefront's product list, in page order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    currency: CurrencyCode,
    products: Vec<CatalogProduct>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog from already-validated products.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateProduct`] if two products share an id.
    pub fn from_products(
        currency: CurrencyCode,
        products: Vec<CatalogProduct>,
    ) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            if index.insert(product.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
        }

        Ok(Self {
            currency,
            products,
            index,
        })
    }

    /// Parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, an id, name or price is
    /// invalid, or an id is repeated.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let currency = file.currency;

        let products = file
            .products
            .into_iter()
            .map(|raw| {
                let id = ProductId::parse(&raw.id).map_err(|source| CatalogError::InvalidId {
                    id: raw.id.clone(),
                    source,
                })?;
                let name = raw.name.trim();
                if name.is_empty() {
                    return Err(CatalogError::BlankName(id));
                }
                let name = name.to_string();
                let price = raw
                    .price
                    .into_price(currency)
                    .map_err(|source| CatalogError::InvalidPrice {
                        id: id.clone(),
                        source,
                    })?;
                Ok(CatalogProduct {
                    id,
                    name,
                    price,
                    images: raw.images,
                })
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        Self::from_products(currency, products)
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CatalogProduct> {
        self.index
            .get(id)
            .and_then(|&position| self.products.get(position))
    }

    /// All products in page order.
    #[must_use]
    pub fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    /// Currency every price in the catalog is denominated in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

// =============================================================================
// File Format
// =============================================================================

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    currency: CurrencyCode,
    products: Vec<RawProduct>,
}

#[derive(Deserialize)]
struct RawProduct {
    id: String,
    name: String,
    price: RawPrice,
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Text(String),
    Number(serde_json::Number),
}

impl RawPrice {
    fn into_price(self, currency: CurrencyCode) -> Result<Price, PriceError> {
        match self {
            Self::Text(text) => Price::parse(&text, currency),
            Self::Number(number) => {
                let text = number.to_string();
                let amount = Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map_err(|_| PriceError::NotANumber(text))?;
                Price::new(amount, currency)
            }
        }
    }
}
