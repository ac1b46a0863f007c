//! Cart summary projection.
//!
//! [`render`] turns a [`CartSnapshot`] into a [`CartView`]: every string the
//! page shows, already formatted. It is a pure function, and each view fully
//! replaces the previous one. Templates never patch rows in place.

use serde::Serialize;

use crate::cart::{CartLine, CartSnapshot};
use crate::types::CurrencyCode;

/// Placeholder shown instead of the line list when the cart is empty.
pub const EMPTY_CART_PLACEHOLDER: &str = "Your cart is empty.";

/// Smallest value the quantity editor accepts.
pub const MIN_QUANTITY: u32 = 1;

/// Display data for one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartRowView {
    pub product_id: String,
    pub name: String,
    pub image_ref: String,
    /// Unit price, currency-prefixed.
    pub unit_price: String,
    /// `unit_price × quantity`, currency-prefixed, two decimal places.
    pub line_total: String,
    /// Current quantity; the editor's initial value.
    pub quantity: u32,
    /// Lower bound for the quantity editor.
    pub quantity_min: u32,
}

/// Display data for the whole cart summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    /// One row per cart line. Empty rows mean the placeholder is shown.
    pub rows: Vec<CartRowView>,
    pub grand_total: String,
    pub item_count: u64,
    /// Cart revision this view was rendered from.
    pub revision: u64,
}

impl CartView {
    /// Whether this view shows the empty-cart placeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Text shown instead of the line list, if the cart is empty.
    #[must_use]
    pub fn placeholder(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_CART_PLACEHOLDER)
    }
}

/// Render a cart snapshot.
#[must_use]
pub fn render(snapshot: &CartSnapshot) -> CartView {
    let currency = snapshot.currency();
    let rows: Vec<CartRowView> = snapshot
        .lines()
        .iter()
        .map(|line| render_row(line, currency))
        .collect();

    CartView {
        rows,
        grand_total: currency.format(snapshot.grand_total()),
        item_count: snapshot.item_count(),
        revision: snapshot.revision(),
    }
}

fn render_row(line: &CartLine, currency: CurrencyCode) -> CartRowView {
    CartRowView {
        product_id: line.product_id().to_string(),
        name: line.name().to_string(),
        image_ref: line.image_ref().to_string(),
        unit_price: currency.format(line.unit_price()),
        line_total: currency.format(line.line_total()),
        quantity: line.quantity().max(MIN_QUANTITY),
        quantity_min: MIN_QUANTITY,
    }
}
