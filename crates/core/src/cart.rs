//! In-memory cart store.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s keyed by product id. It is
//! created empty when the page loads, mutated only through the methods here,
//! and cleared after a confirmed checkout. Totals are derived on demand and
//! never stored.
//!
//! # Invariants
//!
//! - At most one line per product id; adding an existing id merges quantities.
//! - Every stored quantity is at least 1. Setting a quantity below 1 removes
//!   the line instead.
//! - Lines keep insertion order: the first product added stays first.
//! - Every line total and the grand total fit in a [`Decimal`]. Adds and
//!   quantity changes that would overflow are refused before the cart changes.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::CatalogProduct;
use crate::types::{CurrencyCode, ProductId};

/// Errors returned by cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// An add was requested with a quantity below 1.
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(i64),

    /// The resulting quantity does not fit in a cart line.
    #[error("quantity is too large")]
    QuantityOverflow,

    /// The resulting line total or grand total is not representable.
    #[error("cart total is too large")]
    TotalOverflow,

    /// The unit price is below zero.
    #[error("unit price cannot be negative")]
    InvalidPrice,

    /// No line exists for the product.
    #[error("product {0} is not in the cart")]
    NotFound(ProductId),
}

/// One product-quantity pairing in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    product_id: ProductId,
    name: String,
    unit_price: Decimal,
    quantity: u32,
    image_ref: String,
}

impl CartLine {
    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn image_ref(&self) -> &str {
        &self.image_ref
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        // Stored lines never overflow; see `Cart::ensure_total_fits`.
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }
}

fn checked_line_total(unit_price: Decimal, quantity: u32) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity))
}

/// The authoritative cart state for one page.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: CurrencyCode,
    revision: u64,
}

impl Cart {
    /// Create an empty cart priced in `currency`.
    #[must_use]
    pub const fn new(currency: CurrencyCode) -> Self {
        Self {
            lines: Vec::new(),
            currency,
            revision: 0,
        }
    }

    /// Add `quantity` of a product, merging into an existing line if present.
    ///
    /// When the product is already in the cart only its quantity changes; the
    /// name, price and image of the existing line are kept.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity < 1`
    /// - [`CartError::InvalidPrice`] if `unit_price` is negative
    /// - [`CartError::QuantityOverflow`] if the merged quantity exceeds `u32::MAX`
    /// - [`CartError::TotalOverflow`] if the line or grand total would overflow
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: i64,
        image_ref: impl Into<String>,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let quantity = u32::try_from(quantity).map_err(|_| CartError::QuantityOverflow)?;

        let existing = self
            .get(&product_id)
            .map(|line| (line.unit_price, line.quantity));

        if let Some((line_price, line_quantity)) = existing {
            let merged = line_quantity
                .checked_add(quantity)
                .ok_or(CartError::QuantityOverflow)?;
            self.ensure_total_fits(&product_id, line_price, merged)?;
            if let Some(line) = self.line_mut(&product_id) {
                line.quantity = merged;
            }
        } else {
            if unit_price < Decimal::ZERO {
                return Err(CartError::InvalidPrice);
            }
            self.ensure_total_fits(&product_id, unit_price, quantity)?;
            self.lines.push(CartLine {
                product_id,
                name: name.into(),
                unit_price,
                quantity,
                image_ref: image_ref.into(),
            });
        }

        self.bump();
        Ok(())
    }

    /// Add a catalog product, using the image at carousel position `active_image`.
    ///
    /// # Errors
    ///
    /// See [`Cart::add_item`].
    pub fn add_product(
        &mut self,
        product: &CatalogProduct,
        quantity: i64,
        active_image: Option<usize>,
    ) -> Result<(), CartError> {
        self.add_item(
            product.id.clone(),
            product.name.clone(),
            product.price.amount,
            quantity,
            product.image_ref(active_image),
        )
    }

    /// Set a line's quantity exactly. A quantity below 1 removes the line.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotFound`] if the product is not in the cart
    /// - [`CartError::QuantityOverflow`] if `new_quantity` exceeds `u32::MAX`
    /// - [`CartError::TotalOverflow`] if the line or grand total would overflow
    pub fn set_quantity(
        &mut self,
        product_id: &ProductId,
        new_quantity: i64,
    ) -> Result<(), CartError> {
        let position = self
            .position(product_id)
            .ok_or_else(|| CartError::NotFound(product_id.clone()))?;

        if new_quantity < 1 {
            self.lines.remove(position);
        } else {
            let quantity =
                u32::try_from(new_quantity).map_err(|_| CartError::QuantityOverflow)?;
            let unit_price = self
                .lines
                .get(position)
                .map_or(Decimal::ZERO, |line| line.unit_price);
            self.ensure_total_fits(product_id, unit_price, quantity)?;
            if let Some(line) = self.lines.get_mut(position) {
                line.quantity = quantity;
            }
        }

        self.bump();
        Ok(())
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let Some(position) = self.position(product_id) else {
            return false;
        };
        self.lines.remove(position);
        self.bump();
        true
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.bump();
    }

    /// Immutable copy of the current state with derived totals.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            grand_total: self.grand_total(),
            item_count: self.item_count(),
            currency: self.currency,
            revision: self.revision,
        }
    }

    /// Sum of line totals; zero for an empty cart.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.lines
            .iter()
            .fold(Decimal::ZERO, |total, line| total.saturating_add(line.line_total()))
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Counter bumped by every mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| &line.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| &line.product_id == product_id)
    }

    /// Check that the cart's totals stay representable with `product_id`'s
    /// line set to `quantity` at `unit_price`.
    fn ensure_total_fits(
        &self,
        product_id: &ProductId,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<(), CartError> {
        let changed = checked_line_total(unit_price, quantity).ok_or(CartError::TotalOverflow)?;
        self.lines
            .iter()
            .filter(|line| &line.product_id != product_id)
            .try_fold(changed, |total, line| {
                checked_line_total(line.unit_price, line.quantity)
                    .and_then(|line_total| total.checked_add(line_total))
            })
            .map(|_| ())
            .ok_or(CartError::TotalOverflow)
    }

    const fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Point-in-time copy of a cart, handed to the renderer and the submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
    grand_total: Decimal,
    item_count: u64,
    currency: CurrencyCode,
    revision: u64,
}

impl CartSnapshot {
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub const fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    #[must_use]
    pub const fn item_count(&self) -> u64 {
        self.item_count
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn cart_with(lines: &[(&str, Decimal, i64)]) -> Cart {
        let mut cart = Cart::default();
        for (product, price, quantity) in lines {
            cart.add_item(id(product), *product, *price, *quantity, "")
                .unwrap();
        }
        cart
    }

    #[test]
    fn test_new_cart_is_empty() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert_eq!(cart.grand_total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_add_same_product_merges() {
        let cart = cart_with(&[("A", dec!(100), 2), ("A", dec!(100), 3)]);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.get(&id("A")).unwrap().quantity(), 5);
    }

    #[test]
    fn test_merge_keeps_original_line_details() {
        let mut cart = Cart::default();
        cart.add_item(id("A"), "First", dec!(10), 1, "a.jpg").unwrap();
        cart.add_item(id("A"), "Second", dec!(99), 1, "b.jpg").unwrap();

        let line = cart.get(&id("A")).unwrap();
        assert_eq!(line.name(), "First");
        assert_eq!(line.unit_price(), dec!(10));
        assert_eq!(line.image_ref(), "a.jpg");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let cart = cart_with(&[("B", dec!(1), 1), ("A", dec!(1), 1), ("B", dec!(1), 1)]);
        let ids: Vec<&str> = cart.lines().iter().map(|l| l.product_id().as_str()).collect();
        assert_eq!(ids, ["B", "A"]);
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut cart = Cart::default();
        assert_eq!(
            cart.add_item(id("A"), "A", dec!(1), 0, ""),
            Err(CartError::InvalidQuantity(0))
        );
        assert_eq!(
            cart.add_item(id("A"), "A", dec!(1), -3, ""),
            Err(CartError::InvalidQuantity(-3))
        );
        assert!(cart.is_empty());
        assert_eq!(cart.revision(), 0);
    }

    #[test]
    fn test_add_rejects_negative_price() {
        let mut cart = Cart::default();
        assert_eq!(
            cart.add_item(id("A"), "A", dec!(-1), 1, ""),
            Err(CartError::InvalidPrice)
        );
    }

    #[test]
    fn test_add_overflow() {
        let mut cart = cart_with(&[("A", dec!(1), i64::from(u32::MAX))]);
        assert_eq!(
            cart.add_item(id("A"), "A", dec!(1), 1, ""),
            Err(CartError::QuantityOverflow)
        );
        assert_eq!(cart.get(&id("A")).unwrap().quantity(), u32::MAX);
    }

    #[test]
    fn test_add_total_overflow_is_refused() {
        let mut cart = Cart::default();
        assert_eq!(
            cart.add_item(id("A"), "A", Decimal::MAX, 2, ""),
            Err(CartError::TotalOverflow)
        );
        assert!(cart.is_empty());
        assert_eq!(cart.revision(), 0);

        // A single line that fits, then a second line pushing the sum over.
        cart.add_item(id("A"), "A", Decimal::MAX, 1, "").unwrap();
        assert_eq!(
            cart.add_item(id("B"), "B", Decimal::MAX, 1, ""),
            Err(CartError::TotalOverflow)
        );
        assert_eq!(
            cart.add_item(id("A"), "A", Decimal::MAX, 1, ""),
            Err(CartError::TotalOverflow)
        );
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.get(&id("A")).unwrap().quantity(), 1);
        assert_eq!(cart.grand_total(), Decimal::MAX);
    }

    #[test]
    fn test_set_quantity_total_overflow_is_refused() {
        let mut cart = cart_with(&[("A", Decimal::MAX / dec!(4), 1), ("B", dec!(1), 1)]);
        let revision = cart.revision();

        assert_eq!(
            cart.set_quantity(&id("A"), 5),
            Err(CartError::TotalOverflow)
        );
        assert_eq!(cart.get(&id("A")).unwrap().quantity(), 1);
        assert_eq!(cart.revision(), revision);

        cart.set_quantity(&id("A"), 3).unwrap();
        assert_eq!(cart.get(&id("A")).unwrap().quantity(), 3);
        assert!(cart.snapshot().grand_total() > dec!(1));
    }

    #[test]
    fn test_set_quantity_exact() {
        let mut cart = cart_with(&[("A", dec!(5), 1)]);
        cart.set_quantity(&id("A"), 7).unwrap();
        assert_eq!(cart.get(&id("A")).unwrap().quantity(), 7);
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let mut cart = cart_with(&[("A", dec!(5), 2), ("B", dec!(5), 2)]);
        cart.set_quantity(&id("A"), 0).unwrap();
        assert!(cart.get(&id("A")).is_none());

        cart.set_quantity(&id("B"), -1).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_missing_product() {
        let mut cart = Cart::default();
        assert_eq!(
            cart.set_quantity(&id("A"), 3),
            Err(CartError::NotFound(id("A")))
        );
    }

    #[test]
    fn test_remove_item() {
        let mut cart = cart_with(&[("A", dec!(5), 2)]);
        assert!(cart.remove_item(&id("A")));
        assert!(!cart.remove_item(&id("A")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cart = cart_with(&[("A", dec!(5), 2), ("B", dec!(1), 1)]);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.grand_total(), Decimal::ZERO);
    }

    #[test]
    fn test_totals_follow_every_operation() {
        let mut cart = cart_with(&[("A", dec!(100), 2), ("B", dec!(12.50), 4)]);
        assert_eq!(cart.grand_total(), dec!(250));
        assert_eq!(cart.item_count(), 6);

        cart.set_quantity(&id("B"), 1).unwrap();
        assert_eq!(cart.grand_total(), dec!(212.50));
        assert_eq!(cart.item_count(), 3);

        cart.remove_item(&id("A"));
        assert_eq!(cart.grand_total(), dec!(12.50));
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_item_count_independent_of_line_count() {
        let one_line = cart_with(&[("A", dec!(1), 4)]);
        let four_lines = cart_with(&[
            ("A", dec!(1), 1),
            ("B", dec!(1), 1),
            ("C", dec!(1), 1),
            ("D", dec!(1), 1),
        ]);
        assert_eq!(one_line.item_count(), four_lines.item_count());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut cart = cart_with(&[("A", dec!(100), 2)]);
        let snapshot = cart.snapshot();
        cart.clear();

        assert_eq!(snapshot.lines().len(), 1);
        assert_eq!(snapshot.grand_total(), dec!(200));
        assert_eq!(snapshot.item_count(), 2);
        assert!(cart.revision() > snapshot.revision());
    }

    #[test]
    fn test_revision_bumps_on_mutation_only() {
        let mut cart = Cart::default();
        cart.add_item(id("A"), "A", dec!(1), 1, "").unwrap();
        let after_add = cart.revision();

        let _ = cart.set_quantity(&id("missing"), 2);
        assert!(!cart.remove_item(&id("missing")));
        assert_eq!(cart.revision(), after_add);

        cart.set_quantity(&id("A"), 2).unwrap();
        assert_eq!(cart.revision(), after_add + 1);
    }
}
