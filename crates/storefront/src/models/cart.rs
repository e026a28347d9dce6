//! Session cart.
//!
//! The cart only remembers product IDs and quantities. Prices are read from
//! the menu every time the cart is shown or checked out.

use serde::{Deserialize, Serialize};

use trattoria_core::{MAX_LINE_QUANTITY, ProductId};

/// One product in the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Products the customer intends to order, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// The resulting quantity is clamped to `1..=MAX_LINE_QUANTITY`.
    /// Returns the line's new quantity.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) -> u32 {
        let quantity = quantity.max(1);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            return line.quantity;
        }
        let quantity = quantity.min(MAX_LINE_QUANTITY);
        self.lines.push(CartLine {
            product_id,
            quantity,
        });
        quantity
    }

    /// Set a line's quantity. Zero removes the line; values above the
    /// per-line limit are clamped. Unknown products are ignored.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity.min(MAX_LINE_QUANTITY);
        }
    }

    /// Remove a product from the cart.
    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Keep only lines whose product satisfies `keep`.
    ///
    /// Returns `true` if any line was dropped.
    pub fn retain_products(&mut self, mut keep: impl FnMut(ProductId) -> bool) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| keep(l.product_id));
        self.lines.len() != before
    }

    /// The cart lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Product IDs in the cart.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: i32) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_merges_existing_line() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(pid(1), 2), 2);
        assert_eq!(cart.add(pid(2), 1), 1);
        assert_eq!(cart.add(pid(1), 3), 5);
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_add_caps_quantity() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(pid(1), 150), MAX_LINE_QUANTITY);
        assert_eq!(cart.add(pid(1), 5), MAX_LINE_QUANTITY);
        assert_eq!(cart.add(pid(2), 0), 1);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::default();
        cart.add(pid(1), 2);
        cart.add(pid(2), 2);
        cart.set_quantity(pid(1), 0);
        assert_eq!(cart.product_ids(), vec![pid(2)]);
        cart.set_quantity(pid(2), 500);
        assert_eq!(cart.item_count(), MAX_LINE_QUANTITY);
        cart.set_quantity(pid(9), 3);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_retain_products_reports_drops() {
        let mut cart = Cart::default();
        cart.add(pid(1), 1);
        cart.add(pid(2), 1);
        assert!(!cart.retain_products(|_| true));
        assert!(cart.retain_products(|id| id == pid(2)));
        assert_eq!(cart.product_ids(), vec![pid(2)]);
        cart.remove(pid(2));
        assert!(cart.is_empty());
    }
}
