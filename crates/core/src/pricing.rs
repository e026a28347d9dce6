//! Order pricing.
//!
//! Totals are always computed from current product prices; the storefront
//! never trusts amounts posted by the browser.
//!
//! ```
//! use trattoria_core::{Money, OrderType, PricedLine, PricingRules};
//!
//! let lines = [PricedLine::new(Money::from_cents(1000), 2)];
//! let totals = PricingRules::default().quote(&lines, OrderType::Delivery).unwrap();
//!
//! assert_eq!(totals.subtotal, Money::from_cents(2000));
//! assert_eq!(totals.tax, Money::from_cents(165));
//! assert_eq!(totals.delivery_fee, Money::from_cents(399));
//! assert_eq!(totals.total, Money::from_cents(2564));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, OrderType};

/// Largest quantity allowed on a single order line.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors that prevent an order from being priced.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("quantity must be at most {max}")]
    QuantityTooLarge { max: u32 },
    #[error("unit price cannot be negative")]
    NegativePrice,
}

/// Tax and fee rates applied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Fraction of the subtotal charged as sales tax.
    pub tax_rate: Decimal,
    /// Flat fee added to delivery orders.
    pub delivery_fee: Money,
    /// Fraction of the subtotal added to dine-in orders.
    pub dine_in_service_rate: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(825, 4),
            delivery_fee: Money::from_cents(399),
            dine_in_service_rate: Decimal::new(10, 2),
        }
    }
}

/// One cart line with the price read from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: Money,
    pub quantity: u32,
}

impl PricedLine {
    #[must_use]
    pub const fn new(unit_price: Money, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// `unit_price × quantity`, rounded to cents.
    #[must_use]
    pub fn line_total(&self) -> Money {
        Money::from_decimal(self.unit_price.amount() * Decimal::from(self.quantity))
    }

    fn validate(&self) -> Result<(), PricingError> {
        if self.quantity == 0 {
            return Err(PricingError::ZeroQuantity);
        }
        if self.quantity > MAX_LINE_QUANTITY {
            return Err(PricingError::QuantityTooLarge {
                max: MAX_LINE_QUANTITY,
            });
        }
        if self.unit_price.is_negative() {
            return Err(PricingError::NegativePrice);
        }
        Ok(())
    }
}

/// Computed financials for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub delivery_fee: Money,
    pub service_fee: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Delivery fee plus service fee.
    #[must_use]
    pub fn fees(&self) -> Money {
        self.delivery_fee + self.service_fee
    }
}

impl PricingRules {
    /// Price a set of lines for the given order type.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError`] if there are no lines or any line has an
    /// out-of-range quantity or a negative price.
    pub fn quote(
        &self,
        lines: &[PricedLine],
        order_type: OrderType,
    ) -> Result<OrderTotals, PricingError> {
        if lines.is_empty() {
            return Err(PricingError::EmptyCart);
        }
        for line in lines {
            line.validate()?;
        }

        let subtotal: Money = lines.iter().map(PricedLine::line_total).sum();
        let tax = Money::from_decimal(subtotal.amount() * self.tax_rate);

        let delivery_fee = match order_type {
            OrderType::Delivery => self.delivery_fee,
            OrderType::Pickup | OrderType::DineIn => Money::ZERO,
        };
        let service_fee = match order_type {
            OrderType::DineIn => {
                Money::from_decimal(subtotal.amount() * self.dine_in_service_rate)
            }
            OrderType::Delivery | OrderType::Pickup => Money::ZERO,
        };

        Ok(OrderTotals {
            subtotal,
            tax,
            delivery_fee,
            service_fee,
            total: subtotal + tax + delivery_fee + service_fee,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines() -> Vec<PricedLine> {
        vec![
            PricedLine::new(Money::from_cents(1250), 2),
            PricedLine::new(Money::from_cents(450), 1),
        ]
    }

    #[test]
    fn test_pickup_has_no_fees() {
        let totals = PricingRules::default()
            .quote(&lines(), OrderType::Pickup)
            .unwrap();
        assert_eq!(totals.subtotal, Money::from_cents(2950));
        // 29.50 * 0.0825 = 2.43375
        assert_eq!(totals.tax, Money::from_cents(243));
        assert_eq!(totals.fees(), Money::ZERO);
        assert_eq!(totals.total, Money::from_cents(3193));
    }

    #[test]
    fn test_delivery_adds_flat_fee() {
        let totals = PricingRules::default()
            .quote(&lines(), OrderType::Delivery)
            .unwrap();
        assert_eq!(totals.delivery_fee, Money::from_cents(399));
        assert_eq!(totals.service_fee, Money::ZERO);
        assert_eq!(totals.total, Money::from_cents(3592));
    }

    #[test]
    fn test_dine_in_adds_service_fee() {
        let totals = PricingRules::default()
            .quote(&lines(), OrderType::DineIn)
            .unwrap();
        assert_eq!(totals.delivery_fee, Money::ZERO);
        assert_eq!(totals.service_fee, Money::from_cents(295));
        assert_eq!(totals.total, Money::from_cents(3488));
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // 10.00 * 0.0825 = 0.825 -> 0.83
        let totals = PricingRules::default()
            .quote(&[PricedLine::new(Money::from_cents(1000), 1)], OrderType::Pickup)
            .unwrap();
        assert_eq!(totals.tax, Money::from_cents(83));
    }

    #[test]
    fn test_custom_rates() {
        let rules = PricingRules {
            tax_rate: Decimal::ZERO,
            delivery_fee: Money::from_cents(500),
            dine_in_service_rate: Decimal::new(15, 2),
        };
        let totals = rules
            .quote(&[PricedLine::new(Money::from_cents(2000), 1)], OrderType::DineIn)
            .unwrap();
        assert_eq!(totals.tax, Money::ZERO);
        assert_eq!(totals.service_fee, Money::from_cents(300));
        assert_eq!(totals.total, Money::from_cents(2300));
    }

    #[test]
    fn test_rejects_invalid_carts() {
        let rules = PricingRules::default();
        assert_eq!(
            rules.quote(&[], OrderType::Pickup),
            Err(PricingError::EmptyCart)
        );
        assert_eq!(
            rules.quote(&[PricedLine::new(Money::from_cents(100), 0)], OrderType::Pickup),
            Err(PricingError::ZeroQuantity)
        );
        assert_eq!(
            rules.quote(&[PricedLine::new(Money::from_cents(100), 100)], OrderType::Pickup),
            Err(PricingError::QuantityTooLarge { max: 99 })
        );
        assert_eq!(
            rules.quote(&[PricedLine::new(Money::from_cents(-1), 1)], OrderType::Pickup),
            Err(PricingError::NegativePrice)
        );
    }

    #[test]
    fn test_free_items_are_allowed() {
        let totals = PricingRules::default()
            .quote(&[PricedLine::new(Money::ZERO, 3)], OrderType::Pickup)
            .unwrap();
        assert_eq!(totals.total, Money::ZERO);
    }
}
