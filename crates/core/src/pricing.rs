//! Order pricing rules.
//!
//! Every checkout computes the same four money fields from trusted,
//! server-side line items. Client-submitted totals are never consulted;
//! callers snapshot unit prices from the catalog and pass them here.

use rust_decimal::Decimal;

use crate::types::Money;

/// Tax rate applied to the order subtotal (10%).
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Orders with a subtotal strictly above this ship free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::new(Decimal::from_parts(50, 0, 0, false, 0));

/// Flat shipping fee charged below the free-shipping threshold.
pub const FLAT_SHIPPING_FEE: Money = Money::new(Decimal::from_parts(5, 0, 0, false, 0));

/// Minimum order total accepted for online payment. Orders below this are
/// directed to cash on delivery.
pub const ONLINE_PAYMENT_MINIMUM: Money = Money::new(Decimal::from_parts(50, 0, 0, false, 0));

/// A priced order line: unit price snapshot and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedItem {
    pub unit_price: Money,
    pub quantity: i32,
}

impl PricedItem {
    #[must_use]
    pub const fn new(unit_price: Money, quantity: i32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// The four money fields computed for every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping_cost: Money,
    pub total_amount: Money,
}

impl OrderTotals {
    /// Compute subtotal, tax, shipping, and total from priced line items.
    ///
    /// ```text
    /// subtotal      = Σ(unit_price × quantity)
    /// tax           = round2(subtotal × 0.10)
    /// shipping_cost = subtotal > 50 ? 0 : 5
    /// total_amount  = subtotal + tax + shipping_cost
    /// ```
    #[must_use]
    pub fn calculate(items: &[PricedItem]) -> Self {
        let subtotal: Money = items.iter().map(PricedItem::line_total).sum();
        let subtotal = subtotal.round2();
        let tax = (subtotal * TAX_RATE).round2();
        let shipping_cost = if subtotal > FREE_SHIPPING_THRESHOLD {
            Money::ZERO
        } else {
            FLAT_SHIPPING_FEE
        };
        let total_amount = subtotal + tax + shipping_cost;

        Self {
            subtotal,
            tax,
            shipping_cost,
            total_amount,
        }
    }

    /// Whether the total meets the minimum for online payment.
    #[must_use]
    pub fn meets_online_minimum(&self) -> bool {
        self.total_amount >= ONLINE_PAYMENT_MINIMUM
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::new(s.parse().unwrap())
    }

    fn item(price: &str, quantity: i32) -> PricedItem {
        PricedItem::new(money(price), quantity)
    }

    #[test]
    fn test_flat_shipping_below_threshold() {
        // Two lines: 10 x 2 + 5 x 1 = 25
        let totals = OrderTotals::calculate(&[item("10", 2), item("5", 1)]);

        assert_eq!(totals.subtotal, money("25"));
        assert_eq!(totals.tax, money("2.5"));
        assert_eq!(totals.shipping_cost, money("5"));
        assert_eq!(totals.total_amount, money("32.5"));
    }

    #[test]
    fn test_free_shipping_above_threshold() {
        let totals = OrderTotals::calculate(&[item("30", 2)]);

        assert_eq!(totals.subtotal, money("60"));
        assert_eq!(totals.tax, money("6"));
        assert_eq!(totals.shipping_cost, Money::ZERO);
        assert_eq!(totals.total_amount, money("66"));
    }

    #[test]
    fn test_threshold_subtotal_still_pays_shipping() {
        // Strictly-greater rule: exactly 50 is not free
        let totals = OrderTotals::calculate(&[item("50", 1)]);

        assert_eq!(totals.shipping_cost, money("5"));
        assert_eq!(totals.total_amount, money("60"));
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        // subtotal 10.25 -> raw tax 1.025 -> 1.03
        let totals = OrderTotals::calculate(&[item("10.25", 1)]);

        assert_eq!(totals.tax, money("1.03"));
        assert_eq!(totals.total_amount, money("16.28"));
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        let totals = OrderTotals::calculate(&[item("3.33", 3), item("7.99", 2), item("0.45", 5)]);

        assert_eq!(
            totals.total_amount,
            totals.subtotal + totals.tax + totals.shipping_cost
        );
    }

    #[test]
    fn test_online_minimum() {
        let below = OrderTotals::calculate(&[item("10", 2), item("5", 1)]);
        assert!(!below.meets_online_minimum());

        let above = OrderTotals::calculate(&[item("30", 2)]);
        assert!(above.meets_online_minimum());

        // Exactly the minimum qualifies
        let exact = OrderTotals {
            subtotal: money("40.91"),
            tax: money("4.09"),
            shipping_cost: money("5"),
            total_amount: money("50"),
        };
        assert!(exact.meets_online_minimum());
    }

    #[test]
    fn test_empty_order_is_just_shipping() {
        let totals = OrderTotals::calculate(&[]);

        assert_eq!(totals.subtotal, Money::ZERO);
        assert_eq!(totals.tax, Money::ZERO);
        assert_eq!(totals.shipping_cost, money("5"));
        assert_eq!(totals.total_amount, money("5"));
    }
}
