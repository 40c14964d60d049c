//! # Order Pricing
//!
//! Computes order totals from the prices frozen into cart lines.
//!
//! ```text
//! subtotal     = Σ line.unit_price × line.quantity
//! total_amount = subtotal + fees        (fees = 0 in this version)
//! ```
//!
//! The two figures are kept separate so a delivery fee or tax can be
//! inserted here without changing the order schema.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::CartLine;

/// Monetary totals of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub total_amount: Money,
}

impl OrderTotals {
    /// Computes totals for a set of cart lines.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyCart`] if `lines` is empty
    /// - [`CoreError::TotalOverflow`] if a line total or the sum overflows
    pub fn from_lines(lines: &[CartLine]) -> CoreResult<Self> {
        if lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let line_totals = lines
            .iter()
            .map(CartLine::line_total)
            .collect::<CoreResult<Vec<Money>>>()?;
        let subtotal = Money::checked_sum(line_totals).ok_or(CoreError::TotalOverflow)?;

        Ok(OrderTotals {
            subtotal,
            total_amount: subtotal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn line(menu_item_id: &str, quantity: i64, unit_price_paise: i64) -> CartLine {
        CartLine {
            id: format!("line-{}", menu_item_id),
            cart_id: "cart-1".to_string(),
            menu_item_id: menu_item_id.to_string(),
            quantity,
            unit_price_paise,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_sum_price_times_quantity() {
        let lines = vec![line("A", 2, 100), line("B", 1, 50)];

        let totals = OrderTotals::from_lines(&lines).unwrap();

        assert_eq!(totals.subtotal.paise(), 250);
        assert_eq!(totals.total_amount.paise(), 250);
    }

    #[test]
    fn test_total_equals_subtotal_without_fees() {
        let lines = vec![line("A", 10, 12_050), line("B", 3, 9_999), line("C", 1, 0)];

        let totals = OrderTotals::from_lines(&lines).unwrap();

        assert_eq!(totals.subtotal, totals.total_amount);
        assert_eq!(totals.subtotal.paise(), 10 * 12_050 + 3 * 9_999);
    }

    #[test]
    fn test_line_total_overflow_is_an_error() {
        let lines = vec![line("A", 2, i64::MAX / 2 + 1)];

        assert!(matches!(
            OrderTotals::from_lines(&lines),
            Err(CoreError::TotalOverflow)
        ));
    }

    #[test]
    fn test_sum_overflow_is_an_error() {
        let lines = vec![line("A", 1, i64::MAX), line("B", 1, 1)];

        assert!(matches!(
            OrderTotals::from_lines(&lines),
            Err(CoreError::TotalOverflow)
        ));
    }

    #[test]
    fn test_empty_lines_rejected() {
        assert!(matches!(
            OrderTotals::from_lines(&[]),
            Err(CoreError::EmptyCart)
        ));
    }
}
