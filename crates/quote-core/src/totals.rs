//! # Totals Engine
//!
//! Derives every monetary aggregate of a quotation in one pure pass.
//!
//! ## Formula Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each item:  amount = qty × rate                                    │
//! │                  cgst   = amount × cgst% / 100                          │
//! │                  sgst   = amount × sgst% / 100                          │
//! │                                                                         │
//! │  sub_total       = Σ amount                                             │
//! │  discount_amount = sub_total × discount% / 100                          │
//! │  taxable_amount  = sub_total − discount_amount                          │
//! │  grand_total     = round(taxable + Σcgst + Σsgst                        │
//! │                          + additional_charges − advance_paid)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Taxes are charged on the undiscounted line amounts, as printed on the
//! document. Nothing is clamped: a discount above 100% yields a negative
//! taxable amount and that is what the document shows.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::rounding::{percent_of, RoundingMode};
use crate::types::{LineItem, Totals};

// =============================================================================
// Settings
// =============================================================================

/// Document-level inputs to the totals engine.
///
/// Every numeric field defaults to 0 when absent from JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct TotalsSettings {
    /// Discount on the sub total, in percent.
    pub discount_percentage: f64,
    /// Flat charges added after tax (shipping, handling).
    pub additional_charges: f64,
    /// Amount already received, deducted from the payable total.
    pub advance_paid: f64,
    /// Rounding of the grand total.
    pub rounding: RoundingMode,
    /// Rounding of each line's CGST and SGST amounts.
    ///
    /// `None` keeps per-line values exact, which is the normal setting.
    pub line_tax_rounding: RoundingMode,
}

// =============================================================================
// Engine
// =============================================================================

/// Recomputes all totals from the items and document settings.
///
/// Deterministic and side-effect free: identical inputs give bit-identical
/// output. Non-finite inputs produce non-finite output; reject them at the
/// boundary with [`crate::validation::check_finite_inputs`] if needed.
pub fn recompute(items: &[LineItem], settings: &TotalsSettings) -> Totals {
    let mut sub_total = 0.0;
    let mut total_cgst = 0.0;
    let mut total_sgst = 0.0;

    for item in items {
        let amount = item.amount();
        sub_total += amount;
        total_cgst += settings
            .line_tax_rounding
            .apply(percent_of(amount, item.cgst_rate));
        total_sgst += settings
            .line_tax_rounding
            .apply(percent_of(amount, item.sgst_rate));
    }

    let discount_amount = percent_of(sub_total, settings.discount_percentage);
    let taxable_amount = sub_total - discount_amount;
    let unrounded = unrounded_total(
        taxable_amount,
        total_cgst,
        total_sgst,
        settings.additional_charges,
        settings.advance_paid,
    );

    Totals {
        sub_total,
        discount_amount,
        taxable_amount,
        total_cgst,
        total_sgst,
        grand_total: settings.rounding.apply(unrounded),
    }
}

/// Grand total before rounding.
#[inline]
fn unrounded_total(
    taxable_amount: f64,
    total_cgst: f64,
    total_sgst: f64,
    additional_charges: f64,
    advance_paid: f64,
) -> f64 {
    taxable_amount + total_cgst + total_sgst + additional_charges - advance_paid
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(id: u64, quantity: f64, rate: f64, cgst: f64, sgst: f64) -> LineItem {
        LineItem {
            quantity,
            rate,
            cgst_rate: cgst,
            sgst_rate: sgst,
            ..LineItem::new(id)
        }
    }

    #[test]
    fn test_single_item_example() {
        let totals = recompute(
            &[item(1, 10.0, 5000.0, 9.0, 9.0)],
            &TotalsSettings::default(),
        );

        assert_eq!(totals.sub_total, 50000.0);
        assert_eq!(totals.discount_amount, 0.0);
        assert_eq!(totals.taxable_amount, 50000.0);
        assert_eq!(totals.total_cgst, 4500.0);
        assert_eq!(totals.total_sgst, 4500.0);
        assert_eq!(totals.grand_total, 59000.0);
    }

    #[test]
    fn test_rounding_up_after_advance() {
        // 50000 + 4500 + 4500 - 9000.6 = 49999.4
        let settings = TotalsSettings {
            advance_paid: 9000.6,
            rounding: RoundingMode::Up,
            ..TotalsSettings::default()
        };
        let totals = recompute(&[item(1, 10.0, 5000.0, 9.0, 9.0)], &settings);
        assert_eq!(totals.grand_total, 50000.0);
    }

    #[test]
    fn test_rounding_down_after_advance() {
        let settings = TotalsSettings {
            advance_paid: 9000.6,
            rounding: RoundingMode::Down,
            ..TotalsSettings::default()
        };
        let totals = recompute(&[item(1, 10.0, 5000.0, 9.0, 9.0)], &settings);
        assert_eq!(totals.grand_total, 49999.0);
    }

    #[test]
    fn test_discount_and_charges() {
        let settings = TotalsSettings {
            discount_percentage: 10.0,
            additional_charges: 250.0,
            ..TotalsSettings::default()
        };
        let totals = recompute(
            &[item(1, 2.0, 1000.0, 9.0, 9.0), item(2, 1.0, 500.0, 2.5, 2.5)],
            &settings,
        );

        assert_eq!(totals.sub_total, 2500.0);
        assert_eq!(totals.discount_amount, 250.0);
        assert_eq!(totals.taxable_amount, 2250.0);
        assert_eq!(totals.total_cgst, 192.5);
        assert_eq!(totals.total_sgst, 192.5);
        assert_eq!(totals.grand_total, 2250.0 + 385.0 + 250.0);
    }

    #[test]
    fn test_empty_items() {
        let settings = TotalsSettings {
            additional_charges: 100.0,
            advance_paid: 40.0,
            ..TotalsSettings::default()
        };
        let totals = recompute(&[], &settings);
        assert_eq!(totals.sub_total, 0.0);
        assert_eq!(totals.grand_total, 60.0);
    }

    #[test]
    fn test_large_discount_is_not_clamped() {
        let settings = TotalsSettings {
            discount_percentage: 150.0,
            ..TotalsSettings::default()
        };
        let totals = recompute(&[item(1, 1.0, 1000.0, 0.0, 0.0)], &settings);
        assert_eq!(totals.taxable_amount, -500.0);
        assert_eq!(totals.grand_total, -500.0);
    }

    #[test]
    fn test_intermediates_are_never_rounded() {
        let settings = TotalsSettings {
            rounding: RoundingMode::Up,
            ..TotalsSettings::default()
        };
        let totals = recompute(&[item(1, 1.0, 10.5, 9.0, 9.0)], &settings);
        assert_eq!(totals.sub_total, 10.5);
        assert!((totals.total_cgst - 0.945).abs() < 1e-12);
        assert_eq!(totals.grand_total, 13.0);
    }

    #[test]
    fn test_line_tax_rounding_hook() {
        let settings = TotalsSettings {
            line_tax_rounding: RoundingMode::Down,
            ..TotalsSettings::default()
        };
        let totals = recompute(
            &[item(1, 1.0, 10.5, 9.0, 9.0), item(2, 1.0, 10.5, 9.0, 9.0)],
            &settings,
        );
        assert_eq!(totals.total_cgst, 0.0);
        assert_eq!(totals.total_sgst, 0.0);
        assert_eq!(totals.grand_total, 21.0);
    }

    #[test]
    fn test_non_finite_input_propagates() {
        let totals = recompute(
            &[item(1, f64::NAN, 10.0, 9.0, 9.0)],
            &TotalsSettings::default(),
        );
        assert!(totals.sub_total.is_nan());
        assert!(totals.grand_total.is_nan());

        let settings = TotalsSettings {
            advance_paid: f64::NEG_INFINITY,
            ..TotalsSettings::default()
        };
        let totals = recompute(&[item(1, 1.0, 10.0, 0.0, 0.0)], &settings);
        assert_eq!(totals.grand_total, f64::INFINITY);
    }

    #[test]
    fn test_settings_default_from_empty_json() {
        let settings: TotalsSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, TotalsSettings::default());
    }

    fn arb_item() -> impl Strategy<Value = LineItem> {
        (0.0..1_000.0f64, 0.0..100_000.0f64, 0.0..28.0f64, 0.0..28.0f64)
            .prop_map(|(q, r, c, s)| item(1, q, r, c, s))
    }

    fn arb_settings() -> impl Strategy<Value = TotalsSettings> {
        (0.0..100.0f64, 0.0..10_000.0f64, 0.0..100_000.0f64).prop_map(|(d, a, p)| {
            TotalsSettings {
                discount_percentage: d,
                additional_charges: a,
                advance_paid: p,
                ..TotalsSettings::default()
            }
        })
    }

    proptest! {
        #[test]
        fn prop_sub_total_is_sum_of_amounts(items in prop::collection::vec(arb_item(), 0..20)) {
            let totals = recompute(&items, &TotalsSettings::default());
            let expected: f64 = items.iter().map(|i| i.quantity * i.rate).sum();
            prop_assert_eq!(totals.sub_total, expected);
        }

        #[test]
        fn prop_rounding_direction(
            items in prop::collection::vec(arb_item(), 0..20),
            settings in arb_settings(),
        ) {
            let exact = recompute(&items, &settings).grand_total;
            let up = recompute(&items, &TotalsSettings { rounding: RoundingMode::Up, ..settings });
            let down = recompute(&items, &TotalsSettings { rounding: RoundingMode::Down, ..settings });

            prop_assert!(up.grand_total >= exact);
            prop_assert!(down.grand_total <= exact);
            prop_assert!(up.grand_total - exact < 1.0);
            prop_assert!(exact - down.grand_total < 1.0);
        }

        #[test]
        fn prop_recompute_is_idempotent(
            items in prop::collection::vec(arb_item(), 0..20),
            settings in arb_settings(),
        ) {
            let first = recompute(&items, &settings);
            let second = recompute(&items, &settings);
            prop_assert_eq!(first.grand_total.to_bits(), second.grand_total.to_bits());
            prop_assert_eq!(first, second);
        }
    }
}
