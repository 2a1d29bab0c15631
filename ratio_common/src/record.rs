//! Row Generator: turns one quote batch into one analytics record.
//!
//! The generator is a pure function of the batch. Every call recomputes both
//! mid-prices, the ratio, the fixed bounds and the alert field from scratch.
//!
//! Division is not guarded. A zero secondary mid-price yields `±inf` (or `NaN`
//! for `0/0`) and that value is carried into the record unchanged. The alert
//! uses plain IEEE comparisons: an infinite ratio breaches one of the bounds and
//! is copied into `trigger_alert`; a `NaN` ratio compares false against both
//! bounds and never alerts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::quote::QuoteBatch;
use crate::schema::Column;

/// Upper alert threshold for the ratio.
pub const UPPER_BOUND: f64 = 1.10;
/// Lower alert threshold for the ratio.
///
/// Kept at 0.99: the band is +10% / -1% around parity, not symmetric.
pub const LOWER_BOUND: f64 = 0.99;

/// Derived record pushed into the sink, one per batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsRecord {
    /// Mid-price of the primary stock (ABC).
    pub price_abc: f64,
    /// Mid-price of the secondary stock (DEF).
    pub price_def: f64,
    /// `price_abc / price_def`.
    pub ratio: f64,
    /// Later of the two quote timestamps.
    pub timestamp: DateTime<Utc>,
    /// Always [`UPPER_BOUND`].
    pub upper_bound: f64,
    /// Always [`LOWER_BOUND`].
    pub lower_bound: f64,
    /// The ratio itself when it is outside the bounds, otherwise empty.
    pub trigger_alert: Option<f64>,
}

impl AnalyticsRecord {
    /// Derives the record for `batch`.
    ///
    /// Index 0 of the batch is read as ABC and index 1 as DEF.
    pub fn generate(batch: &QuoteBatch) -> Self {
        let primary = &batch.primary;
        let secondary = &batch.secondary;

        let price_abc = primary.mid_price();
        let price_def = secondary.mid_price();
        let ratio = price_abc / price_def;

        let upper_bound = UPPER_BOUND;
        let lower_bound = LOWER_BOUND;

        let timestamp = if primary.timestamp > secondary.timestamp {
            primary.timestamp
        } else {
            secondary.timestamp
        };

        let trigger_alert = if ratio > upper_bound || ratio < lower_bound {
            Some(ratio)
        } else {
            None
        };

        Self {
            price_abc,
            price_def,
            ratio,
            timestamp,
            upper_bound,
            lower_bound,
            trigger_alert,
        }
    }

    /// Whether the ratio breached a bound.
    pub fn is_alert(&self) -> bool {
        self.trigger_alert.is_some()
    }

    /// Numeric value of `column`; `None` for the timestamp and an empty alert.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::PriceAbc => Some(self.price_abc),
            Column::PriceDef => Some(self.price_def),
            Column::Ratio => Some(self.ratio),
            Column::UpperBound => Some(self.upper_bound),
            Column::LowerBound => Some(self.lower_bound),
            Column::TriggerAlert => self.trigger_alert,
            Column::Timestamp => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{PriceLevel, Quote};
    use crate::stocks::Stock;
    use chrono::TimeZone;

    fn quote(stock: Stock, ask: f64, bid: f64, ms: i64) -> Quote {
        Quote {
            stock,
            top_ask: PriceLevel { price: ask, size: 1 },
            top_bid: PriceLevel { price: bid, size: 1 },
            timestamp: Utc.timestamp_millis_opt(ms).unwrap(),
        }
    }

    fn batch(abc: (f64, f64), def: (f64, f64)) -> QuoteBatch {
        QuoteBatch::new(quote(Stock::ABC, abc.0, abc.1, 0), quote(Stock::DEF, def.0, def.1, 0))
    }

    #[test]
    fn ratio_above_upper_bound_raises_alert() {
        let record = AnalyticsRecord::generate(&batch((101.0, 99.0), (51.0, 49.0)));

        assert_eq!(record.price_abc, 100.0);
        assert_eq!(record.price_def, 50.0);
        assert_eq!(record.ratio, 2.0);
        assert_eq!(record.trigger_alert, Some(2.0));
        assert!(record.is_alert());
    }

    #[test]
    fn ratio_inside_bounds_has_no_alert() {
        let record = AnalyticsRecord::generate(&batch((50.2, 49.8), (50.1, 49.9)));

        assert_eq!(record.price_abc, 50.0);
        assert_eq!(record.price_def, 50.0);
        assert_eq!(record.ratio, 1.0);
        assert_eq!(record.trigger_alert, None);
    }

    #[test]
    fn ratio_below_lower_bound_raises_alert() {
        let record = AnalyticsRecord::generate(&batch((98.0, 98.0), (100.0, 100.0)));

        assert_eq!(record.ratio, 0.98);
        assert_eq!(record.trigger_alert, Some(0.98));
    }

    #[test]
    fn bounds_are_inclusive_of_no_alert() {
        let at_upper = AnalyticsRecord::generate(&batch((1.10, 1.10), (1.0, 1.0)));
        assert_eq!(at_upper.ratio, 1.10);
        assert_eq!(at_upper.trigger_alert, None);

        let at_lower = AnalyticsRecord::generate(&batch((0.99, 0.99), (1.0, 1.0)));
        assert_eq!(at_lower.ratio, 0.99);
        assert_eq!(at_lower.trigger_alert, None);
    }

    #[test]
    fn bounds_are_fixed_for_any_input() {
        for (abc, def) in [((1.0, 1.0), (1.0, 1.0)), ((500.0, 400.0), (3.0, 1.0)), ((0.0, 0.0), (7.0, 7.0))] {
            let record = AnalyticsRecord::generate(&batch(abc, def));
            assert_eq!(record.upper_bound, 1.10);
            assert_eq!(record.lower_bound, 0.99);
        }
    }

    #[test]
    fn mid_prices_match_half_sums_exactly() {
        let (a0, b0, a1, b1) = (123.457, 121.003, 77.77, 76.01);
        let record = AnalyticsRecord::generate(&batch((a0, b0), (a1, b1)));

        assert_eq!(record.price_abc, (a0 + b0) / 2.0);
        assert_eq!(record.price_def, (a1 + b1) / 2.0);
        assert_eq!(record.ratio, record.price_abc / record.price_def);
        match record.trigger_alert {
            Some(alert) => assert_eq!(alert, record.ratio),
            None => assert!(record.ratio <= 1.10 && record.ratio >= 0.99),
        }
    }

    #[test]
    fn timestamp_is_the_later_quote() {
        let later_secondary = QuoteBatch::new(
            quote(Stock::ABC, 1.0, 1.0, 1_000),
            quote(Stock::DEF, 1.0, 1.0, 2_000),
        );
        assert_eq!(
            AnalyticsRecord::generate(&later_secondary).timestamp,
            Utc.timestamp_millis_opt(2_000).unwrap()
        );

        let later_primary = QuoteBatch::new(
            quote(Stock::ABC, 1.0, 1.0, 5_000),
            quote(Stock::DEF, 1.0, 1.0, 2_000),
        );
        assert_eq!(
            AnalyticsRecord::generate(&later_primary).timestamp,
            Utc.timestamp_millis_opt(5_000).unwrap()
        );

        let tie = QuoteBatch::new(
            quote(Stock::ABC, 1.0, 1.0, 3_000),
            quote(Stock::DEF, 1.0, 1.0, 3_000),
        );
        assert_eq!(
            AnalyticsRecord::generate(&tie).timestamp,
            Utc.timestamp_millis_opt(3_000).unwrap()
        );
    }

    #[test]
    fn same_batch_gives_identical_records() {
        let b = batch((101.3, 99.9), (52.2, 48.4));
        assert_eq!(AnalyticsRecord::generate(&b), AnalyticsRecord::generate(&b));
    }

    #[test]
    fn zero_secondary_mid_gives_infinite_alert() {
        let record = AnalyticsRecord::generate(&batch((101.0, 99.0), (0.0, 0.0)));

        assert_eq!(record.price_def, 0.0);
        assert!(record.ratio.is_infinite() && record.ratio.is_sign_positive());
        assert_eq!(record.trigger_alert, Some(f64::INFINITY));
    }

    #[test]
    fn negative_over_zero_alerts_below_lower_bound() {
        let record = AnalyticsRecord::generate(&batch((-1.0, -1.0), (0.0, 0.0)));

        assert_eq!(record.ratio, f64::NEG_INFINITY);
        assert_eq!(record.trigger_alert, Some(f64::NEG_INFINITY));
    }

    #[test]
    fn zero_over_zero_is_nan_and_never_alerts() {
        let record = AnalyticsRecord::generate(&batch((0.0, 0.0), (0.0, 0.0)));

        assert!(record.ratio.is_nan());
        assert_eq!(record.trigger_alert, None);
    }

    #[test]
    fn empty_alert_is_distinct_from_zero() {
        let record = AnalyticsRecord::generate(&batch((1.0, 1.0), (1.0, 1.0)));
        assert_eq!(record.numeric(Column::TriggerAlert), None);
        assert_ne!(record.trigger_alert, Some(0.0));

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["trigger_alert"].is_null());
        assert_eq!(json["ratio"], 1.0);
    }

    #[test]
    fn numeric_view_skips_timestamp() {
        let record = AnalyticsRecord::generate(&batch((101.0, 99.0), (51.0, 49.0)));
        assert_eq!(record.numeric(Column::Timestamp), None);
        assert_eq!(record.numeric(Column::PriceDef), Some(50.0));
        assert_eq!(record.numeric(Column::UpperBound), Some(1.10));
        assert_eq!(record.numeric(Column::TriggerAlert), Some(2.0));
    }
}
