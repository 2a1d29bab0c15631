//! Top-of-book quote model and the positional quote batch.
//!
//! A `Quote` is what the feed publishes for one stock per tick: the best ask and
//! best bid with their sizes and a UTC timestamp. Quotes travel in a
//! `QuoteBatch`, encoded on the wire as a JSON array where index 0 is the
//! primary stock (ABC) and index 1 the secondary stock (DEF).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RatioError;
use crate::stocks::Stock;

/// One side of the top of book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Quoted price.
    pub price: f64,
    /// Quantity available at `price`.
    pub size: u32,
}

/// Market quote for a single stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Stock the quote belongs to. Informational only; batch position decides the role.
    pub stock: Stock,
    /// Best ask.
    pub top_ask: PriceLevel,
    /// Best bid.
    pub top_bid: PriceLevel,
    /// Time the quote was taken.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Best ask price.
    pub fn ask_price(&self) -> f64 {
        self.top_ask.price
    }

    /// Best bid price.
    pub fn bid_price(&self) -> f64 {
        self.top_bid.price
    }

    /// Average of the best ask and best bid.
    pub fn mid_price(&self) -> f64 {
        (self.ask_price() + self.bid_price()) / 2.0
    }
}

/// One synchronized delivery of quotes: primary at index 0, secondary at index 1.
///
/// Decoding checks that at least two entries are present; anything past the
/// second entry is ignored. Stock labels are never used to reorder the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Quote>", into = "Vec<Quote>")]
pub struct QuoteBatch {
    /// Quote at index 0 (ABC).
    pub primary: Quote,
    /// Quote at index 1 (DEF).
    pub secondary: Quote,
}

impl QuoteBatch {
    /// Build a batch from an already ordered pair.
    pub fn new(primary: Quote, secondary: Quote) -> Self {
        Self { primary, secondary }
    }

    /// Decode a batch from a JSON array of quotes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, RatioError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode the batch to a JSON array of two quotes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, RatioError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl TryFrom<Vec<Quote>> for QuoteBatch {
    type Error = RatioError;

    fn try_from(quotes: Vec<Quote>) -> Result<Self, Self::Error> {
        let len = quotes.len();
        let mut it = quotes.into_iter();
        match (it.next(), it.next()) {
            (Some(primary), Some(secondary)) => Ok(Self { primary, secondary }),
            _ => Err(RatioError::IncompleteBatch(len)),
        }
    }
}

impl From<QuoteBatch> for Vec<Quote> {
    fn from(batch: QuoteBatch) -> Self {
        vec![batch.primary, batch.secondary]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quote(stock: Stock, ask: f64, bid: f64, secs: i64) -> Quote {
        Quote {
            stock,
            top_ask: PriceLevel { price: ask, size: 10 },
            top_bid: PriceLevel { price: bid, size: 20 },
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn mid_price_is_average_of_top_of_book() {
        let q = quote(Stock::ABC, 101.0, 99.0, 0);
        assert_eq!(q.ask_price(), 101.0);
        assert_eq!(q.bid_price(), 99.0);
        assert_eq!(q.mid_price(), 100.0);
    }

    #[test]
    fn decodes_feed_shaped_json() {
        let json = r#"[
            {"stock":"ABC","top_ask":{"price":101.0,"size":5},"top_bid":{"price":99.0,"size":7},
             "timestamp":"2019-02-11T22:06:30.572453Z"},
            {"stock":"DEF","top_ask":{"price":51.0,"size":3},"top_bid":{"price":49.0,"size":1},
             "timestamp":"2019-02-11T22:06:31Z"}
        ]"#;
        let batch = QuoteBatch::from_json_slice(json.as_bytes()).unwrap();
        assert_eq!(batch.primary.stock, Stock::ABC);
        assert_eq!(batch.primary.top_bid.size, 7);
        assert_eq!(batch.secondary.ask_price(), 51.0);
    }

    #[test]
    fn position_decides_role_not_label() {
        let swapped = vec![quote(Stock::DEF, 51.0, 49.0, 0), quote(Stock::ABC, 101.0, 99.0, 0)];
        let batch = QuoteBatch::try_from(swapped).unwrap();
        assert_eq!(batch.primary.stock, Stock::DEF);
        assert_eq!(batch.secondary.stock, Stock::ABC);
    }

    #[test]
    fn undersized_batch_is_rejected() {
        let err = QuoteBatch::try_from(vec![quote(Stock::ABC, 1.0, 1.0, 0)]).unwrap_err();
        assert!(matches!(err, RatioError::IncompleteBatch(1)));

        let err = QuoteBatch::from_json_slice(b"[]").unwrap_err();
        assert!(err.to_string().contains("got 0"));
    }

    #[test]
    fn extra_entries_are_ignored() {
        let batch = QuoteBatch::try_from(vec![
            quote(Stock::ABC, 2.0, 2.0, 0),
            quote(Stock::DEF, 1.0, 1.0, 0),
            quote(Stock::ABC, 9.0, 9.0, 0),
        ])
        .unwrap();
        assert_eq!(batch.primary.mid_price(), 2.0);
        assert_eq!(batch.secondary.mid_price(), 1.0);
    }

    #[test]
    fn encodes_as_two_element_array() {
        let batch = QuoteBatch::new(quote(Stock::ABC, 1.0, 1.0, 0), quote(Stock::DEF, 2.0, 2.0, 0));
        let value: serde_json::Value = serde_json::from_slice(&batch.to_json_bytes().unwrap()).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["stock"], "ABC");
        assert_eq!(arr[1]["top_ask"]["price"], 2.0);
    }
}
