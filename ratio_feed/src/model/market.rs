//! Synthetic top-of-book for the ABC/DEF pair.
//!
//! Each stock keeps a mid-price that moves by a uniform step in `[-1%, +1%]`
//! per tick and never drops below `MIN_PRICE`. Around the mid a random spread
//! of 0.01%..0.5% is opened, and each side gets a random size. Both quotes of a
//! batch share one timestamp.

use chrono::{DateTime, Utc};
use rand::Rng;
use ratio_common::quote::{PriceLevel, Quote, QuoteBatch};
use ratio_common::stocks::Stock;

/// Floor for a simulated mid-price.
pub const MIN_PRICE: f64 = 0.01;
/// Mid-price both stocks start from.
pub const INITIAL_PRICE: f64 = 100.0;

/// Random-walk state for the monitored pair.
pub struct MarketWalk {
    mids: [f64; 2],
}

impl Default for MarketWalk {
    fn default() -> Self {
        Self::new(INITIAL_PRICE, INITIAL_PRICE)
    }
}

impl MarketWalk {
    /// Walk starting from the given ABC and DEF mids.
    pub fn new(abc_mid: f64, def_mid: f64) -> Self {
        Self {
            mids: [abc_mid.max(MIN_PRICE), def_mid.max(MIN_PRICE)],
        }
    }

    /// Current mids, ABC first.
    pub fn mids(&self) -> [f64; 2] {
        self.mids
    }

    /// Next mid-price after a small random step around `current_price`.
    pub fn next_price<R: Rng>(rng: &mut R, current_price: f64) -> f64 {
        let change: f64 = rng.random_range(-0.01..0.01);
        (current_price * (1.0 + change)).max(MIN_PRICE)
    }

    /// Advances both mids and quotes them at `timestamp`.
    pub fn next_batch<R: Rng>(&mut self, rng: &mut R, timestamp: DateTime<Utc>) -> QuoteBatch {
        let [abc, def] = Stock::PAIR.map(|stock| {
            let slot = match stock {
                Stock::ABC => 0,
                Stock::DEF => 1,
            };
            self.mids[slot] = Self::next_price(rng, self.mids[slot]);
            Self::quote(rng, stock, self.mids[slot], timestamp)
        });
        QuoteBatch::new(abc, def)
    }

    fn quote<R: Rng>(rng: &mut R, stock: Stock, mid: f64, timestamp: DateTime<Utc>) -> Quote {
        let half_spread = mid * rng.random_range(0.0001..0.005) / 2.0;
        Quote {
            stock,
            top_ask: PriceLevel {
                price: mid + half_spread,
                size: rng.random_range(1..200),
            },
            top_bid: PriceLevel {
                price: mid - half_spread,
                size: rng.random_range(1..200),
            },
            timestamp,
        }
    }
}
