//! Instruments tracked by the monitor.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The two stocks whose price ratio is monitored.
///
/// `ABC` always occupies the primary (index 0) slot of a batch and `DEF` the
/// secondary (index 1) slot.
#[allow(missing_docs)]
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, Hash, Eq, PartialEq,
)]
#[strum(ascii_case_insensitive)]
pub enum Stock {
    ABC,
    DEF,
}

impl Stock {
    /// Stocks in batch order: primary first, secondary second.
    pub const PAIR: [Stock; 2] = [Stock::ABC, Stock::DEF];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("abc".parse::<Stock>().unwrap(), Stock::ABC);
        assert_eq!("DEF".parse::<Stock>().unwrap(), Stock::DEF);
        assert!("XYZ".parse::<Stock>().is_err());
    }

    #[test]
    fn pair_order_is_primary_then_secondary() {
        assert_eq!(Stock::PAIR, [Stock::ABC, Stock::DEF]);
        assert_eq!(Stock::ABC.to_string(), "ABC");
    }
}
