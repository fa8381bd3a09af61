use std::cmp::Ordering;

/// Total-order wrapper around `f64` so prices can key a `BTreeMap`.
///
/// `Order::new` rejects non-positive and non-finite prices, so every
/// `Price` constructed by this crate compares consistently with
/// `total_cmp`; there is no NaN to worry about at the call sites below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price(pub f64);

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Price {
    fn from(value: f64) -> Self {
        Price(value)
    }
}

impl From<Price> for f64 {
    fn from(value: Price) -> Self {
        value.0
    }
}
