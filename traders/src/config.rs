/// Order-generation parameters for one `TraderAgent`.
///
/// Defaults: 10-100 share clips, 2% price volatility around the
/// estimated market price, and a mean 0.5s exponential delay between
/// orders. `TraderConfig::hft()` tightens the delay to 0.05s for a
/// high-frequency profile, leaving everything else the same.
#[derive(Debug, Clone, PartialEq)]
pub struct TraderConfig {
    pub min_order_size: i64,
    pub max_order_size: i64,
    pub price_volatility: f64,
    pub order_frequency_secs: f64,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            min_order_size: 10,
            max_order_size: 100,
            price_volatility: 0.02,
            order_frequency_secs: 0.5,
        }
    }
}

impl TraderConfig {
    pub fn hft() -> Self {
        Self {
            order_frequency_secs: 0.05,
            ..Self::default()
        }
    }
}
