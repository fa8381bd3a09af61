use rand::Rng;
use rand_distr::{Distribution, Exp, Normal, Uniform};

/// Samples an inter-order delay from an exponential distribution with
/// the given mean, in seconds.
pub fn sample_delay_secs(mean_secs: f64, rng: &mut impl Rng) -> f64 {
    let exp = Exp::new(1.0 / mean_secs).expect("mean_secs must be positive");
    exp.sample(rng)
}

/// Samples a zero-mean Gaussian price variation with standard deviation
/// `sigma` (a fraction of price, e.g. 0.02 for 2%).
pub fn sample_price_variation(sigma: f64, rng: &mut impl Rng) -> f64 {
    let normal = Normal::new(0.0, sigma).expect("sigma must be non-negative");
    normal.sample(rng)
}

/// Uniformly samples an order quantity in `[min, max]` inclusive.
pub fn sample_quantity(min: i64, max: i64, rng: &mut impl Rng) -> i64 {
    if min >= max {
        return min;
    }
    let uniform = Uniform::new_inclusive(min, max);
    uniform.sample(rng)
}
