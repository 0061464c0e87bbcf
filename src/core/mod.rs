pub mod etl;
pub mod extractor;
pub mod resolver;
pub mod source;
pub mod table;

pub use crate::domain::model::{Item, RenderedReport, ResultTable};
pub use crate::domain::ports::{Pipeline, SearchService, Storage};
pub use crate::utils::error::Result;

use std::time::Duration;

/// Rate-limit pause between search calls. A zero delay does not yield.
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Rounds the exact binary value to `places` decimals, ties to even.
pub(crate) fn round_to(value: f64, places: usize) -> f64 {
    format!("{:.*}", places, value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_uses_exact_value() {
        // 1.125 is exact in binary, so the tie goes to even.
        assert_eq!(round_to(1.125, 2), 1.12);
        // 1.045 is stored just below the tie.
        assert_eq!(round_to((1.04 + 1.05) / 2.0, 2), 1.04);
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(-33.333, 1), -33.3);
        assert_eq!(round_to(25.0, 1), 25.0);
    }
}
