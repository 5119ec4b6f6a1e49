use crate::config::TierConfig;
use crate::error::{AppError, Result};
use crate::types::Tier;

/// Classify an in-stock price into its deal tier.
///
/// Pure over its documented input range: `S1` below the S1 ceiling, `S2` in
/// `[s1_ceiling, s2_ceiling)`, `None` at or above the S2 ceiling. Callers
/// must not invoke this for an out-of-stock or priceless observation.
pub fn classify(price: f64, tiers: &TierConfig) -> Result<Tier> {
    tiers.validate()?;
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::InvalidPrice(price));
    }

    Ok(if price < tiers.s1_ceiling {
        Tier::S1
    } else if price < tiers.s2_ceiling {
        Tier::S2
    } else {
        Tier::None
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> TierConfig {
        TierConfig { s1_ceiling: 50.0, s2_ceiling: 60.0 }
    }

    #[test]
    fn below_s1_ceiling_is_s1() {
        assert_eq!(classify(0.0, &tiers()).unwrap(), Tier::S1);
        assert_eq!(classify(45.0, &tiers()).unwrap(), Tier::S1);
        assert_eq!(classify(49.99, &tiers()).unwrap(), Tier::S1);
    }

    #[test]
    fn s1_ceiling_is_exclusive() {
        // Exactly at the ceiling falls into S2, not S1.
        assert_eq!(classify(50.0, &tiers()).unwrap(), Tier::S2);
    }

    #[test]
    fn between_ceilings_is_s2() {
        assert_eq!(classify(55.0, &tiers()).unwrap(), Tier::S2);
        assert_eq!(classify(59.99, &tiers()).unwrap(), Tier::S2);
    }

    #[test]
    fn at_or_above_s2_ceiling_is_none() {
        assert_eq!(classify(60.0, &tiers()).unwrap(), Tier::None);
        assert_eq!(classify(128.0, &tiers()).unwrap(), Tier::None);
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(matches!(
            classify(-1.0, &tiers()),
            Err(AppError::InvalidPrice(_))
        ));
    }

    #[test]
    fn non_finite_price_is_rejected() {
        assert!(classify(f64::NAN, &tiers()).is_err());
        assert!(classify(f64::INFINITY, &tiers()).is_err());
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let bad = TierConfig { s1_ceiling: 60.0, s2_ceiling: 50.0 };
        assert!(matches!(classify(45.0, &bad), Err(AppError::Config(_))));
    }
}
