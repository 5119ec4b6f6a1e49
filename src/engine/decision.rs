use crate::config::TierConfig;
use crate::engine::classifier::classify;
use crate::error::{AppError, Result};
use crate::types::{AlertRequest, Observation, ProductState, Tier};

/// Outcome of one `decide` call: at most one alert, plus the state to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub alert: Option<AlertRequest>,
    pub next_state: ProductState,
}

/// Decide whether a fresh observation fires an alert and compute the next
/// persisted state for the product.
///
/// The "ever seen" flags gate alerting:
/// - first in-stock S1 observation always alerts, regardless of S2 history —
///   S1 is new, strictly better territory;
/// - first in-stock S2 observation alerts only if the product has never been
///   seen in S1 *or* S2 — a product that already earned an S1 alert must not
///   re-alert by reappearing at a worse price.
///
/// Out-of-stock observations and in-stock observations at or above the S2
/// ceiling touch only the `last_checked_*` bookkeeping: going out of stock
/// does not erase tier history, and `was_in_s1` / `was_in_s2` never reset.
///
/// `now` is the observation timestamp in Unix seconds; passing it in keeps
/// the transition deterministic under test.
pub fn decide(
    state: &ProductState,
    product_id: &str,
    obs: &Observation,
    tiers: &TierConfig,
    now: i64,
) -> Result<Decision> {
    let mut next = state.clone();
    next.last_checked_at = Some(now);

    if !obs.in_stock {
        // Price may still be present on a sold-out page; record it if so,
        // otherwise keep the previous reading.
        if obs.price.is_some() {
            next.last_checked_price = obs.price;
        }
        return Ok(Decision { alert: None, next_state: next });
    }

    let price = obs
        .price
        .ok_or_else(|| AppError::MissingPrice(product_id.to_string()))?;
    next.last_checked_price = Some(price);

    let tier = classify(price, tiers)?;

    let fires = match tier {
        Tier::None => false,
        Tier::S1 => !state.was_in_s1,
        Tier::S2 => !state.was_in_s1 && !state.was_in_s2,
    };

    // last_tier tracks only S1/S2 in-stock observations; an in-stock price
    // above the S2 ceiling leaves it untouched.
    match tier {
        Tier::S1 => next.last_tier = Tier::S1,
        Tier::S2 => next.last_tier = Tier::S2,
        Tier::None => {}
    }

    let alert = if fires {
        match tier {
            Tier::S1 => next.was_in_s1 = true,
            Tier::S2 => next.was_in_s2 = true,
            Tier::None => unreachable!("Tier::None never fires"),
        }
        next.last_alerted_tier = tier;
        // subject() is Some for S1/S2 by construction.
        let subject = tier.subject().unwrap_or_default();
        Some(AlertRequest {
            product_id: product_id.to_string(),
            name: obs.name.clone(),
            price,
            tier,
            subject,
            checked_at: now,
        })
    } else {
        None
    };

    Ok(Decision { alert, next_state: next })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_756_100_000;

    fn tiers() -> TierConfig {
        TierConfig { s1_ceiling: 50.0, s2_ceiling: 60.0 }
    }

    fn in_stock(price: f64) -> Observation {
        Observation {
            in_stock: true,
            price: Some(price),
            name: "Scuba Hoodie".to_string(),
        }
    }

    fn out_of_stock() -> Observation {
        Observation { in_stock: false, price: None, name: "Scuba Hoodie".to_string() }
    }

    fn state(was_in_s1: bool, was_in_s2: bool) -> ProductState {
        ProductState { was_in_s1, was_in_s2, ..ProductState::default() }
    }

    fn run(state: &ProductState, obs: &Observation) -> Decision {
        decide(state, "https://shop.example/p/1", obs, &tiers(), NOW).unwrap()
    }

    // --- the six documented scenarios ---

    #[test]
    fn fresh_product_at_s1_price_fires_s1() {
        let d = run(&ProductState::default(), &in_stock(45.0));
        let alert = d.alert.expect("S1 alert expected");
        assert_eq!(alert.tier, Tier::S1);
        assert_eq!(alert.subject, "Best lululemon deal");
        assert_eq!(alert.price, 45.0);
        assert!(d.next_state.was_in_s1);
        assert!(!d.next_state.was_in_s2);
        assert_eq!(d.next_state.last_tier, Tier::S1);
        assert_eq!(d.next_state.last_alerted_tier, Tier::S1);
    }

    #[test]
    fn repeat_s1_observation_is_silent() {
        let d = run(&state(true, false), &in_stock(45.0));
        assert!(d.alert.is_none());
        assert!(d.next_state.was_in_s1);
        assert_eq!(d.next_state.last_tier, Tier::S1);
        assert_eq!(d.next_state.last_checked_price, Some(45.0));
        assert_eq!(d.next_state.last_checked_at, Some(NOW));
    }

    #[test]
    fn s2_is_gated_by_prior_s1() {
        // Dropping from S1 into S2 is already-known-better territory.
        let d = run(&state(true, false), &in_stock(55.0));
        assert!(d.alert.is_none());
        assert_eq!(d.next_state.last_tier, Tier::S2);
        assert!(!d.next_state.was_in_s2, "silent S2 must not set the flag");
    }

    #[test]
    fn fresh_product_at_s2_price_fires_s2() {
        let d = run(&ProductState::default(), &in_stock(55.0));
        let alert = d.alert.expect("S2 alert expected");
        assert_eq!(alert.tier, Tier::S2);
        assert_eq!(alert.subject, "Great lululemon deal");
        assert!(!d.next_state.was_in_s1);
        assert!(d.next_state.was_in_s2);
        assert_eq!(d.next_state.last_alerted_tier, Tier::S2);
    }

    #[test]
    fn drop_from_s2_into_s1_still_fires_s1() {
        let d = run(&state(false, true), &in_stock(45.0));
        let alert = d.alert.expect("S1 alert expected");
        assert_eq!(alert.tier, Tier::S1);
        assert!(d.next_state.was_in_s1);
        assert!(d.next_state.was_in_s2, "S2 history must survive");
    }

    #[test]
    fn out_of_stock_touches_only_bookkeeping() {
        let prior = ProductState {
            was_in_s1: true,
            was_in_s2: true,
            last_tier: Tier::S1,
            last_alerted_tier: Tier::S1,
            last_checked_price: Some(45.0),
            last_checked_at: Some(NOW - 900),
        };
        let d = run(&prior, &out_of_stock());
        assert!(d.alert.is_none());
        assert!(d.next_state.was_in_s1);
        assert!(d.next_state.was_in_s2);
        assert_eq!(d.next_state.last_tier, Tier::S1);
        // Sold-out page carried no price — previous reading is kept.
        assert_eq!(d.next_state.last_checked_price, Some(45.0));
        assert_eq!(d.next_state.last_checked_at, Some(NOW));
    }

    // --- remaining transition-table rows ---

    #[test]
    fn both_flags_set_is_always_silent() {
        for price in [45.0, 55.0] {
            let d = run(&state(true, true), &in_stock(price));
            assert!(d.alert.is_none(), "price {price} must be silent");
            assert!(d.next_state.was_in_s1);
            assert!(d.next_state.was_in_s2);
        }
    }

    #[test]
    fn in_stock_above_s2_ceiling_leaves_tier_fields_alone() {
        let prior = ProductState {
            last_tier: Tier::S2,
            ..state(false, true)
        };
        let d = run(&prior, &in_stock(98.0));
        assert!(d.alert.is_none());
        assert_eq!(d.next_state.last_tier, Tier::S2);
        assert!(!d.next_state.was_in_s1);
        assert!(d.next_state.was_in_s2);
        // Bookkeeping still updates.
        assert_eq!(d.next_state.last_checked_price, Some(98.0));
    }

    #[test]
    fn in_stock_without_price_is_a_contract_error() {
        let obs = Observation {
            in_stock: true,
            price: None,
            name: "Scuba Hoodie".to_string(),
        };
        let err = decide(&ProductState::default(), "p1", &obs, &tiers(), NOW)
            .unwrap_err();
        assert!(matches!(err, AppError::MissingPrice(_)));
    }

    // --- properties ---

    #[test]
    fn repeated_identical_observation_alerts_only_once() {
        let first = run(&ProductState::default(), &in_stock(45.0));
        assert!(first.alert.is_some());
        let second = run(&first.next_state, &in_stock(45.0));
        assert!(second.alert.is_none());
        let third = run(&second.next_state, &in_stock(45.0));
        assert!(third.alert.is_none());
    }

    #[test]
    fn seen_flags_are_monotone_across_any_sequence() {
        let observations = [
            in_stock(45.0),
            out_of_stock(),
            in_stock(72.0),
            in_stock(55.0),
            out_of_stock(),
            in_stock(45.0),
            in_stock(59.0),
        ];
        let mut state = ProductState::default();
        let mut seen_s1 = false;
        let mut seen_s2 = false;
        for obs in &observations {
            let d = run(&state, obs);
            if seen_s1 {
                assert!(d.next_state.was_in_s1, "was_in_s1 reset");
            }
            if seen_s2 {
                assert!(d.next_state.was_in_s2, "was_in_s2 reset");
            }
            seen_s1 = d.next_state.was_in_s1;
            seen_s2 = d.next_state.was_in_s2;
            state = d.next_state;
        }
        // 45.0 was seen in stock, so S1 must have latched.
        assert!(state.was_in_s1);
    }

    #[test]
    fn out_of_stock_then_reentry_does_not_realert() {
        let d1 = run(&ProductState::default(), &in_stock(45.0));
        assert!(d1.alert.is_some());
        let d2 = run(&d1.next_state, &out_of_stock());
        assert!(d2.alert.is_none());
        let d3 = run(&d2.next_state, &in_stock(45.0));
        assert!(d3.alert.is_none(), "tier re-entry after restock must be silent");
    }
}
