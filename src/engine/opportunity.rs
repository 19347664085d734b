//! Round-trip profit evaluation and quote merging.
//!
//! Both functions are pure: the evaluator turns two leg quotes into a
//! go/no-go decision plus a tip amount, and the merger collapses the two
//! legs into one synthetic quote the swap-instruction service will accept
//! as a single atomic route.

use tracing::debug;

use crate::error::{BotError, Result};
use crate::library::jupiter::QuoteResponse;

/// Outcome of evaluating one leg pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opportunity {
    pub profitable: bool,
    /// Round-trip lamport delta: leg-B output minus leg-A input. Negative
    /// when the round trip loses money.
    pub delta: i64,
    /// Half of the delta, offered to the block producer. Zero whenever the
    /// delta is non-positive; never read in that case.
    pub tip: u64,
}

fn parse_amount(field: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|e| BotError::QuoteUnavailable(format!("non-numeric {}: {}", field, e)))
}

/// Compare the round trip against the minimum-profit threshold.
///
/// `delta == min_profit_lamports` is deliberately not profitable; only a
/// strict excess clears the bar.
pub fn evaluate(
    leg_a: &QuoteResponse,
    leg_b: &QuoteResponse,
    min_profit_lamports: u64,
) -> Result<Opportunity> {
    let input_amount = parse_amount("inAmount", &leg_a.in_amount)?;
    let final_amount = parse_amount("outAmount", &leg_b.out_amount)?;

    let delta = final_amount as i64 - input_amount as i64;
    let tip = (delta / 2).max(0) as u64;
    let profitable = delta > min_profit_lamports as i64;

    debug!(delta, tip, profitable, "round trip evaluated");

    Ok(Opportunity {
        profitable,
        delta,
        tip,
    })
}

/// Build the synthetic quote covering both legs.
///
/// The output amount and threshold are both forced to
/// `input_amount + tip`, which encodes a zero-slippage requirement on the
/// synthetic route: the transaction may not deliver less than the
/// tip-inclusive target. `priceImpactPct` is the literal "0" — an
/// approximation carried over rather than a recomputation from the legs;
/// nothing in this crate reads it back.
pub fn merge_quotes(
    leg_a: &QuoteResponse,
    leg_b: &QuoteResponse,
    input_amount: u64,
    tip: u64,
) -> QuoteResponse {
    let target = (input_amount + tip).to_string();

    let mut merged = leg_a.clone();
    merged.output_mint = leg_b.output_mint.clone();
    merged.out_amount = target.clone();
    merged.other_amount_threshold = target;
    merged.price_impact_pct = "0".to_string();
    merged
        .route_plan
        .extend(leg_b.route_plan.iter().cloned());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quote(
        input_mint: &str,
        output_mint: &str,
        in_amount: u64,
        out_amount: u64,
        hops: usize,
    ) -> QuoteResponse {
        QuoteResponse {
            input_mint: input_mint.to_string(),
            in_amount: in_amount.to_string(),
            output_mint: output_mint.to_string(),
            out_amount: out_amount.to_string(),
            other_amount_threshold: out_amount.to_string(),
            swap_mode: "ExactIn".to_string(),
            slippage_bps: 0,
            platform_fee: None,
            price_impact_pct: "0.013".to_string(),
            route_plan: (0..hops)
                .map(|i| crate::library::jupiter::RoutePlanStep {
                    swap_info: json!({ "ammKey": format!("amm-{}-{}", input_mint, i) }),
                    percent: 100,
                })
                .collect(),
            context_slot: 123_456,
            extra: Default::default(),
        }
    }

    const WSOL: &str = "So11111111111111111111111111111111111111112";
    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    #[test]
    fn profitable_round_trip_with_half_delta_tip() {
        let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 1);
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_004_000, 1);

        let opp = evaluate(&leg_a, &leg_b, 3_000).unwrap();
        assert!(opp.profitable);
        assert_eq!(opp.delta, 4_000);
        assert_eq!(opp.tip, 2_000);
        assert!(opp.tip as i64 <= opp.delta);
    }

    #[test]
    fn below_threshold_is_not_profitable() {
        let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 1);
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_002_500, 1);

        let opp = evaluate(&leg_a, &leg_b, 3_000).unwrap();
        assert!(!opp.profitable);
        assert_eq!(opp.delta, 2_500);
    }

    #[test]
    fn delta_equal_to_threshold_is_not_profitable() {
        let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 1);
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_003_000, 1);

        let opp = evaluate(&leg_a, &leg_b, 3_000).unwrap();
        assert_eq!(opp.delta, 3_000);
        assert!(!opp.profitable);
    }

    #[test]
    fn losing_round_trip_yields_zero_tip() {
        let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 1);
        let leg_b = quote(USDC, WSOL, 1_900_000, 9_990_000, 1);

        let opp = evaluate(&leg_a, &leg_b, 3_000).unwrap();
        assert!(!opp.profitable);
        assert_eq!(opp.delta, -10_000);
        assert_eq!(opp.tip, 0);
    }

    #[test]
    fn tip_rounds_down_on_odd_delta() {
        let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 1);
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_000_005, 1);

        let opp = evaluate(&leg_a, &leg_b, 0).unwrap();
        assert_eq!(opp.delta, 5);
        assert_eq!(opp.tip, 2);
    }

    #[test]
    fn malformed_amount_is_a_quote_error() {
        let mut leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 1);
        leg_a.in_amount = "ten million".to_string();
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_004_000, 1);

        assert!(matches!(
            evaluate(&leg_a, &leg_b, 3_000),
            Err(crate::error::BotError::QuoteUnavailable(_))
        ));
    }

    #[test]
    fn merge_forces_target_amount_and_threshold_equal() {
        let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 2);
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_004_000, 1);

        let merged = merge_quotes(&leg_a, &leg_b, 10_000_000, 2_000);
        assert_eq!(merged.out_amount, "10002000");
        assert_eq!(merged.out_amount, merged.other_amount_threshold);
        assert_eq!(merged.price_impact_pct, "0");
    }

    #[test]
    fn merge_concatenates_route_plans_leg_a_first() {
        let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 2);
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_004_000, 3);

        let merged = merge_quotes(&leg_a, &leg_b, 10_000_000, 2_000);
        assert_eq!(merged.route_plan.len(), 5);
        for (i, step) in merged.route_plan.iter().take(2).enumerate() {
            assert_eq!(
                step.swap_info["ammKey"],
                format!("amm-{}-{}", WSOL, i),
                "leg A hops must come first"
            );
        }
        for (i, step) in merged.route_plan.iter().skip(2).enumerate() {
            assert_eq!(step.swap_info["ammKey"], format!("amm-{}-{}", USDC, i));
        }
    }

    #[test]
    fn merge_is_a_round_trip_back_to_the_input_mint() {
        let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 1);
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_004_000, 1);

        let merged = merge_quotes(&leg_a, &leg_b, 10_000_000, 2_000);
        assert_eq!(merged.input_mint, WSOL);
        assert_eq!(merged.output_mint, WSOL);
        assert_eq!(merged.context_slot, leg_a.context_slot);
    }

    #[test]
    fn merge_carries_unmodeled_fields_from_leg_a() {
        let mut leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 1);
        leg_a
            .extra
            .insert("swapUsdValue".to_string(), json!("1.8923"));
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_004_000, 1);

        let merged = merge_quotes(&leg_a, &leg_b, 10_000_000, 2_000);
        assert_eq!(merged.extra["swapUsdValue"], "1.8923");
    }

    #[test]
    fn merge_is_deterministic() {
        let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000, 2);
        let leg_b = quote(USDC, WSOL, 1_900_000, 10_004_000, 1);

        let first = merge_quotes(&leg_a, &leg_b, 10_000_000, 2_000);
        let second = merge_quotes(&leg_a, &leg_b, 10_000_000, 2_000);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}
