//! End-to-end tests of the pure pipeline: evaluate → merge → assemble →
//! channel filtering, using canned service responses.

use solana_roundtrip_bot::block_engine::tx::strip_compute_budget;
use solana_roundtrip_bot::engine::assembler::build_instruction_set;
use solana_roundtrip_bot::engine::opportunity::{evaluate, merge_quotes};
use solana_roundtrip_bot::library::jupiter::{
    QuoteResponse, RawAccountMeta, RawInstruction, RoutePlanStep, SwapInstructionsResponse,
};

use solana_sdk::{compute_budget, pubkey::Pubkey, system_program};

const WSOL: &str = "So11111111111111111111111111111111111111112";
const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

fn quote(input_mint: &str, output_mint: &str, in_amount: u64, out_amount: u64) -> QuoteResponse {
    QuoteResponse {
        input_mint: input_mint.to_string(),
        in_amount: in_amount.to_string(),
        output_mint: output_mint.to_string(),
        out_amount: out_amount.to_string(),
        other_amount_threshold: out_amount.to_string(),
        swap_mode: "ExactIn".to_string(),
        slippage_bps: 0,
        platform_fee: None,
        price_impact_pct: "0.01".to_string(),
        route_plan: vec![RoutePlanStep {
            swap_info: serde_json::json!({ "label": format!("{}-{}", input_mint, output_mint) }),
            percent: 100,
        }],
        context_slot: 321_000_000,
        extra: Default::default(),
    }
}

fn raw_instruction(program_id: Pubkey) -> RawInstruction {
    RawInstruction {
        program_id: program_id.to_string(),
        accounts: vec![RawAccountMeta {
            pubkey: Pubkey::new_unique().to_string(),
            is_signer: false,
            is_writable: true,
        }],
        data: base64::encode([1, 2, 3]),
    }
}

fn swap_instructions_response(setup_count: usize) -> SwapInstructionsResponse {
    SwapInstructionsResponse {
        compute_unit_limit: 600_000,
        setup_instructions: (0..setup_count)
            .map(|_| raw_instruction(Pubkey::new_unique()))
            .collect(),
        swap_instruction: raw_instruction(Pubkey::new_unique()),
        address_lookup_table_addresses: vec![Pubkey::new_unique().to_string()],
    }
}

#[test]
fn profitable_cycle_produces_a_complete_instruction_set() {
    let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000);
    let leg_b = quote(USDC, WSOL, 1_900_000, 10_004_000);

    let opp = evaluate(&leg_a, &leg_b, 3_000).unwrap();
    assert!(opp.profitable);
    assert_eq!(opp.delta, 4_000);
    assert_eq!(opp.tip, 2_000);

    let merged = merge_quotes(&leg_a, &leg_b, 10_000_000, opp.tip);
    assert_eq!(merged.out_amount, "10002000");
    assert_eq!(merged.other_amount_threshold, "10002000");
    assert_eq!(merged.route_plan.len(), 2);
    assert_eq!(merged.output_mint, WSOL);

    let payer = Pubkey::new_unique();
    let tip_account = Pubkey::new_unique();
    let resp = swap_instructions_response(2);
    let set = build_instruction_set(&resp, &payer, opp.tip, &tip_account).unwrap();

    // compute budget first, tip transfer last
    assert_eq!(set.instructions.first().unwrap().program_id, compute_budget::id());
    let tip_ix = set.instructions.last().unwrap();
    assert_eq!(tip_ix.program_id, system_program::id());
    assert_eq!(tip_ix.accounts[1].pubkey, tip_account);
    // budget + two setup + swap + tip
    assert_eq!(set.instructions.len(), 5);
}

#[test]
fn unprofitable_cycle_ends_before_any_assembly() {
    let leg_a = quote(WSOL, USDC, 10_000_000, 1_900_000);
    let leg_b = quote(USDC, WSOL, 1_900_000, 10_002_500);

    let opp = evaluate(&leg_a, &leg_b, 3_000).unwrap();
    assert_eq!(opp.delta, 2_500);
    assert!(!opp.profitable);
}

#[test]
fn broadcast_channel_never_forwards_a_compute_budget_instruction() {
    let payer = Pubkey::new_unique();
    let tip_account = Pubkey::new_unique();
    let resp = swap_instructions_response(1);
    let set = build_instruction_set(&resp, &payer, 2_000, &tip_account).unwrap();

    assert_eq!(set.instructions[0].program_id, compute_budget::id());

    let forwarded = strip_compute_budget(&set.instructions);
    assert_eq!(forwarded.len(), set.instructions.len() - 1);
    assert!(forwarded
        .iter()
        .all(|ix| ix.program_id != compute_budget::id()));
    // the tip transfer is still last
    assert_eq!(forwarded.last().unwrap().program_id, system_program::id());
}
