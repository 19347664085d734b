//! Instruction-set assembly for one atomic round-trip transaction.
//!
//! Order is part of the contract: the compute-budget limit comes first so
//! it applies to the whole transaction, and the tip transfer comes last so
//! the tip is only ever paid alongside the swap in the same atomic unit.

use std::str::FromStr;

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction, instruction::Instruction, pubkey::Pubkey,
    system_instruction,
};

use crate::error::{BotError, Result};
use crate::library::jupiter::{JupiterClient, QuoteResponse, SwapInstructionsResponse};

/// Everything needed to compile one transaction: the ordered instruction
/// list plus the lookup tables it references.
#[derive(Debug, Clone)]
pub struct InstructionSet {
    pub instructions: Vec<Instruction>,
    pub lookup_table_addresses: Vec<Pubkey>,
}

/// Fetch executable instructions for the merged quote and assemble the
/// final ordered list. The HTTP call is the only side effect.
pub async fn assemble(
    jupiter: &JupiterClient,
    merged_quote: &QuoteResponse,
    payer: &Pubkey,
    tip_lamports: u64,
    tip_account: &Pubkey,
) -> Result<InstructionSet> {
    let response = jupiter.swap_instructions(merged_quote, payer).await?;
    build_instruction_set(&response, payer, tip_lamports, tip_account)
}

/// Pure assembly step, separated from the HTTP fetch so it can be tested
/// against canned service responses.
pub fn build_instruction_set(
    response: &SwapInstructionsResponse,
    payer: &Pubkey,
    tip_lamports: u64,
    tip_account: &Pubkey,
) -> Result<InstructionSet> {
    let mut instructions = Vec::with_capacity(response.setup_instructions.len() + 3);

    instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(
        response.compute_unit_limit,
    ));

    for raw in &response.setup_instructions {
        instructions.push(raw.decode()?);
    }

    instructions.push(response.swap_instruction.decode()?);

    instructions.push(system_instruction::transfer(
        payer,
        tip_account,
        tip_lamports,
    ));

    let lookup_table_addresses = response
        .address_lookup_table_addresses
        .iter()
        .map(|addr| {
            Pubkey::from_str(addr).map_err(|e| {
                BotError::InstructionService(format!("bad lookup table address {}: {}", addr, e))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(InstructionSet {
        instructions,
        lookup_table_addresses,
    })
}
