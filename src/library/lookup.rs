//! Address-lookup-table resolution.
//!
//! Tables are re-fetched every cycle; nothing is cached, so a table that
//! was extended or deactivated between cycles is always seen fresh.

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    address_lookup_table::{state::AddressLookupTable, AddressLookupTableAccount},
    pubkey::Pubkey,
};
use tracing::debug;

use crate::error::{BotError, Result};

/// Resolve every referenced table to its on-chain account data. Fetches
/// run concurrently, but the result order matches the input order.
pub async fn resolve_lookup_tables(
    rpc: &RpcClient,
    keys: &[Pubkey],
) -> Result<Vec<AddressLookupTableAccount>> {
    let tables =
        futures::future::try_join_all(keys.iter().map(|key| fetch_table(rpc, key))).await?;

    debug!(count = tables.len(), "lookup tables resolved");
    Ok(tables)
}

async fn fetch_table(rpc: &RpcClient, key: &Pubkey) -> Result<AddressLookupTableAccount> {
    // Transport failures propagate as Rpc errors; only an address that
    // resolves to no account (or to data that is not a lookup table)
    // counts as a missing table.
    let account = rpc
        .get_account_with_commitment(key, rpc.commitment())
        .await?
        .value
        .ok_or(BotError::LookupTableNotFound(*key))?;

    decode_table(key, &account.data)
}

fn decode_table(key: &Pubkey, data: &[u8]) -> Result<AddressLookupTableAccount> {
    let table =
        AddressLookupTable::deserialize(data).map_err(|_| BotError::LookupTableNotFound(*key))?;

    Ok(AddressLookupTableAccount {
        key: *key,
        addresses: table.addresses.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_account_data_reports_the_table_as_missing() {
        let key = Pubkey::new_unique();
        match decode_table(&key, &[0xFF; 16]) {
            Err(BotError::LookupTableNotFound(missing)) => assert_eq!(missing, key),
            other => panic!("expected LookupTableNotFound, got {:?}", other),
        }
    }

    #[test]
    fn empty_account_data_reports_the_table_as_missing() {
        let key = Pubkey::new_unique();
        assert!(matches!(
            decode_table(&key, &[]),
            Err(BotError::LookupTableNotFound(_))
        ));
    }
}
