//! Store-key prefix table
//!
//! Maps `store key → resource type → raw key prefix`. Runtime validation uses
//! it to tell whether an observed key falls inside a declared resource.

use crate::error::{TypesError, TypesResult};
use crate::resource::ResourceType;
use std::collections::HashMap;

/// Store key of the fallback entry for types that span every store
pub const PARENT_NODE_KEY: &str = "ParentNode";

/// Immutable prefix lookup table
#[derive(Clone, Debug)]
pub struct StoreKeyPrefixTable {
    stores: HashMap<String, HashMap<ResourceType, Vec<u8>>>,
}

impl Default for StoreKeyPrefixTable {
    fn default() -> Self {
        use ResourceType::*;

        let mut table = Self {
            stores: HashMap::new(),
        };
        table.insert_store(
            PARENT_NODE_KEY,
            [(Any, vec![]), (Kv, vec![]), (Mem, vec![])],
        );
        table.insert_store(
            "bank",
            [
                (KvBank, vec![]),
                (KvBankSupply, vec![0x00]),
                (KvBankDenom, vec![0x01]),
                (KvBankBalances, vec![0x02]),
                (KvBankWeiBalance, vec![0x04]),
            ],
        );
        table.insert_store(
            "acc",
            [
                (KvAuth, vec![]),
                (KvAuthAddressStore, vec![0x01]),
                (KvAuthGlobalAccountNumber, b"globalAccountNumber".to_vec()),
            ],
        );
        table.insert_store(
            "staking",
            [
                (KvStaking, vec![]),
                (KvStakingTotalPower, vec![0x12]),
                (KvStakingValidationPower, vec![0x11]),
                (KvStakingValidator, vec![0x21]),
                (KvStakingValidatorsConAddr, vec![0x22]),
                (KvStakingValidatorsByPower, vec![0x23]),
                (KvStakingDelegation, vec![0x31]),
                (KvStakingUnbondingDelegation, vec![0x32]),
                (KvStakingUnbondingDelegationVal, vec![0x33]),
                (KvStakingRedelegation, vec![0x34]),
                (KvStakingRedelegationValSrc, vec![0x35]),
                (KvStakingRedelegationValDst, vec![0x36]),
                (KvStakingUnbonding, vec![0x41]),
                (KvStakingRedelegationQueue, vec![0x42]),
                (KvStakingValidatorQueue, vec![0x43]),
                (KvStakingHistoricalInfo, vec![0x50]),
            ],
        );
        table.insert_store(
            "distribution",
            [
                (KvDistribution, vec![]),
                (KvDistributionFeePool, vec![0x00]),
                (KvDistributionProposerKey, vec![0x01]),
                (KvDistributionOutstandingRewards, vec![0x02]),
                (KvDistributionDelegatorWithdrawAddr, vec![0x03]),
                (KvDistributionDelegatorStartingInfo, vec![0x04]),
                (KvDistributionValHistoricalRewards, vec![0x05]),
                (KvDistributionValCurrentRewards, vec![0x06]),
                (KvDistributionValAccumCommission, vec![0x07]),
                (KvDistributionSlashEvent, vec![0x08]),
            ],
        );
        table.insert_store(
            "oracle",
            [
                (KvOracle, vec![]),
                (KvOracleExchangeRate, vec![0x01]),
                (KvOracleFeeders, vec![0x02]),
                (KvOracleVotePenaltyCounter, vec![0x03]),
                (KvOracleAggregateVotes, vec![0x04]),
                (KvOracleVoteTargets, vec![0x05]),
                (KvOraclePriceSnapshot, vec![0x06]),
            ],
        );
        table.insert_store("params", [(Kv, vec![])]);
        table
    }
}

impl StoreKeyPrefixTable {
    /// Table with only the parent entry
    pub fn empty() -> Self {
        let mut table = Self {
            stores: HashMap::new(),
        };
        table.insert_store(
            PARENT_NODE_KEY,
            [
                (ResourceType::Any, vec![]),
                (ResourceType::Kv, vec![]),
                (ResourceType::Mem, vec![]),
            ],
        );
        table
    }

    /// Default table extended with hex-encoded entries.
    ///
    /// Each entry is `(store_key, resource type name, hex prefix)`; later
    /// entries override earlier ones.
    pub fn from_hex_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> TypesResult<Self> {
        let mut table = Self::default();
        for (store_key, resource_name, hex_prefix) in entries {
            let resource_type: ResourceType = resource_name.parse()?;
            let prefix = hex::decode(hex_prefix).map_err(|e| TypesError::InvalidPrefix {
                resource_type: resource_name.to_string(),
                reason: e.to_string(),
            })?;
            table.insert_store(store_key, [(resource_type, prefix)]);
        }
        Ok(table)
    }

    fn insert_store(
        &mut self,
        store_key: &str,
        entries: impl IntoIterator<Item = (ResourceType, Vec<u8>)>,
    ) {
        self.stores
            .entry(store_key.to_string())
            .or_default()
            .extend(entries);
    }

    /// Prefix of `resource_type` in `store_key`, falling back to the parent entry
    pub fn prefix(&self, store_key: &str, resource_type: ResourceType) -> Option<&[u8]> {
        self.stores
            .get(store_key)
            .and_then(|entries| entries.get(&resource_type))
            .or_else(|| {
                self.stores
                    .get(PARENT_NODE_KEY)
                    .and_then(|entries| entries.get(&resource_type))
            })
            .map(Vec::as_slice)
    }

    /// Hex form of [`prefix`](Self::prefix), as it appears in identifiers
    pub fn hex_prefix(&self, store_key: &str, resource_type: ResourceType) -> Option<String> {
        self.prefix(store_key, resource_type).map(hex::encode)
    }

    /// Number of store keys with entries
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_lookup() {
        let table = StoreKeyPrefixTable::default();
        assert_eq!(
            table.prefix("bank", ResourceType::KvBankBalances),
            Some(&[0x02][..])
        );
        assert_eq!(table.hex_prefix("bank", ResourceType::KvBankBalances).unwrap(), "02");
        assert_eq!(
            table.prefix("staking", ResourceType::KvStakingDelegation),
            Some(&[0x31][..])
        );
    }

    #[test]
    fn test_parent_fallback() {
        let table = StoreKeyPrefixTable::default();
        assert_eq!(table.prefix("bank", ResourceType::Any), Some(&[][..]));
        assert_eq!(table.prefix("unknown-store", ResourceType::Kv), Some(&[][..]));
        assert_eq!(table.prefix("unknown-store", ResourceType::KvBankBalances), None);
        assert_eq!(table.prefix("bank", ResourceType::KvOracleFeeders), None);
    }

    #[test]
    fn test_from_hex_entries() {
        let table = StoreKeyPrefixTable::from_hex_entries([
            ("dex", "KV_DEX_ORDER", "0a0b"),
            ("bank", "KV_BANK_BALANCES", "ff"),
        ])
        .unwrap();
        assert_eq!(table.prefix("dex", ResourceType::KvDexOrder), Some(&[0x0a, 0x0b][..]));
        assert_eq!(table.prefix("bank", ResourceType::KvBankBalances), Some(&[0xff][..]));
        assert_eq!(table.prefix("bank", ResourceType::KvBankSupply), Some(&[0x00][..]));
    }

    #[test]
    fn test_from_hex_entries_rejects_bad_input() {
        let err =
            StoreKeyPrefixTable::from_hex_entries([("dex", "KV_DEX_ORDER", "zz")]).unwrap_err();
        assert!(matches!(err, TypesError::InvalidPrefix { .. }));

        let err = StoreKeyPrefixTable::from_hex_entries([("dex", "KV_NOPE", "0a")]).unwrap_err();
        assert!(matches!(err, TypesError::UnknownResourceType(_)));
    }

    #[test]
    fn test_empty_table_keeps_parent_entry() {
        let table = StoreKeyPrefixTable::empty();
        assert_eq!(table.store_count(), 1);
        assert_eq!(table.prefix("bank", ResourceType::Mem), Some(&[][..]));
    }
}
