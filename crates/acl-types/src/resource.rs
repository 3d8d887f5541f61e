//! Resource type hierarchy
//!
//! Every declared access targets a [`ResourceType`]. The types form a static
//! tree rooted at [`ResourceType::Any`]: a write to a parent category can alias
//! any of its children and vice versa, so conflict detection consults the whole
//! ancestor chain and subtree of a type (see [`ResourceType::resource_dependencies`]).

use crate::error::{TypesError, TypesResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

macro_rules! resource_types {
    ($($variant:ident = $code:literal => $name:literal,)+) => {
        /// Category of storage touched by an access operation.
        ///
        /// Discriminants are the stable wire codes of each category.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(into = "&'static str", try_from = "String")]
        #[repr(u16)]
        pub enum ResourceType {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant = $code,
            )+
        }

        impl ResourceType {
            /// Every resource type, in code order
            pub const ALL: &'static [ResourceType] = &[$(ResourceType::$variant,)+];

            /// Canonical upper-snake name
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(ResourceType::$variant => $name,)+
                }
            }

            /// Look up a resource type by its wire code
            pub const fn from_code(code: u16) -> Option<Self> {
                match code {
                    $($code => Some(ResourceType::$variant),)+
                    _ => None,
                }
            }
        }

        impl FromStr for ResourceType {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(ResourceType::$variant),)+
                    other => Err(TypesError::UnknownResourceType(other.to_string())),
                }
            }
        }
    };
}

resource_types! {
    Any = 0 => "ANY",
    Kv = 1 => "KV",
    Mem = 2 => "MEM",
    DexMem = 3 => "DEX_MEM",
    KvBank = 4 => "KV_BANK",
    KvStaking = 5 => "KV_STAKING",
    KvWasm = 6 => "KV_WASM",
    KvOracle = 7 => "KV_ORACLE",
    KvDex = 8 => "KV_DEX",
    KvEpoch = 9 => "KV_EPOCH",
    KvTokenfactory = 10 => "KV_TOKENFACTORY",
    KvOracleVoteTargets = 11 => "KV_ORACLE_VOTE_TARGETS",
    KvOracleAggregateVotes = 12 => "KV_ORACLE_AGGREGATE_VOTES",
    KvOracleFeeders = 13 => "KV_ORACLE_FEEDERS",
    KvStakingDelegation = 14 => "KV_STAKING_DELEGATION",
    KvStakingValidator = 15 => "KV_STAKING_VALIDATOR",
    KvAuth = 16 => "KV_AUTH",
    KvAuthAddressStore = 17 => "KV_AUTH_ADDRESS_STORE",
    KvBankSupply = 18 => "KV_BANK_SUPPLY",
    KvBankDenom = 19 => "KV_BANK_DENOM",
    KvBankBalances = 20 => "KV_BANK_BALANCES",
    KvTokenfactoryDenom = 21 => "KV_TOKENFACTORY_DENOM",
    KvTokenfactoryMetadata = 22 => "KV_TOKENFACTORY_METADATA",
    KvTokenfactoryAdmin = 23 => "KV_TOKENFACTORY_ADMIN",
    KvTokenfactoryCreator = 24 => "KV_TOKENFACTORY_CREATOR",
    KvOracleExchangeRate = 25 => "KV_ORACLE_EXCHANGE_RATE",
    KvOracleVotePenaltyCounter = 26 => "KV_ORACLE_VOTE_PENALTY_COUNTER",
    KvOraclePriceSnapshot = 27 => "KV_ORACLE_PRICE_SNAPSHOT",
    KvStakingValidationPower = 28 => "KV_STAKING_VALIDATION_POWER",
    KvStakingTotalPower = 29 => "KV_STAKING_TOTAL_POWER",
    KvStakingValidatorsConAddr = 30 => "KV_STAKING_VALIDATORS_CON_ADDR",
    KvStakingUnbondingDelegation = 31 => "KV_STAKING_UNBONDING_DELEGATION",
    KvStakingUnbondingDelegationVal = 32 => "KV_STAKING_UNBONDING_DELEGATION_VAL",
    KvStakingRedelegation = 33 => "KV_STAKING_REDELEGATION",
    KvStakingRedelegationValSrc = 34 => "KV_STAKING_REDELEGATION_VAL_SRC",
    KvStakingRedelegationValDst = 35 => "KV_STAKING_REDELEGATION_VAL_DST",
    KvStakingRedelegationQueue = 36 => "KV_STAKING_REDELEGATION_QUEUE",
    KvStakingValidatorQueue = 37 => "KV_STAKING_VALIDATOR_QUEUE",
    KvStakingHistoricalInfo = 38 => "KV_STAKING_HISTORICAL_INFO",
    KvStakingUnbonding = 39 => "KV_STAKING_UNBONDING",
    KvDistribution = 40 => "KV_DISTRIBUTION",
    KvStakingValidatorsByPower = 41 => "KV_STAKING_VALIDATORS_BY_POWER",
    KvDistributionFeePool = 42 => "KV_DISTRIBUTION_FEE_POOL",
    KvDistributionProposerKey = 43 => "KV_DISTRIBUTION_PROPOSER_KEY",
    KvDistributionOutstandingRewards = 44 => "KV_DISTRIBUTION_OUTSTANDING_REWARDS",
    KvDistributionDelegatorWithdrawAddr = 45 => "KV_DISTRIBUTION_DELEGATOR_WITHDRAW_ADDR",
    KvDistributionDelegatorStartingInfo = 46 => "KV_DISTRIBUTION_DELEGATOR_STARTING_INFO",
    KvDistributionValHistoricalRewards = 47 => "KV_DISTRIBUTION_VAL_HISTORICAL_REWARDS",
    KvDistributionValCurrentRewards = 48 => "KV_DISTRIBUTION_VAL_CURRENT_REWARDS",
    KvDistributionValAccumCommission = 49 => "KV_DISTRIBUTION_VAL_ACCUM_COMMISSION",
    KvDistributionSlashEvent = 50 => "KV_DISTRIBUTION_SLASH_EVENT",
    KvDexContractLongbook = 51 => "KV_DEX_CONTRACT_LONGBOOK",
    KvDexContractShortbook = 52 => "KV_DEX_CONTRACT_SHORTBOOK",
    KvDexSettlement = 53 => "KV_DEX_SETTLEMENT",
    KvDexPairPrefix = 54 => "KV_DEX_PAIR_PREFIX",
    KvDexTwap = 55 => "KV_DEX_TWAP",
    KvDexPrice = 56 => "KV_DEX_PRICE",
    KvDexSettlementEntry = 57 => "KV_DEX_SETTLEMENT_ENTRY",
    KvDexRegisteredPair = 58 => "KV_DEX_REGISTERED_PAIR",
    KvDexOrder = 60 => "KV_DEX_ORDER",
    KvDexCancel = 61 => "KV_DEX_CANCEL",
    KvDexAccountActiveOrders = 62 => "KV_DEX_ACCOUNT_ACTIVE_ORDERS",
    KvDexAssetList = 64 => "KV_DEX_ASSET_LIST",
    KvDexNextOrderId = 65 => "KV_DEX_NEXT_ORDER_ID",
    KvDexNextSettlementId = 66 => "KV_DEX_NEXT_SETTLEMENT_ID",
    KvDexMatchResult = 67 => "KV_DEX_MATCH_RESULT",
    KvDexSettlementOrderId = 68 => "KV_DEX_SETTLEMENT_ORDER_ID",
    KvDexOrderBook = 69 => "KV_DEX_ORDER_BOOK",
    KvAccesscontrol = 71 => "KV_ACCESSCONTROL",
    KvAccesscontrolWasmDependencyMapping = 72 => "KV_ACCESSCONTROL_WASM_DEPENDENCY_MAPPING",
    KvWasmCode = 73 => "KV_WASM_CODE",
    KvWasmContractAddress = 74 => "KV_WASM_CONTRACT_ADDRESS",
    KvWasmContractStore = 75 => "KV_WASM_CONTRACT_STORE",
    KvWasmSequenceKey = 76 => "KV_WASM_SEQUENCE_KEY",
    KvWasmContractCodeHistory = 77 => "KV_WASM_CONTRACT_CODE_HISTORY",
    KvWasmContractByCodeId = 78 => "KV_WASM_CONTRACT_BY_CODE_ID",
    KvWasmPinnedCodeIndex = 79 => "KV_WASM_PINNED_CODE_INDEX",
    KvAuthGlobalAccountNumber = 80 => "KV_AUTH_GLOBAL_ACCOUNT_NUMBER",
    KvAuthz = 81 => "KV_AUTHZ",
    KvFeegrant = 82 => "KV_FEEGRANT",
    KvFeegrantAllowance = 83 => "KV_FEEGRANT_ALLOWANCE",
    KvSlashing = 84 => "KV_SLASHING",
    KvSlashingValSigningInfo = 85 => "KV_SLASHING_VAL_SIGNING_INFO",
    KvSlashingAddrPubkeyRelationKey = 86 => "KV_SLASHING_ADDR_PUBKEY_RELATION_KEY",
    KvDexMemOrder = 87 => "KV_DEX_MEM_ORDER",
    KvDexMemCancel = 88 => "KV_DEX_MEM_CANCEL",
    KvDexMemDeposit = 89 => "KV_DEX_MEM_DEPOSIT",
    KvDexContract = 90 => "KV_DEX_CONTRACT",
    KvDexLongOrderCount = 91 => "KV_DEX_LONG_ORDER_COUNT",
    KvDexShortOrderCount = 92 => "KV_DEX_SHORT_ORDER_COUNT",
    KvBankDeferred = 93 => "KV_BANK_DEFERRED",
    KvBankDeferredModuleTxIndex = 95 => "KV_BANK_DEFERRED_MODULE_TX_INDEX",
    KvEvm = 96 => "KV_EVM",
    KvEvmBalance = 97 => "KV_EVM_BALANCE",
    KvEvmTransient = 98 => "KV_EVM_TRANSIENT",
    KvEvmAccountTransient = 99 => "KV_EVM_ACCOUNT_TRANSIENT",
    KvEvmModuleTransient = 100 => "KV_EVM_MODULE_TRANSIENT",
    KvEvmNonce = 101 => "KV_EVM_NONCE",
    KvEvmReceipt = 102 => "KV_EVM_RECEIPT",
    KvEvmS2e = 103 => "KV_EVM_S2E",
    KvEvmE2s = 104 => "KV_EVM_E2S",
    KvEvmCodeHash = 105 => "KV_EVM_CODE_HASH",
    KvEvmCode = 106 => "KV_EVM_CODE",
    KvEvmCodeSize = 107 => "KV_EVM_CODE_SIZE",
    KvBankWeiBalance = 108 => "KV_BANK_WEI_BALANCE",
    KvDexMemContractsToProcess = 109 => "KV_DEX_MEM_CONTRACTS_TO_PROCESS",
    KvDexMemDownstreamContracts = 110 => "KV_DEX_MEM_DOWNSTREAM_CONTRACTS",
}

impl ResourceType {
    /// Wire code of this resource type
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Declared parent. The root is its own parent.
    pub const fn declared_parent(self) -> ResourceType {
        use ResourceType::*;
        match self {
            Any | Kv | Mem => Any,
            DexMem => Mem,
            KvDexMemOrder
            | KvDexMemCancel
            | KvDexMemDeposit
            | KvDexMemContractsToProcess
            | KvDexMemDownstreamContracts => DexMem,
            KvBank | KvStaking | KvWasm | KvOracle | KvDex | KvEpoch | KvTokenfactory
            | KvAuth | KvAuthAddressStore | KvDistribution | KvAccesscontrol | KvAuthz
            | KvFeegrant | KvSlashing | KvBankDeferred | KvEvm => Kv,
            KvBankSupply | KvBankDenom | KvBankBalances | KvBankWeiBalance => KvBank,
            KvBankDeferredModuleTxIndex => KvBankDeferred,
            KvStakingDelegation
            | KvStakingValidator
            | KvStakingValidationPower
            | KvStakingTotalPower
            | KvStakingValidatorsConAddr
            | KvStakingUnbondingDelegation
            | KvStakingUnbondingDelegationVal
            | KvStakingRedelegation
            | KvStakingRedelegationValSrc
            | KvStakingRedelegationValDst
            | KvStakingRedelegationQueue
            | KvStakingValidatorQueue
            | KvStakingHistoricalInfo
            | KvStakingUnbonding
            | KvStakingValidatorsByPower => KvStaking,
            KvWasmCode
            | KvWasmContractAddress
            | KvWasmContractStore
            | KvWasmSequenceKey
            | KvWasmContractCodeHistory
            | KvWasmContractByCodeId
            | KvWasmPinnedCodeIndex => KvWasm,
            KvOracleVoteTargets
            | KvOracleAggregateVotes
            | KvOracleFeeders
            | KvOracleExchangeRate
            | KvOracleVotePenaltyCounter
            | KvOraclePriceSnapshot => KvOracle,
            KvDexContractLongbook
            | KvDexContractShortbook
            | KvDexSettlement
            | KvDexPairPrefix
            | KvDexTwap
            | KvDexPrice
            | KvDexSettlementEntry
            | KvDexRegisteredPair
            | KvDexOrder
            | KvDexCancel
            | KvDexAccountActiveOrders
            | KvDexAssetList
            | KvDexNextOrderId
            | KvDexNextSettlementId
            | KvDexMatchResult
            | KvDexSettlementOrderId
            | KvDexOrderBook
            | KvDexContract
            | KvDexLongOrderCount
            | KvDexShortOrderCount => KvDex,
            KvTokenfactoryDenom
            | KvTokenfactoryMetadata
            | KvTokenfactoryAdmin
            | KvTokenfactoryCreator => KvTokenfactory,
            KvAuthGlobalAccountNumber => KvAuth,
            KvDistributionFeePool
            | KvDistributionProposerKey
            | KvDistributionOutstandingRewards
            | KvDistributionDelegatorWithdrawAddr
            | KvDistributionDelegatorStartingInfo
            | KvDistributionValHistoricalRewards
            | KvDistributionValCurrentRewards
            | KvDistributionValAccumCommission
            | KvDistributionSlashEvent => KvDistribution,
            KvAccesscontrolWasmDependencyMapping => KvAccesscontrol,
            KvFeegrantAllowance => KvFeegrant,
            KvSlashingValSigningInfo | KvSlashingAddrPubkeyRelationKey => KvSlashing,
            KvEvmBalance
            | KvEvmTransient
            | KvEvmAccountTransient
            | KvEvmModuleTransient
            | KvEvmNonce
            | KvEvmReceipt
            | KvEvmS2e
            | KvEvmE2s
            | KvEvmCodeHash
            | KvEvmCode
            | KvEvmCodeSize => KvEvm,
        }
    }

    /// Declared children, in code order
    pub const fn declared_children(self) -> &'static [ResourceType] {
        use ResourceType::*;
        match self {
            Any => &[Kv, Mem],
            Mem => &[DexMem],
            DexMem => &[
                KvDexMemOrder,
                KvDexMemCancel,
                KvDexMemDeposit,
                KvDexMemContractsToProcess,
                KvDexMemDownstreamContracts,
            ],
            Kv => &[
                KvBank,
                KvStaking,
                KvWasm,
                KvOracle,
                KvDex,
                KvEpoch,
                KvTokenfactory,
                KvAuth,
                KvAuthAddressStore,
                KvDistribution,
                KvAccesscontrol,
                KvAuthz,
                KvFeegrant,
                KvSlashing,
                KvBankDeferred,
                KvEvm,
            ],
            KvBank => &[KvBankSupply, KvBankDenom, KvBankBalances, KvBankWeiBalance],
            KvBankDeferred => &[KvBankDeferredModuleTxIndex],
            KvStaking => &[
                KvStakingDelegation,
                KvStakingValidator,
                KvStakingValidationPower,
                KvStakingTotalPower,
                KvStakingValidatorsConAddr,
                KvStakingUnbondingDelegation,
                KvStakingUnbondingDelegationVal,
                KvStakingRedelegation,
                KvStakingRedelegationValSrc,
                KvStakingRedelegationValDst,
                KvStakingRedelegationQueue,
                KvStakingValidatorQueue,
                KvStakingHistoricalInfo,
                KvStakingUnbonding,
                KvStakingValidatorsByPower,
            ],
            KvWasm => &[
                KvWasmCode,
                KvWasmContractAddress,
                KvWasmContractStore,
                KvWasmSequenceKey,
                KvWasmContractCodeHistory,
                KvWasmContractByCodeId,
                KvWasmPinnedCodeIndex,
            ],
            KvOracle => &[
                KvOracleVoteTargets,
                KvOracleAggregateVotes,
                KvOracleFeeders,
                KvOracleExchangeRate,
                KvOracleVotePenaltyCounter,
                KvOraclePriceSnapshot,
            ],
            KvDex => &[
                KvDexContractLongbook,
                KvDexContractShortbook,
                KvDexSettlement,
                KvDexPairPrefix,
                KvDexTwap,
                KvDexPrice,
                KvDexSettlementEntry,
                KvDexRegisteredPair,
                KvDexOrder,
                KvDexCancel,
                KvDexAccountActiveOrders,
                KvDexAssetList,
                KvDexNextOrderId,
                KvDexNextSettlementId,
                KvDexMatchResult,
                KvDexSettlementOrderId,
                KvDexOrderBook,
                KvDexContract,
                KvDexLongOrderCount,
                KvDexShortOrderCount,
            ],
            KvTokenfactory => &[
                KvTokenfactoryDenom,
                KvTokenfactoryMetadata,
                KvTokenfactoryAdmin,
                KvTokenfactoryCreator,
            ],
            KvAuth => &[KvAuthGlobalAccountNumber],
            KvDistribution => &[
                KvDistributionFeePool,
                KvDistributionProposerKey,
                KvDistributionOutstandingRewards,
                KvDistributionDelegatorWithdrawAddr,
                KvDistributionDelegatorStartingInfo,
                KvDistributionValHistoricalRewards,
                KvDistributionValCurrentRewards,
                KvDistributionValAccumCommission,
                KvDistributionSlashEvent,
            ],
            KvAccesscontrol => &[KvAccesscontrolWasmDependencyMapping],
            KvFeegrant => &[KvFeegrantAllowance],
            KvSlashing => &[KvSlashingValSigningInfo, KvSlashingAddrPubkeyRelationKey],
            KvEvm => &[
                KvEvmBalance,
                KvEvmTransient,
                KvEvmAccountTransient,
                KvEvmModuleTransient,
                KvEvmNonce,
                KvEvmReceipt,
                KvEvmS2e,
                KvEvmE2s,
                KvEvmCodeHash,
                KvEvmCode,
                KvEvmCodeSize,
            ],
            _ => &[],
        }
    }

    /// Parent in the process-wide resource tree
    pub fn parent(self) -> ResourceType {
        ResourceTree::global().parent(self)
    }

    /// Children in the process-wide resource tree
    pub fn children(self) -> &'static [ResourceType] {
        ResourceTree::global().children(self)
    }

    /// Whether this type has any children
    pub fn has_children(self) -> bool {
        ResourceTree::global().has_children(self)
    }

    /// Ancestors from the direct parent up to the root
    pub fn parent_resources(self) -> Vec<ResourceType> {
        ResourceTree::global().parent_resources(self)
    }

    /// Every resource type whose accesses may conflict with an access to `self`
    pub fn resource_dependencies(self) -> Vec<ResourceType> {
        ResourceTree::global().resource_dependencies(self)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ResourceType> for &'static str {
    fn from(resource: ResourceType) -> Self {
        resource.as_str()
    }
}

impl TryFrom<String> for ResourceType {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Copy, Debug)]
struct TreeNode {
    registered: bool,
    parent: ResourceType,
    children: &'static [ResourceType],
}

const EMPTY_NODE: TreeNode = TreeNode {
    registered: false,
    parent: ResourceType::Any,
    children: &[],
};

/// Arena table of the resource hierarchy, indexed by resource code.
///
/// Built once and immutable afterwards.
#[derive(Debug)]
pub struct ResourceTree {
    nodes: Vec<TreeNode>,
}

static GLOBAL_TREE: OnceLock<ResourceTree> = OnceLock::new();

impl ResourceTree {
    /// Build the tree from the declared hierarchy
    pub fn build() -> TypesResult<Self> {
        Self::from_declarations(
            ResourceType::ALL,
            ResourceType::declared_parent,
            ResourceType::declared_children,
        )
    }

    /// Process-wide tree.
    ///
    /// The declared hierarchy is static data; a malformed table is a startup
    /// configuration error and aborts the process.
    pub fn global() -> &'static ResourceTree {
        GLOBAL_TREE.get_or_init(|| match Self::build() {
            Ok(tree) => tree,
            Err(e) => panic!("invalid resource type hierarchy: {e}"),
        })
    }

    /// Build and validate a tree from arbitrary parent/children declarations
    pub fn from_declarations(
        types: &[ResourceType],
        parent_of: impl Fn(ResourceType) -> ResourceType,
        children_of: impl Fn(ResourceType) -> &'static [ResourceType],
    ) -> TypesResult<Self> {
        let slots = types
            .iter()
            .map(|t| usize::from(t.code()))
            .max()
            .map_or(0, |max| max + 1);
        let mut nodes = vec![EMPTY_NODE; slots];

        for &resource in types {
            let node = &mut nodes[usize::from(resource.code())];
            if node.registered {
                return Err(TypesError::DuplicateResourceType(resource));
            }
            *node = TreeNode {
                registered: true,
                parent: parent_of(resource),
                children: children_of(resource),
            };
        }

        let tree = Self { nodes };
        tree.validate(types)?;
        Ok(tree)
    }

    fn validate(&self, types: &[ResourceType]) -> TypesResult<()> {
        if !self.contains(ResourceType::Any) {
            return Err(TypesError::UnregisteredResourceType(ResourceType::Any));
        }

        for &resource in types {
            let parent = self.node(resource).parent;

            if resource == ResourceType::Any {
                if parent != ResourceType::Any {
                    return Err(TypesError::RootHasParent(parent));
                }
            } else {
                if parent == resource {
                    return Err(TypesError::SelfParent(resource));
                }
                if !self.contains(parent) {
                    return Err(TypesError::UnregisteredResourceType(parent));
                }
                if !self.node(parent).children.contains(&resource) {
                    return Err(TypesError::ChildNotListed {
                        parent,
                        child: resource,
                    });
                }
            }

            for &child in self.node(resource).children {
                if !self.contains(child) {
                    return Err(TypesError::UnregisteredResourceType(child));
                }
                let declared = self.node(child).parent;
                if declared != resource || child == resource {
                    return Err(TypesError::ParentMismatch {
                        parent: resource,
                        child,
                        declared,
                    });
                }
            }

            // Walking up must reach the root within `types.len()` steps
            let mut current = resource;
            let mut steps = 0;
            while current != ResourceType::Any {
                current = self.node(current).parent;
                steps += 1;
                if steps > types.len() {
                    return Err(TypesError::ResourceTreeCycle(resource));
                }
            }
        }

        Ok(())
    }

    fn contains(&self, resource: ResourceType) -> bool {
        self.nodes
            .get(usize::from(resource.code()))
            .is_some_and(|node| node.registered)
    }

    fn node(&self, resource: ResourceType) -> &TreeNode {
        self.nodes
            .get(usize::from(resource.code()))
            .unwrap_or(&EMPTY_NODE)
    }

    /// Parent of `resource`; the root is its own parent
    pub fn parent(&self, resource: ResourceType) -> ResourceType {
        self.node(resource).parent
    }

    /// Direct children of `resource`
    pub fn children(&self, resource: ResourceType) -> &'static [ResourceType] {
        self.node(resource).children
    }

    /// Whether `resource` has children
    pub fn has_children(&self, resource: ResourceType) -> bool {
        !self.node(resource).children.is_empty()
    }

    /// Ancestor chain starting at the direct parent and ending at the root.
    ///
    /// Empty for the root itself.
    pub fn parent_resources(&self, resource: ResourceType) -> Vec<ResourceType> {
        let mut parents = Vec::new();
        let mut current = resource;
        while current != ResourceType::Any {
            current = self.parent(current);
            parents.push(current);
        }
        parents
    }

    /// `{resource} ∪ ancestors ∪ descendants`.
    ///
    /// Order: the type itself, ancestors nearest first, then descendants
    /// breadth-first.
    pub fn resource_dependencies(&self, resource: ResourceType) -> Vec<ResourceType> {
        let mut dependencies = vec![resource];
        dependencies.extend(self.parent_resources(resource));

        let mut queue: VecDeque<ResourceType> = self.children(resource).iter().copied().collect();
        while let Some(child) = queue.pop_front() {
            dependencies.push(child);
            queue.extend(self.children(child).iter().copied());
        }

        dependencies
    }

    /// Number of registered resource types
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.registered).count()
    }

    /// Check if no type is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
