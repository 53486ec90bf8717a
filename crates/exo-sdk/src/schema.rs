//! Versioned interface schemas of the Exocore precompiles
//!
//! Each functional domain lives at a fixed address and exposes one schema
//! version at a time. The registry is built once from a [`SchemaSelection`]
//! and never changes afterwards.

use std::fmt;
use std::str::FromStr;

use exo_primitives::Address;

use crate::abi::{FunctionDef, Token};
use crate::operation::OperationKind;
use crate::SdkError;

/// Default address of the asset (deposit/withdraw) precompile
pub const ASSET_PRECOMPILE: Address = Address::from_low_u16(0x0804);
/// Default address of the delegation precompile
pub const DELEGATION_PRECOMPILE: Address = Address::from_low_u16(0x0805);
/// Default address of the reward precompile
pub const REWARD_PRECOMPILE: Address = Address::from_low_u16(0x0806);

/// Functional domain of a precompile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Deposits, withdrawals, client chain and token registration
    Asset,
    /// Delegation to operators
    Delegation,
    /// Reward claiming and compounding
    Reward,
}

impl Domain {
    /// All domains
    pub const ALL: [Domain; 3] = [Domain::Asset, Domain::Delegation, Domain::Reward];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Asset => "asset",
            Domain::Delegation => "delegation",
            Domain::Reward => "reward",
        }
    }

    /// Address used when no override is configured
    pub fn default_destination(&self) -> Address {
        match self {
            Domain::Asset => ASSET_PRECOMPILE,
            Domain::Delegation => DELEGATION_PRECOMPILE,
            Domain::Reward => REWARD_PRECOMPILE,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SdkError::UnsupportedOperation(format!("unknown domain `{}`", s)))
    }
}

/// Whole-domain interface version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchemaVersion {
    /// First published interface
    #[default]
    V1,
    /// Revised interface (delegation only)
    V2,
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::V1 => f.write_str("v1"),
            SchemaVersion::V2 => f.write_str("v2"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(SchemaVersion::V1),
            "v2" | "2" => Ok(SchemaVersion::V2),
            other => Err(SdkError::UnsupportedOperation(format!(
                "unknown schema version `{}`",
                other
            ))),
        }
    }
}

type Declaration = (&'static str, &'static str);

const ASSET_V1: &[Declaration] = &[
    (
        "depositLST(uint32 clientChainID, bytes assetsAddress, bytes stakerAddress, uint256 opAmount)",
        "(bool success, uint256 latestAssetState)",
    ),
    (
        "depositNST(uint32 clientChainID, bytes validatorID, bytes stakerAddress, uint256 opAmount)",
        "(bool success, uint256 latestAssetState)",
    ),
    (
        "withdrawLST(uint32 clientChainID, bytes assetsAddress, bytes withdrawAddress, uint256 opAmount)",
        "(bool success, uint256 latestAssetState)",
    ),
    (
        "withdrawNST(uint32 clientChainID, bytes validatorID, bytes withdrawAddress, uint256 opAmount)",
        "(bool success, uint256 latestAssetState)",
    ),
    (
        "registerOrUpdateClientChain(uint32 clientChainID, uint8 addressLength, string name, string metaInfo, string signatureType)",
        "(bool success, bool updated)",
    ),
    (
        "registerToken(uint32 clientChainId, bytes token, uint8 decimals, string name, string metaData, string oracleInfo)",
        "(bool success)",
    ),
    (
        "updateToken(uint32 clientChainId, bytes token, string metaData)",
        "(bool success)",
    ),
    ("getClientChains()", "(bool success, uint32[] clientChainIDs)"),
    (
        "isRegisteredClientChain(uint32 clientChainID)",
        "(bool success, bool isRegistered)",
    ),
];

const DELEGATION_V1: &[Declaration] = &[
    (
        "delegate(uint32 clientChainID, uint64 lzNonce, bytes assetsAddress, bytes stakerAddress, bytes operatorAddr, uint256 opAmount)",
        "(bool success)",
    ),
    (
        "undelegate(uint32 clientChainID, uint64 lzNonce, bytes assetsAddress, bytes stakerAddress, bytes operatorAddr, uint256 opAmount)",
        "(bool success)",
    ),
    (
        "associateOperatorWithStaker(uint32 clientChainID, bytes staker, bytes operator)",
        "(bool success)",
    ),
    (
        "dissociateOperatorFromStaker(uint32 clientChainID, bytes staker)",
        "(bool success)",
    ),
];

const DELEGATION_V2: &[Declaration] = &[
    (
        "delegate(uint32 clientChainID, bytes assetsAddress, bytes stakerAddress, bytes operatorAddr, uint256 opAmount)",
        "(bool success)",
    ),
    (
        "undelegate(uint32 clientChainID, bytes assetsAddress, bytes stakerAddress, bytes operatorAddr, uint256 opAmount, bool instantUnbond)",
        "(bool success)",
    ),
    (
        "associateOperatorWithStaker(uint32 clientChainID, bytes staker, bytes operator)",
        "(bool success)",
    ),
    (
        "dissociateOperatorFromStaker(uint32 clientChainID, bytes staker)",
        "(bool success)",
    ),
];

const REWARD_V1: &[Declaration] = &[
    (
        "claimReward(uint32 clientChainID, bytes assetsAddress, bytes withdrawer, uint256 opAmount)",
        "(bool success, uint256 latestAssetState)",
    ),
    (
        "compoundReward(uint32 clientChainID, bytes stakerAddress, (string denom, uint256 amount)[] rewards, (bytes operator, uint256 numerator, uint256 denominator)[] allocations)",
        "(bool success)",
    ),
];

fn declarations(domain: Domain, version: SchemaVersion) -> Option<&'static [Declaration]> {
    match (domain, version) {
        (Domain::Asset, SchemaVersion::V1) => Some(ASSET_V1),
        (Domain::Delegation, SchemaVersion::V1) => Some(DELEGATION_V1),
        (Domain::Delegation, SchemaVersion::V2) => Some(DELEGATION_V2),
        (Domain::Reward, SchemaVersion::V1) => Some(REWARD_V1),
        _ => None,
    }
}

fn with_defaults(
    domain: Domain,
    version: SchemaVersion,
    function: FunctionDef,
) -> Result<FunctionDef, SdkError> {
    match (domain, version, function.name.as_str()) {
        (Domain::Delegation, SchemaVersion::V1, "delegate" | "undelegate") => {
            function.with_default("lzNonce", Token::uint(0))
        }
        (Domain::Delegation, SchemaVersion::V2, "undelegate") => {
            function.with_default("instantUnbond", Token::Bool(false))
        }
        _ => Ok(function),
    }
}

/// Version and destination chosen for one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainSelection {
    /// Interface version
    pub version: SchemaVersion,
    /// Precompile address
    pub destination: Address,
}

/// Startup choice of schema version and destination for every domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaSelection {
    /// Asset domain
    pub asset: DomainSelection,
    /// Delegation domain
    pub delegation: DomainSelection,
    /// Reward domain
    pub reward: DomainSelection,
}

impl Default for SchemaSelection {
    fn default() -> Self {
        Self {
            asset: DomainSelection {
                version: SchemaVersion::V1,
                destination: ASSET_PRECOMPILE,
            },
            delegation: DomainSelection {
                version: SchemaVersion::V2,
                destination: DELEGATION_PRECOMPILE,
            },
            reward: DomainSelection {
                version: SchemaVersion::V1,
                destination: REWARD_PRECOMPILE,
            },
        }
    }
}

impl SchemaSelection {
    /// Selection for one domain
    pub fn get(&self, domain: Domain) -> DomainSelection {
        match domain {
            Domain::Asset => self.asset,
            Domain::Delegation => self.delegation,
            Domain::Reward => self.reward,
        }
    }
}

/// The active schema of one domain
#[derive(Debug, Clone)]
pub struct DomainSchema {
    domain: Domain,
    version: SchemaVersion,
    destination: Address,
    functions: Vec<FunctionDef>,
}

impl DomainSchema {
    fn build(domain: Domain, selection: DomainSelection) -> Result<Self, SdkError> {
        let table = declarations(domain, selection.version).ok_or_else(|| {
            SdkError::UnsupportedOperation(format!(
                "no {} schema for the {} domain",
                selection.version, domain
            ))
        })?;
        let functions = table
            .iter()
            .map(|(decl, outputs)| {
                with_defaults(domain, selection.version, FunctionDef::parse(decl, outputs)?)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            domain,
            version: selection.version,
            destination: selection.destination,
            functions,
        })
    }

    /// Domain
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Active version
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Precompile address
    pub fn destination(&self) -> Address {
        self.destination
    }

    /// All functions
    pub fn functions(&self) -> &[FunctionDef] {
        &self.functions
    }

    /// Function by ABI name
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// Everything needed to encode and route one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Owning domain
    pub domain: Domain,
    /// Operation name (command name for transactions, ABI name for views)
    pub name: String,
    /// Precompile address
    pub destination: Address,
    /// Resolved schema entry
    pub function: FunctionDef,
}

/// Immutable set of active schemas, one per domain
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    asset: DomainSchema,
    delegation: DomainSchema,
    reward: DomainSchema,
}

impl SchemaRegistry {
    /// Build every domain schema from `selection`.
    ///
    /// Each domain must have its own destination.
    pub fn new(selection: &SchemaSelection) -> Result<Self, SdkError> {
        for (i, a) in Domain::ALL.iter().enumerate() {
            for b in &Domain::ALL[i + 1..] {
                let destination = selection.get(*a).destination;
                if destination == selection.get(*b).destination {
                    return Err(SdkError::UnsupportedOperation(format!(
                        "the {} and {} domains share destination {}",
                        a, b, destination
                    )));
                }
            }
        }
        Ok(Self {
            asset: DomainSchema::build(Domain::Asset, selection.asset)?,
            delegation: DomainSchema::build(Domain::Delegation, selection.delegation)?,
            reward: DomainSchema::build(Domain::Reward, selection.reward)?,
        })
    }

    /// Schema of one domain
    pub fn schema(&self, domain: Domain) -> &DomainSchema {
        match domain {
            Domain::Asset => &self.asset,
            Domain::Delegation => &self.delegation,
            Domain::Reward => &self.reward,
        }
    }

    /// Destination of one domain
    pub fn destination(&self, domain: Domain) -> Address {
        self.schema(domain).destination
    }

    /// Look up an ABI function in a domain
    pub fn resolve_function(
        &self,
        domain: Domain,
        function: &str,
    ) -> Result<OperationDescriptor, SdkError> {
        let schema = self.schema(domain);
        let def = schema.function(function).ok_or_else(|| {
            SdkError::UnsupportedOperation(format!(
                "{} is not part of the {} {} schema",
                function, domain, schema.version
            ))
        })?;
        Ok(OperationDescriptor {
            domain,
            name: function.to_string(),
            destination: schema.destination,
            function: def.clone(),
        })
    }

    /// Descriptor for a transaction-producing operation
    pub fn resolve_kind(&self, kind: OperationKind) -> Result<OperationDescriptor, SdkError> {
        let mut descriptor = self.resolve_function(kind.domain(), kind.function_name())?;
        descriptor.name = kind.name().to_string();
        Ok(descriptor)
    }

    /// String lookup, validated against the closed set of operations.
    ///
    /// `name` is an operation name (`deposit`, `self-delegate`, ...) and must
    /// belong to `domain`.
    pub fn resolve(&self, domain: &str, name: &str) -> Result<OperationDescriptor, SdkError> {
        let domain: Domain = domain.parse()?;
        let kind: OperationKind = name.parse()?;
        if kind.domain() != domain {
            return Err(SdkError::UnsupportedOperation(format!(
                "{} belongs to the {} domain, not {}",
                kind,
                kind.domain(),
                domain
            )));
        }
        self.resolve_kind(kind)
    }
}

impl Default for SchemaRegistry {
    /// Registry for the default selection.
    ///
    /// The built-in tables are fixed and covered by tests, so this cannot fail
    /// in practice; a failure degrades to empty schemas rather than panicking.
    fn default() -> Self {
        let selection = SchemaSelection::default();
        SchemaRegistry::new(&selection).unwrap_or_else(|_| {
            let empty = |domain: Domain| DomainSchema {
                domain,
                version: selection.get(domain).version,
                destination: selection.get(domain).destination,
                functions: Vec::new(),
            };
            SchemaRegistry {
                asset: empty(Domain::Asset),
                delegation: empty(Domain::Delegation),
                reward: empty(Domain::Reward),
            }
        })
    }
}
