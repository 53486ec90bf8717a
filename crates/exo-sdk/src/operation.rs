//! The closed set of operations this client can submit or query

use std::fmt;
use std::str::FromStr;

use exo_primitives::U256;

use crate::abi::{NamedArgs, Token};
use crate::codec::{decode_blob, encode_identifier, operator_bytes, parse_amount};
use crate::schema::Domain;
use crate::SdkError;

/// Operation without its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Liquid-staking token deposit
    DepositLst,
    /// Native-staking deposit
    DepositNst,
    /// Liquid-staking token withdrawal
    WithdrawLst,
    /// Native-staking withdrawal
    WithdrawNst,
    /// Register or update a client chain
    RegisterClientChain,
    /// Register a token
    RegisterToken,
    /// Update token metadata
    UpdateToken,
    /// Delegate to an operator
    Delegate,
    /// Undelegate from an operator
    Undelegate,
    /// Associate a staker with an operator
    AssociateOperator,
    /// Remove a staker's operator association
    DissociateOperator,
    /// Claim rewards
    ClaimReward,
    /// Compound rewards into delegations
    CompoundReward,
}

impl OperationKind {
    /// Every operation
    pub const ALL: [OperationKind; 13] = [
        OperationKind::DepositLst,
        OperationKind::DepositNst,
        OperationKind::WithdrawLst,
        OperationKind::WithdrawNst,
        OperationKind::RegisterClientChain,
        OperationKind::RegisterToken,
        OperationKind::UpdateToken,
        OperationKind::Delegate,
        OperationKind::Undelegate,
        OperationKind::AssociateOperator,
        OperationKind::DissociateOperator,
        OperationKind::ClaimReward,
        OperationKind::CompoundReward,
    ];

    /// Command-line name
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::DepositLst => "deposit",
            OperationKind::DepositNst => "deposit-nst",
            OperationKind::WithdrawLst => "withdraw",
            OperationKind::WithdrawNst => "withdraw-nst",
            OperationKind::RegisterClientChain => "register-client-chain",
            OperationKind::RegisterToken => "register-token",
            OperationKind::UpdateToken => "update-token",
            OperationKind::Delegate => "delegate",
            OperationKind::Undelegate => "undelegate",
            OperationKind::AssociateOperator => "self-delegate",
            OperationKind::DissociateOperator => "dissociate",
            OperationKind::ClaimReward => "claim-reward",
            OperationKind::CompoundReward => "compound-reward",
        }
    }

    /// Owning domain
    pub fn domain(&self) -> Domain {
        match self {
            OperationKind::DepositLst
            | OperationKind::DepositNst
            | OperationKind::WithdrawLst
            | OperationKind::WithdrawNst
            | OperationKind::RegisterClientChain
            | OperationKind::RegisterToken
            | OperationKind::UpdateToken => Domain::Asset,
            OperationKind::Delegate
            | OperationKind::Undelegate
            | OperationKind::AssociateOperator
            | OperationKind::DissociateOperator => Domain::Delegation,
            OperationKind::ClaimReward | OperationKind::CompoundReward => Domain::Reward,
        }
    }

    /// ABI function name
    pub fn function_name(&self) -> &'static str {
        match self {
            OperationKind::DepositLst => "depositLST",
            OperationKind::DepositNst => "depositNST",
            OperationKind::WithdrawLst => "withdrawLST",
            OperationKind::WithdrawNst => "withdrawNST",
            OperationKind::RegisterClientChain => "registerOrUpdateClientChain",
            OperationKind::RegisterToken => "registerToken",
            OperationKind::UpdateToken => "updateToken",
            OperationKind::Delegate => "delegate",
            OperationKind::Undelegate => "undelegate",
            OperationKind::AssociateOperator => "associateOperatorWithStaker",
            OperationKind::DissociateOperator => "dissociateOperatorFromStaker",
            OperationKind::ClaimReward => "claimReward",
            OperationKind::CompoundReward => "compoundReward",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperationKind {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OperationKind::ALL
            .into_iter()
            .find(|k| k.name() == s || k.function_name() == s)
            .ok_or_else(|| SdkError::UnsupportedOperation(format!("unknown operation `{}`", s)))
    }
}

/// One reward coin of a compound request, written `denom:amount`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardCoin {
    /// Coin denomination
    pub denom: String,
    /// Amount in base units
    pub amount: U256,
}

impl FromStr for RewardCoin {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (denom, amount) = s.split_once(':').ok_or_else(|| {
            SdkError::InputEncoding(format!("reward `{}` is not denom:amount", s))
        })?;
        let denom = denom.trim();
        if denom.is_empty() {
            return Err(SdkError::InputEncoding(format!("reward `{}` has no denom", s)));
        }
        Ok(Self {
            denom: denom.to_string(),
            amount: parse_amount(amount)?,
        })
    }
}

/// Share of compounded rewards for one operator, written `operator:num/den`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorShare {
    /// Bech32 operator address
    pub operator: String,
    /// Numerator of the share
    pub numerator: U256,
    /// Denominator of the share; never zero
    pub denominator: U256,
}

impl FromStr for OperatorShare {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SdkError::InputEncoding(format!("share `{}` is not operator:num/den", s));
        let (operator, ratio) = s.rsplit_once(':').ok_or_else(malformed)?;
        let (numerator, denominator) = ratio.split_once('/').ok_or_else(malformed)?;
        let denominator = parse_amount(denominator)?;
        if denominator.is_zero() {
            return Err(SdkError::InputEncoding(format!(
                "share `{}` has a zero denominator",
                s
            )));
        }
        let operator = operator.trim().to_string();
        operator_bytes(&operator)?;
        Ok(Self {
            operator,
            numerator: parse_amount(numerator)?,
            denominator,
        })
    }
}

/// A transaction-producing operation with its typed arguments.
///
/// Identifiers are kept as typed on the command line; they are canonicalized
/// when the call is built, so a bad one fails before any network traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `depositLST`
    DepositLst {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Asset address or 32-byte asset id
        asset: String,
        /// Staker address or 32-byte id
        staker: String,
        /// Amount in base units
        amount: U256,
    },
    /// `depositNST`
    DepositNst {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Validator id blob
        validator_id: String,
        /// Staker address or 32-byte id
        staker: String,
        /// Amount in base units
        amount: U256,
    },
    /// `withdrawLST`
    WithdrawLst {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Asset address or 32-byte asset id
        asset: String,
        /// Recipient address or 32-byte id
        withdrawer: String,
        /// Amount in base units
        amount: U256,
    },
    /// `withdrawNST`
    WithdrawNst {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Validator id blob
        validator_id: String,
        /// Recipient address or 32-byte id
        withdrawer: String,
        /// Amount in base units
        amount: U256,
    },
    /// `registerOrUpdateClientChain`
    RegisterClientChain {
        /// Network id being registered
        client_chain_id: u32,
        /// Address length on that chain, in bytes
        address_length: u8,
        /// Display name
        name: String,
        /// Free-form metadata
        meta_info: String,
        /// Signature scheme name
        signature_type: String,
    },
    /// `registerToken`
    RegisterToken {
        /// Network id of the token's chain
        client_chain_id: u32,
        /// Token address or 32-byte id
        token: String,
        /// Token decimals
        decimals: u8,
        /// Display name
        name: String,
        /// Free-form metadata
        meta_data: String,
        /// Price oracle description
        oracle_info: String,
    },
    /// `updateToken`
    UpdateToken {
        /// Network id of the token's chain
        client_chain_id: u32,
        /// Token address or 32-byte id
        token: String,
        /// New metadata
        meta_data: String,
    },
    /// `delegate`
    Delegate {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Asset address or 32-byte asset id
        asset: String,
        /// Staker address or 32-byte id
        staker: String,
        /// Bech32 operator address
        operator: String,
        /// Amount in base units
        amount: U256,
        /// Explicit LayerZero nonce (v1 schema only)
        lz_nonce: Option<u64>,
    },
    /// `undelegate`
    Undelegate {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Asset address or 32-byte asset id
        asset: String,
        /// Staker address or 32-byte id
        staker: String,
        /// Bech32 operator address
        operator: String,
        /// Amount in base units
        amount: U256,
        /// Explicit LayerZero nonce (v1 schema only)
        lz_nonce: Option<u64>,
        /// Skip the unbonding period (v2 schema only)
        instant_unbond: Option<bool>,
    },
    /// `associateOperatorWithStaker`
    AssociateOperator {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Raw staker bytes in hex
        staker: String,
        /// Bech32 operator address
        operator: String,
    },
    /// `dissociateOperatorFromStaker`
    DissociateOperator {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Raw staker bytes in hex
        staker: String,
    },
    /// `claimReward`
    ClaimReward {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Asset address or 32-byte asset id
        asset: String,
        /// Recipient address or 32-byte id
        withdrawer: String,
        /// Amount in base units
        amount: U256,
    },
    /// `compoundReward`
    CompoundReward {
        /// Network id of the origin chain
        client_chain_id: u32,
        /// Staker address or 32-byte id
        staker: String,
        /// Coins to compound
        rewards: Vec<RewardCoin>,
        /// How the compounded amount is split across operators
        allocations: Vec<OperatorShare>,
    },
}

impl Operation {
    /// Variant without arguments
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::DepositLst { .. } => OperationKind::DepositLst,
            Operation::DepositNst { .. } => OperationKind::DepositNst,
            Operation::WithdrawLst { .. } => OperationKind::WithdrawLst,
            Operation::WithdrawNst { .. } => OperationKind::WithdrawNst,
            Operation::RegisterClientChain { .. } => OperationKind::RegisterClientChain,
            Operation::RegisterToken { .. } => OperationKind::RegisterToken,
            Operation::UpdateToken { .. } => OperationKind::UpdateToken,
            Operation::Delegate { .. } => OperationKind::Delegate,
            Operation::Undelegate { .. } => OperationKind::Undelegate,
            Operation::AssociateOperator { .. } => OperationKind::AssociateOperator,
            Operation::DissociateOperator { .. } => OperationKind::DissociateOperator,
            Operation::ClaimReward { .. } => OperationKind::ClaimReward,
            Operation::CompoundReward { .. } => OperationKind::CompoundReward,
        }
    }

    /// Command-line name
    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Owning domain
    pub fn domain(&self) -> Domain {
        self.kind().domain()
    }

    /// ABI function name
    pub fn function_name(&self) -> &'static str {
        self.kind().function_name()
    }

    /// Canonicalize the arguments and key them by schema parameter name
    pub fn named_args(&self) -> Result<NamedArgs, SdkError> {
        let args = match self {
            Operation::DepositLst {
                client_chain_id,
                asset,
                staker,
                amount,
            } => chain(*client_chain_id)
                .with("assetsAddress", identifier(asset)?)
                .with("stakerAddress", identifier(staker)?)
                .with("opAmount", Token::Uint(*amount)),
            Operation::DepositNst {
                client_chain_id,
                validator_id,
                staker,
                amount,
            } => chain(*client_chain_id)
                .with("validatorID", Token::Bytes(decode_blob(validator_id)?))
                .with("stakerAddress", identifier(staker)?)
                .with("opAmount", Token::Uint(*amount)),
            Operation::WithdrawLst {
                client_chain_id,
                asset,
                withdrawer,
                amount,
            } => chain(*client_chain_id)
                .with("assetsAddress", identifier(asset)?)
                .with("withdrawAddress", identifier(withdrawer)?)
                .with("opAmount", Token::Uint(*amount)),
            Operation::WithdrawNst {
                client_chain_id,
                validator_id,
                withdrawer,
                amount,
            } => chain(*client_chain_id)
                .with("validatorID", Token::Bytes(decode_blob(validator_id)?))
                .with("withdrawAddress", identifier(withdrawer)?)
                .with("opAmount", Token::Uint(*amount)),
            Operation::RegisterClientChain {
                client_chain_id,
                address_length,
                name,
                meta_info,
                signature_type,
            } => chain(*client_chain_id)
                .with("addressLength", Token::uint(u64::from(*address_length)))
                .with("name", Token::String(name.clone()))
                .with("metaInfo", Token::String(meta_info.clone()))
                .with("signatureType", Token::String(signature_type.clone())),
            Operation::RegisterToken {
                client_chain_id,
                token,
                decimals,
                name,
                meta_data,
                oracle_info,
            } => NamedArgs::new()
                .with("clientChainId", Token::uint(u64::from(*client_chain_id)))
                .with("token", identifier(token)?)
                .with("decimals", Token::uint(u64::from(*decimals)))
                .with("name", Token::String(name.clone()))
                .with("metaData", Token::String(meta_data.clone()))
                .with("oracleInfo", Token::String(oracle_info.clone())),
            Operation::UpdateToken {
                client_chain_id,
                token,
                meta_data,
            } => NamedArgs::new()
                .with("clientChainId", Token::uint(u64::from(*client_chain_id)))
                .with("token", identifier(token)?)
                .with("metaData", Token::String(meta_data.clone())),
            Operation::Delegate {
                client_chain_id,
                asset,
                staker,
                operator,
                amount,
                lz_nonce,
            } => {
                let mut args = delegation_args(*client_chain_id, asset, staker, operator, *amount)?;
                if let Some(nonce) = lz_nonce {
                    args.push("lzNonce", Token::uint(*nonce));
                }
                args
            }
            Operation::Undelegate {
                client_chain_id,
                asset,
                staker,
                operator,
                amount,
                lz_nonce,
                instant_unbond,
            } => {
                let mut args = delegation_args(*client_chain_id, asset, staker, operator, *amount)?;
                if let Some(nonce) = lz_nonce {
                    args.push("lzNonce", Token::uint(*nonce));
                }
                if let Some(instant) = instant_unbond {
                    args.push("instantUnbond", Token::Bool(*instant));
                }
                args
            }
            Operation::AssociateOperator {
                client_chain_id,
                staker,
                operator,
            } => chain(*client_chain_id)
                .with("staker", Token::Bytes(decode_blob(staker)?))
                .with("operator", Token::Bytes(operator_bytes(operator)?)),
            Operation::DissociateOperator {
                client_chain_id,
                staker,
            } => chain(*client_chain_id).with("staker", Token::Bytes(decode_blob(staker)?)),
            Operation::ClaimReward {
                client_chain_id,
                asset,
                withdrawer,
                amount,
            } => chain(*client_chain_id)
                .with("assetsAddress", identifier(asset)?)
                .with("withdrawer", identifier(withdrawer)?)
                .with("opAmount", Token::Uint(*amount)),
            Operation::CompoundReward {
                client_chain_id,
                staker,
                rewards,
                allocations,
            } => {
                let rewards = rewards
                    .iter()
                    .map(|coin| {
                        Token::Tuple(vec![
                            Token::String(coin.denom.clone()),
                            Token::Uint(coin.amount),
                        ])
                    })
                    .collect();
                let allocations = allocations
                    .iter()
                    .map(|share| {
                        Ok(Token::Tuple(vec![
                            Token::Bytes(operator_bytes(&share.operator)?),
                            Token::Uint(share.numerator),
                            Token::Uint(share.denominator),
                        ]))
                    })
                    .collect::<Result<Vec<_>, SdkError>>()?;
                chain(*client_chain_id)
                    .with("stakerAddress", identifier(staker)?)
                    .with("rewards", Token::Array(rewards))
                    .with("allocations", Token::Array(allocations))
            }
        };
        Ok(args)
    }
}

fn chain(client_chain_id: u32) -> NamedArgs {
    NamedArgs::new().with("clientChainID", Token::uint(u64::from(client_chain_id)))
}

fn identifier(input: &str) -> Result<Token, SdkError> {
    encode_identifier(input).map(Token::Bytes)
}

fn delegation_args(
    client_chain_id: u32,
    asset: &str,
    staker: &str,
    operator: &str,
    amount: U256,
) -> Result<NamedArgs, SdkError> {
    Ok(chain(client_chain_id)
        .with("assetsAddress", identifier(asset)?)
        .with("stakerAddress", identifier(staker)?)
        .with("operatorAddr", Token::Bytes(operator_bytes(operator)?))
        .with("opAmount", Token::Uint(amount)))
}

/// Read-only view of the asset precompile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOperation {
    /// `getClientChains`
    ClientChains,
    /// `isRegisteredClientChain`
    IsRegisteredClientChain {
        /// Network id to check
        client_chain_id: u32,
    },
}

impl QueryOperation {
    /// Command-line name
    pub fn name(&self) -> &'static str {
        match self {
            QueryOperation::ClientChains => "client-chains",
            QueryOperation::IsRegisteredClientChain { .. } => "is-registered-client-chain",
        }
    }

    /// Owning domain
    pub fn domain(&self) -> Domain {
        Domain::Asset
    }

    /// ABI function name
    pub fn function_name(&self) -> &'static str {
        match self {
            QueryOperation::ClientChains => "getClientChains",
            QueryOperation::IsRegisteredClientChain { .. } => "isRegisteredClientChain",
        }
    }

    /// Arguments keyed by parameter name
    pub fn named_args(&self) -> NamedArgs {
        match self {
            QueryOperation::ClientChains => NamedArgs::new(),
            QueryOperation::IsRegisteredClientChain { client_chain_id } => chain(*client_chain_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSET: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
    const STAKER: &str = "0x742d35cc6634c0532925a3b844bc9e7595f0ab3d";
    const OPERATOR: &str = "exo18cggcpvwspnd5c6ny8wrqxpffj5zmhklprtnph";

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.name().parse::<OperationKind>().unwrap(), kind);
            assert_eq!(kind.function_name().parse::<OperationKind>().unwrap(), kind);
        }
        assert!("transfer".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_deposit_args_are_padded() {
        let op = Operation::DepositLst {
            client_chain_id: 101,
            asset: ASSET.into(),
            staker: STAKER.into(),
            amount: U256::from(1000),
        };
        let args = op.named_args().unwrap();
        assert_eq!(args.get("clientChainID"), Some(&Token::uint(101)));
        match args.get("assetsAddress") {
            Some(Token::Bytes(b)) => {
                assert_eq!(b.len(), 32);
                assert_eq!(hex::encode(&b[..20]), &ASSET[2..]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(op.domain(), Domain::Asset);
        assert_eq!(op.function_name(), "depositLST");
    }

    #[test]
    fn test_optional_delegation_args() {
        let op = Operation::Undelegate {
            client_chain_id: 101,
            asset: ASSET.into(),
            staker: STAKER.into(),
            operator: OPERATOR.into(),
            amount: U256::from(5),
            lz_nonce: None,
            instant_unbond: None,
        };
        let args = op.named_args().unwrap();
        assert!(args.get("instantUnbond").is_none());
        assert!(args.get("lzNonce").is_none());
        assert_eq!(
            args.get("operatorAddr"),
            Some(&Token::Bytes(OPERATOR.as_bytes().to_vec()))
        );
    }

    #[test]
    fn test_self_delegate_keeps_raw_staker() {
        let op = Operation::AssociateOperator {
            client_chain_id: 101,
            staker: STAKER.into(),
            operator: OPERATOR.into(),
        };
        match op.named_args().unwrap().get("staker") {
            Some(Token::Bytes(b)) => assert_eq!(b.len(), 20),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_identifier_rejected() {
        let op = Operation::DepositLst {
            client_chain_id: 101,
            asset: "0x1234".into(),
            staker: STAKER.into(),
            amount: U256::one(),
        };
        assert!(matches!(op.named_args(), Err(SdkError::InputEncoding(_))));
    }

    #[test]
    fn test_parse_reward_coin_and_share() {
        let coin: RewardCoin = "hua:250".parse().unwrap();
        assert_eq!(coin.denom, "hua");
        assert_eq!(coin.amount, U256::from(250));
        assert!("hua".parse::<RewardCoin>().is_err());
        assert!(":5".parse::<RewardCoin>().is_err());

        let share: OperatorShare = format!("{}:1/3", OPERATOR).parse().unwrap();
        assert_eq!(share.operator, OPERATOR);
        assert_eq!(share.numerator, U256::one());
        assert_eq!(share.denominator, U256::from(3));
        assert!(format!("{}:1/0", OPERATOR).parse::<OperatorShare>().is_err());
        assert!(format!("{}:1", OPERATOR).parse::<OperatorShare>().is_err());
        assert!("bad-operator:1/2".parse::<OperatorShare>().is_err());
    }

    #[test]
    fn test_query_args() {
        let q = QueryOperation::IsRegisteredClientChain { client_chain_id: 40161 };
        assert_eq!(q.named_args().get("clientChainID"), Some(&Token::uint(40161)));
        assert!(QueryOperation::ClientChains.named_args().is_empty());
    }
}
