//! State-changing precompile commands

use clap::Subcommand;
use exo_primitives::U256;
use exo_sdk::codec::parse_amount;
use exo_sdk::{ConfirmationStatus, Operation, OperatorShare, RewardCoin, SubmissionResult, Wallet};
use serde_json::Value;

use super::{token_to_json, token_to_text, Session};
use crate::{config::Config, output::Output, CliError};

/// Staking, registration and reward subcommands
#[derive(Debug, Subcommand)]
pub enum StakingCommand {
    /// Deposit a liquid staking token
    Deposit {
        /// Staker address or 32-byte id
        #[arg(long)]
        staker: String,
        /// Asset address or 32-byte id; defaults to default_asset_id
        #[arg(long)]
        asset: Option<String>,
        /// Amount in base units
        #[arg(long, value_parser = parse_amount)]
        amount: U256,
    },
    /// Deposit natively staked tokens
    DepositNst {
        /// Staker address or 32-byte id
        #[arg(long)]
        staker: String,
        /// Validator id as hex
        #[arg(long)]
        validator_id: String,
        /// Amount in base units
        #[arg(long, value_parser = parse_amount)]
        amount: U256,
    },
    /// Withdraw a liquid staking token
    Withdraw {
        /// Recipient address or 32-byte id
        #[arg(long, alias = "staker")]
        withdrawer: String,
        /// Asset address or 32-byte id; defaults to default_asset_id
        #[arg(long)]
        asset: Option<String>,
        /// Amount in base units
        #[arg(long, value_parser = parse_amount)]
        amount: U256,
    },
    /// Withdraw natively staked tokens
    WithdrawNst {
        /// Recipient address or 32-byte id
        #[arg(long, alias = "staker")]
        withdrawer: String,
        /// Validator id as hex
        #[arg(long)]
        validator_id: String,
        /// Amount in base units
        #[arg(long, value_parser = parse_amount)]
        amount: U256,
    },
    /// Register a client chain or update its metadata
    RegisterClientChain {
        /// Chain id to register; defaults to the network id
        #[arg(long)]
        client_chain_id: Option<u32>,
        /// Address length on that chain, in bytes
        #[arg(long, default_value_t = 20)]
        address_length: u8,
        /// Display name
        #[arg(long)]
        name: String,
        /// Free-form metadata
        #[arg(long, default_value = "")]
        meta_info: String,
        /// Signature scheme
        #[arg(long, default_value = "secp256k1")]
        signature_type: String,
    },
    /// Register a token on a client chain
    RegisterToken {
        /// Token address or 32-byte id
        #[arg(long)]
        token: String,
        /// Token decimals
        #[arg(long, default_value_t = 18)]
        decimals: u8,
        /// Display name
        #[arg(long)]
        name: String,
        /// Free-form metadata
        #[arg(long, default_value = "")]
        meta_data: String,
        /// Price oracle description
        #[arg(long, default_value = "")]
        oracle_info: String,
    },
    /// Update a registered token's metadata
    UpdateToken {
        /// Token address or 32-byte id
        #[arg(long)]
        token: String,
        /// New metadata
        #[arg(long)]
        meta_data: String,
    },
    /// Delegate deposited assets to an operator
    Delegate {
        /// Staker address or 32-byte id
        #[arg(long)]
        staker: String,
        /// Asset address or 32-byte id; defaults to default_asset_id
        #[arg(long)]
        asset: Option<String>,
        /// Bech32 operator address
        #[arg(long)]
        operator: String,
        /// Amount in base units
        #[arg(long, value_parser = parse_amount)]
        amount: U256,
        /// Explicit LayerZero nonce (v1 delegation schema)
        #[arg(long)]
        lz_nonce: Option<u64>,
    },
    /// Undelegate assets from an operator
    Undelegate {
        /// Staker address or 32-byte id
        #[arg(long)]
        staker: String,
        /// Asset address or 32-byte id; defaults to default_asset_id
        #[arg(long)]
        asset: Option<String>,
        /// Bech32 operator address
        #[arg(long)]
        operator: String,
        /// Amount in base units
        #[arg(long, value_parser = parse_amount)]
        amount: U256,
        /// Explicit LayerZero nonce (v1 delegation schema)
        #[arg(long)]
        lz_nonce: Option<u64>,
        /// Skip the unbonding period (v2 delegation schema)
        #[arg(long)]
        instant: bool,
    },
    /// Associate the staker with an operator
    SelfDelegate {
        /// Staker address as hex
        #[arg(long)]
        staker: String,
        /// Bech32 operator address
        #[arg(long)]
        operator: String,
    },
    /// Dissociate the staker from its operator
    Dissociate {
        /// Staker address as hex
        #[arg(long)]
        staker: String,
    },
    /// Claim accrued rewards
    ClaimReward {
        /// Recipient address or 32-byte id
        #[arg(long, alias = "staker")]
        withdrawer: String,
        /// Asset address or 32-byte id; defaults to default_asset_id
        #[arg(long)]
        asset: Option<String>,
        /// Amount in base units
        #[arg(long, value_parser = parse_amount)]
        amount: U256,
    },
    /// Re-stake accrued rewards across operators
    CompoundReward {
        /// Staker address or 32-byte id
        #[arg(long)]
        staker: String,
        /// Reward coin as denom:amount; repeatable
        #[arg(long = "reward", required = true)]
        rewards: Vec<RewardCoin>,
        /// Operator share as operator:numerator/denominator; repeatable
        #[arg(long = "share", required = true)]
        allocations: Vec<OperatorShare>,
    },
}

fn asset_or_default(asset: Option<String>, config: &Config) -> Result<String, CliError> {
    asset
        .or_else(|| config.default_asset_id.clone())
        .ok_or_else(|| {
            CliError::InvalidInput(
                "no --asset given and no default_asset_id configured".to_string(),
            )
        })
}

impl StakingCommand {
    /// Typed operation for this command
    pub fn into_operation(self, config: &Config) -> Result<Operation, CliError> {
        let client_chain_id = config.network_id;
        let operation = match self {
            StakingCommand::Deposit { staker, asset, amount } => Operation::DepositLst {
                client_chain_id,
                asset: asset_or_default(asset, config)?,
                staker,
                amount,
            },
            StakingCommand::DepositNst { staker, validator_id, amount } => {
                Operation::DepositNst {
                    client_chain_id,
                    validator_id,
                    staker,
                    amount,
                }
            }
            StakingCommand::Withdraw { withdrawer, asset, amount } => Operation::WithdrawLst {
                client_chain_id,
                asset: asset_or_default(asset, config)?,
                withdrawer,
                amount,
            },
            StakingCommand::WithdrawNst { withdrawer, validator_id, amount } => {
                Operation::WithdrawNst {
                    client_chain_id,
                    validator_id,
                    withdrawer,
                    amount,
                }
            }
            StakingCommand::RegisterClientChain {
                client_chain_id: chain,
                address_length,
                name,
                meta_info,
                signature_type,
            } => Operation::RegisterClientChain {
                client_chain_id: chain.unwrap_or(client_chain_id),
                address_length,
                name,
                meta_info,
                signature_type,
            },
            StakingCommand::RegisterToken {
                token,
                decimals,
                name,
                meta_data,
                oracle_info,
            } => Operation::RegisterToken {
                client_chain_id,
                token,
                decimals,
                name,
                meta_data,
                oracle_info,
            },
            StakingCommand::UpdateToken { token, meta_data } => Operation::UpdateToken {
                client_chain_id,
                token,
                meta_data,
            },
            StakingCommand::Delegate {
                staker,
                asset,
                operator,
                amount,
                lz_nonce,
            } => Operation::Delegate {
                client_chain_id,
                asset: asset_or_default(asset, config)?,
                staker,
                operator,
                amount,
                lz_nonce,
            },
            StakingCommand::Undelegate {
                staker,
                asset,
                operator,
                amount,
                lz_nonce,
                instant,
            } => Operation::Undelegate {
                client_chain_id,
                asset: asset_or_default(asset, config)?,
                staker,
                operator,
                amount,
                lz_nonce,
                instant_unbond: instant.then_some(true),
            },
            StakingCommand::SelfDelegate { staker, operator } => Operation::AssociateOperator {
                client_chain_id,
                staker,
                operator,
            },
            StakingCommand::Dissociate { staker } => Operation::DissociateOperator {
                client_chain_id,
                staker,
            },
            StakingCommand::ClaimReward { withdrawer, asset, amount } => Operation::ClaimReward {
                client_chain_id,
                asset: asset_or_default(asset, config)?,
                withdrawer,
                amount,
            },
            StakingCommand::CompoundReward {
                staker,
                rewards,
                allocations,
            } => Operation::CompoundReward {
                client_chain_id,
                staker,
                rewards,
                allocations,
            },
        };
        Ok(operation)
    }

    /// Submit the operation and report the outcome
    pub async fn execute(self, session: &Session) -> Result<(), CliError> {
        let operation = self.into_operation(&session.config)?;
        let dispatcher = session.dispatcher()?;
        let key = session.private_key()?;

        let result = if session.wait {
            dispatcher
                .invoke(&session.config.rpc_url, key, operation)
                .await?
        } else {
            let wallet = Wallet::from_private_key_hex(key)?;
            let client = session.client()?;
            dispatcher.submit_only(&client, &wallet, operation).await?
        };

        report(&result, session.json).print();
        Ok(())
    }
}

fn report(result: &SubmissionResult, json: bool) -> Output {
    let mut out = Output::new(json)
        .field("operation", &result.operation)
        .field("destination", &result.destination.to_hex())
        .field("tx_hash", &result.tx_hash.to_hex())
        .field("status", &result.status.to_string())
        .field("simulation", result.simulation.label())
        .field_bool("success", matches!(result.status, ConfirmationStatus::Mined { success: true }))
        .line(format!("Operation:   {}", result.operation))
        .line(format!("Destination: {}", result.destination))
        .line(format!("Tx hash:     {}", result.tx_hash))
        .line(format!("Simulation:  {}", result.simulation.label()))
        .line(format!("Status:      {}", result.status));

    if let Some(outputs) = &result.simulated_outputs {
        out = out
            .field_value(
                "simulated_outputs",
                Value::Array(outputs.iter().map(token_to_json).collect()),
            )
            .line(format!(
                "Dry run:     {}",
                outputs.iter().map(token_to_text).collect::<Vec<_>>().join(", ")
            ));
    }
    if let Some(receipt) = &result.receipt {
        out = out
            .field_u64("block_number", receipt.block_number)
            .field_u64("gas_used", receipt.gas_used)
            .line(format!("Block:       {}", receipt.block_number))
            .line(format!("Gas used:    {}", receipt.gas_used));
    }
    out
}
