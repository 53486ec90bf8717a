//! Signing, dry run and broadcast of one encoded call

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use exo_primitives::H256;
use exo_types::SignedTransaction;
use tracing::{debug, info, warn};

use crate::codec::is_zero_bytes;
use crate::dispatcher::EncodedCall;
use crate::types::{BlockId, CallRequest};
use crate::{ExoClient, SdkError, TxBuilder, Wallet};

/// Default gas limit for precompile calls
pub const DEFAULT_GAS_LIMIT: u64 = 500_000;

/// What to do with the `eth_call` dry run before broadcasting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationPolicy {
    /// Log a failed dry run and broadcast anyway
    #[default]
    Warn,
    /// Stop before broadcasting when the dry run fails
    Abort,
    /// Do not simulate
    Skip,
}

impl fmt::Display for SimulationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SimulationPolicy::Warn => "warn",
            SimulationPolicy::Abort => "abort",
            SimulationPolicy::Skip => "skip",
        })
    }
}

impl FromStr for SimulationPolicy {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(SimulationPolicy::Warn),
            "abort" => Ok(SimulationPolicy::Abort),
            "skip" => Ok(SimulationPolicy::Skip),
            other => Err(SdkError::InputEncoding(format!(
                "unknown simulation policy `{}` (expected warn, abort or skip)",
                other
            ))),
        }
    }
}

/// Result of the dry run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationOutcome {
    /// Non-zero return data
    Passed {
        /// Raw return data
        output: Bytes,
    },
    /// Empty or all-zero return data
    WouldFail {
        /// Raw return data
        output: Bytes,
    },
    /// The node refused the call
    Errored {
        /// Node error message
        message: String,
    },
    /// Simulation disabled
    Skipped,
}

impl SimulationOutcome {
    /// The dry run predicts success
    pub fn passed(&self) -> bool {
        matches!(self, SimulationOutcome::Passed { .. })
    }

    /// Return data, when the call ran
    pub fn output(&self) -> Option<&Bytes> {
        match self {
            SimulationOutcome::Passed { output } | SimulationOutcome::WouldFail { output } => {
                Some(output)
            }
            _ => None,
        }
    }

    /// Short label: passed, would-fail, errored or skipped
    pub fn label(&self) -> &'static str {
        match self {
            SimulationOutcome::Passed { .. } => "passed",
            SimulationOutcome::WouldFail { .. } => "would-fail",
            SimulationOutcome::Errored { .. } => "errored",
            SimulationOutcome::Skipped => "skipped",
        }
    }

    fn failure_reason(&self) -> Option<String> {
        match self {
            SimulationOutcome::WouldFail { output } => Some(format!(
                "call returned {}",
                if output.is_empty() {
                    "no data".to_string()
                } else {
                    format!("0x{}", hex::encode(output))
                }
            )),
            SimulationOutcome::Errored { message } => Some(message.clone()),
            _ => None,
        }
    }
}

/// A broadcast transaction
#[derive(Debug, Clone)]
pub struct Submission {
    /// Locally computed transaction id
    pub tx_hash: H256,
    /// What was sent
    pub signed: SignedTransaction,
    /// Dry run result
    pub simulation: SimulationOutcome,
}

/// Signs, simulates and broadcasts encoded calls
#[derive(Debug, Clone, Copy)]
pub struct Submitter {
    gas_limit: u64,
    policy: SimulationPolicy,
}

impl Default for Submitter {
    fn default() -> Self {
        Self::new(DEFAULT_GAS_LIMIT, SimulationPolicy::default())
    }
}

impl Submitter {
    /// Create a submitter
    pub fn new(gas_limit: u64, policy: SimulationPolicy) -> Self {
        Self { gas_limit, policy }
    }

    /// Gas limit put on every transaction
    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Active simulation policy
    pub fn policy(&self) -> SimulationPolicy {
        self.policy
    }

    /// Sign, simulate and broadcast in that order
    pub async fn submit(
        &self,
        client: &ExoClient,
        wallet: &Wallet,
        call: EncodedCall,
    ) -> Result<Submission, SdkError> {
        let signed = self.sign(client, wallet, call).await?;
        let simulation = self.simulate(client, wallet, &signed).await?;
        let tx_hash = self.broadcast(client, &signed).await?;
        Ok(Submission {
            tx_hash,
            signed,
            simulation,
        })
    }

    /// Fetch chain id, nonce and gas price (in that order), then sign
    pub async fn sign(
        &self,
        client: &ExoClient,
        wallet: &Wallet,
        call: EncodedCall,
    ) -> Result<SignedTransaction, SdkError> {
        let chain_id = client
            .chain_id()
            .await
            .map_err(|e| SdkError::connection("chain id", e))?;
        let nonce = client
            .get_nonce(wallet.address(), BlockId::Latest)
            .await
            .map_err(|e| SdkError::connection("nonce", e))?;
        let gas_price = client
            .gas_price()
            .await
            .map_err(|e| SdkError::connection("gas price", e))?;
        debug!(chain_id, nonce, gas_price, "fetched signing context");

        let signed = TxBuilder::new(chain_id)
            .nonce(nonce)
            .gas_limit(self.gas_limit)
            .gas_price(gas_price)
            .to(call.destination)
            .data(call.payload)
            .sign_legacy(wallet)?;
        Ok(signed)
    }

    /// Dry-run the signed call with `eth_call`, applying the policy
    pub async fn simulate(
        &self,
        client: &ExoClient,
        wallet: &Wallet,
        signed: &SignedTransaction,
    ) -> Result<SimulationOutcome, SdkError> {
        if self.policy == SimulationPolicy::Skip {
            return Ok(SimulationOutcome::Skipped);
        }

        // No gas, price or value: the dry run must not depend on the balance
        let tx = &signed.tx;
        let request = CallRequest {
            from: Some(*wallet.address()),
            to: tx.to,
            data: Some(tx.data.clone()),
            ..Default::default()
        };
        let outcome = match client.call(&request, BlockId::Latest).await {
            Ok(output) if is_zero_bytes(&output) => SimulationOutcome::WouldFail { output },
            Ok(output) => SimulationOutcome::Passed { output },
            Err(SdkError::Rpc { message, .. }) => SimulationOutcome::Errored { message },
            Err(e) => SimulationOutcome::Errored {
                message: e.to_string(),
            },
        };

        if let Some(reason) = outcome.failure_reason() {
            if self.policy == SimulationPolicy::Abort {
                return Err(SdkError::SimulationRejected(reason));
            }
            warn!(%reason, "simulation indicates the call may fail; broadcasting anyway");
        } else {
            debug!("simulation passed");
        }
        Ok(outcome)
    }

    /// Send the raw envelope; the returned id is always the local hash
    pub async fn broadcast(
        &self,
        client: &ExoClient,
        signed: &SignedTransaction,
    ) -> Result<H256, SdkError> {
        let tx_hash = signed.hash();
        let echoed = client
            .send_raw_transaction(&signed.encode())
            .await
            .map_err(|e| match e {
                SdkError::Rpc { message, .. } => SdkError::Broadcast(message),
                other => SdkError::Broadcast(other.to_string()),
            })?;
        if echoed != tx_hash {
            warn!(local = %tx_hash, node = %echoed, "node reported a different transaction hash");
        }
        info!(tx_hash = %tx_hash, "transaction broadcast");
        Ok(tx_hash)
    }
}
