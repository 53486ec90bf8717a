//! Operation dispatcher: drives one operation from typed arguments to a
//! confirmed receipt.
//!
//! ```text
//! Idle -> ArgumentsEncoded -> Connected -> Signed -> Broadcast -> Confirmed
//!                                                             \-> Failed
//!                                                             \-> TimedOut
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use exo_primitives::{Address, H256};
use exo_types::Receipt;
use tracing::{debug, info};

use crate::abi::Token;
use crate::error::DispatchError;
use crate::operation::{Operation, QueryOperation};
use crate::schema::{OperationDescriptor, SchemaRegistry};
use crate::submit::{SimulationOutcome, SimulationPolicy, Submitter, DEFAULT_GAS_LIMIT};
use crate::types::{BlockId, CallRequest};
use crate::waiter::{ConfirmationWaiter, DEFAULT_CONFIRM_TIMEOUT, DEFAULT_POLL_INTERVAL};
use crate::{ExoClient, SdkError, Wallet};

/// Default per-request HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Knobs of the submission pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Gas limit of every transaction
    pub gas_limit: u64,
    /// Dry-run policy
    pub simulation: SimulationPolicy,
    /// Confirmation deadline
    pub confirm_timeout: Duration,
    /// Receipt polling interval
    pub poll_interval: Duration,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            simulation: SimulationPolicy::default(),
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Where an invocation is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Nothing done yet
    Idle,
    /// Call data built
    ArgumentsEncoded,
    /// RPC session available
    Connected,
    /// Transaction signed; the id is known
    Signed,
    /// Accepted by the node
    Broadcast,
    /// Mined with success status
    Confirmed,
    /// Mined with failure status, or unknown to the node
    Failed,
    /// Not mined before the deadline
    TimedOut,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineStage::Idle => "idle",
            PipelineStage::ArgumentsEncoded => "arguments-encoded",
            PipelineStage::Connected => "connected",
            PipelineStage::Signed => "signed",
            PipelineStage::Broadcast => "broadcast",
            PipelineStage::Confirmed => "confirmed",
            PipelineStage::Failed => "failed",
            PipelineStage::TimedOut => "timed-out",
        })
    }
}

/// Call payload aimed at one precompile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCall {
    /// Precompile address
    pub destination: Address,
    /// Selector followed by the ABI body
    pub payload: Bytes,
}

/// On-chain state of a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Broadcast, not waited for
    Pending,
    /// Included in a block
    Mined {
        /// Receipt status was 1
        success: bool,
    },
    /// Not mined before the deadline
    TimedOut,
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationStatus::Pending => f.write_str("pending"),
            ConfirmationStatus::Mined { success: true } => f.write_str("confirmed"),
            ConfirmationStatus::Mined { success: false } => f.write_str("failed"),
            ConfirmationStatus::TimedOut => f.write_str("timed-out"),
        }
    }
}

/// Outcome of one submitted operation
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    /// Operation name
    pub operation: String,
    /// Precompile address
    pub destination: Address,
    /// Transaction id
    pub tx_hash: H256,
    /// Dry run result
    pub simulation: SimulationOutcome,
    /// Dry run return values, when they decode against the schema
    pub simulated_outputs: Option<Vec<Token>>,
    /// Confirmation state
    pub status: ConfirmationStatus,
    /// Receipt, once mined
    pub receipt: Option<Receipt>,
}

/// Decoded return values of a read-only call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Operation name
    pub operation: String,
    /// Precompile address
    pub destination: Address,
    /// Output name and value pairs, in declaration order
    pub outputs: Vec<(String, Token)>,
}

impl QueryResult {
    /// Output by name
    pub fn get(&self, name: &str) -> Option<&Token> {
        self.outputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Tracks stage and context of one invocation for logging and errors
struct Run {
    operation: String,
    destination: Option<Address>,
    stage: PipelineStage,
    tx_hash: Option<H256>,
}

impl Run {
    fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            destination: None,
            stage: PipelineStage::Idle,
            tx_hash: None,
        }
    }

    fn advance(&mut self, stage: PipelineStage) {
        info!(
            operation = %self.operation,
            from = %self.stage,
            to = %stage,
            tx_hash = ?self.tx_hash,
            "pipeline stage"
        );
        self.stage = stage;
    }

    fn fail(&self, source: SdkError) -> DispatchError {
        DispatchError {
            operation: self.operation.clone(),
            destination: self.destination,
            stage: self.stage,
            tx_hash: self.tx_hash.or_else(|| source.tx_hash()),
            source,
        }
    }
}

/// Maps operations to schema entries and drives the pipeline
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<SchemaRegistry>,
    settings: PipelineSettings,
}

impl Dispatcher {
    /// Create a dispatcher over an immutable registry
    pub fn new(registry: Arc<SchemaRegistry>, settings: PipelineSettings) -> Self {
        Self { registry, settings }
    }

    /// Active schemas
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Pipeline settings
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Look an operation up by domain and name
    pub fn resolve(&self, domain: &str, name: &str) -> Result<OperationDescriptor, SdkError> {
        self.registry.resolve(domain, name)
    }

    /// Resolve and encode without touching the network
    pub fn prepare(
        &self,
        operation: &Operation,
    ) -> Result<(OperationDescriptor, EncodedCall), SdkError> {
        let descriptor = self.registry.resolve_kind(operation.kind())?;
        let args = operation.named_args()?;
        let payload = descriptor.function.encode_named(&args)?;
        debug!(
            operation = operation.name(),
            destination = %descriptor.destination,
            payload = %hex::encode(&payload),
            "encoded call"
        );
        let call = EncodedCall {
            destination: descriptor.destination,
            payload: Bytes::from(payload),
        };
        Ok((descriptor, call))
    }

    /// Parse the key, connect to `endpoint`, submit and wait for confirmation
    #[cfg(feature = "http")]
    pub async fn invoke(
        &self,
        endpoint: &str,
        private_key: &str,
        operation: Operation,
    ) -> Result<SubmissionResult, DispatchError> {
        let mut run = Run::new(operation.name());
        let wallet = Wallet::from_private_key_hex(private_key).map_err(|e| run.fail(e))?;
        let (descriptor, call) = self.encode(&mut run, &operation)?;
        let client = ExoClient::connect(endpoint, self.settings.request_timeout)
            .map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::Connected);
        self.execute(&mut run, &client, &wallet, descriptor, call, true)
            .await
    }

    /// Submit and wait over an existing client
    pub async fn invoke_with(
        &self,
        client: &ExoClient,
        wallet: &Wallet,
        operation: Operation,
    ) -> Result<SubmissionResult, DispatchError> {
        let mut run = Run::new(operation.name());
        let (descriptor, call) = self.encode(&mut run, &operation)?;
        run.advance(PipelineStage::Connected);
        self.execute(&mut run, client, wallet, descriptor, call, true)
            .await
    }

    /// Submit without waiting; the result is [`ConfirmationStatus::Pending`]
    pub async fn submit_only(
        &self,
        client: &ExoClient,
        wallet: &Wallet,
        operation: Operation,
    ) -> Result<SubmissionResult, DispatchError> {
        let mut run = Run::new(operation.name());
        let (descriptor, call) = self.encode(&mut run, &operation)?;
        run.advance(PipelineStage::Connected);
        self.execute(&mut run, client, wallet, descriptor, call, false)
            .await
    }

    /// Read-only view call through `eth_call`
    pub async fn query(
        &self,
        client: &ExoClient,
        query: QueryOperation,
    ) -> Result<QueryResult, DispatchError> {
        let mut run = Run::new(query.name());
        let descriptor = self
            .registry
            .resolve_function(query.domain(), query.function_name())
            .map_err(|e| run.fail(e))?;
        run.destination = Some(descriptor.destination);
        let payload = descriptor
            .function
            .encode_named(&query.named_args())
            .map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::ArgumentsEncoded);
        run.advance(PipelineStage::Connected);

        let request = CallRequest {
            to: Some(descriptor.destination),
            data: Some(Bytes::from(payload)),
            ..Default::default()
        };
        let output = client
            .call(&request, BlockId::Latest)
            .await
            .map_err(|e| run.fail(e))?;

        let values = descriptor
            .function
            .decode_output(&output)
            .map_err(|e| run.fail(e))?;
        let outputs = descriptor
            .function
            .outputs
            .iter()
            .map(|p| p.name.clone())
            .zip(values)
            .collect();
        Ok(QueryResult {
            operation: query.name().to_string(),
            destination: descriptor.destination,
            outputs,
        })
    }

    fn encode(
        &self,
        run: &mut Run,
        operation: &Operation,
    ) -> Result<(OperationDescriptor, EncodedCall), DispatchError> {
        let (descriptor, call) = self.prepare(operation).map_err(|e| run.fail(e))?;
        run.destination = Some(call.destination);
        run.advance(PipelineStage::ArgumentsEncoded);
        Ok((descriptor, call))
    }

    async fn execute(
        &self,
        run: &mut Run,
        client: &ExoClient,
        wallet: &Wallet,
        descriptor: OperationDescriptor,
        call: EncodedCall,
        wait: bool,
    ) -> Result<SubmissionResult, DispatchError> {
        let submitter = Submitter::new(self.settings.gas_limit, self.settings.simulation);
        let destination = call.destination;

        let signed = submitter
            .sign(client, wallet, call)
            .await
            .map_err(|e| run.fail(e))?;
        run.tx_hash = Some(signed.hash());
        run.advance(PipelineStage::Signed);

        let simulation = submitter
            .simulate(client, wallet, &signed)
            .await
            .map_err(|e| run.fail(e))?;
        let simulated_outputs = simulation.output().and_then(|output| {
            descriptor
                .function
                .decode_output(output)
                .map_err(|e| debug!(error = %e, "simulation output does not decode"))
                .ok()
        });

        let tx_hash = submitter
            .broadcast(client, &signed)
            .await
            .map_err(|e| run.fail(e))?;
        run.advance(PipelineStage::Broadcast);

        let mut result = SubmissionResult {
            operation: run.operation.clone(),
            destination,
            tx_hash,
            simulation,
            simulated_outputs,
            status: ConfirmationStatus::Pending,
            receipt: None,
        };
        if !wait {
            return Ok(result);
        }

        let waiter = ConfirmationWaiter::new(self.settings.confirm_timeout, self.settings.poll_interval);
        match waiter.wait(client, tx_hash).await {
            Ok(receipt) => {
                run.advance(PipelineStage::Confirmed);
                result.status = ConfirmationStatus::Mined { success: true };
                result.receipt = Some(receipt);
                Ok(result)
            }
            Err(e) => {
                let stage = match &e {
                    SdkError::Timeout { .. } => PipelineStage::TimedOut,
                    SdkError::TransactionFailed { .. } | SdkError::NotFound(_) => {
                        PipelineStage::Failed
                    }
                    _ => run.stage,
                };
                if stage != run.stage {
                    run.advance(stage);
                }
                Err(run.fail(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Domain, SchemaSelection};
    use crate::transport::MockTransport;
    use exo_primitives::U256;

    const ASSET: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

    fn dispatcher() -> Dispatcher {
        let registry = SchemaRegistry::new(&SchemaSelection::default()).unwrap();
        Dispatcher::new(Arc::new(registry), PipelineSettings::default())
    }

    fn deposit(asset: &str) -> Operation {
        Operation::DepositLst {
            client_chain_id: 101,
            asset: asset.into(),
            staker: ASSET.into(),
            amount: U256::from(1000),
        }
    }

    #[test]
    fn test_prepare_selects_domain_destination() {
        let (descriptor, call) = dispatcher().prepare(&deposit(ASSET)).unwrap();
        assert_eq!(descriptor.domain, Domain::Asset);
        assert_eq!(call.destination, Address::from_low_u16(0x0804));
        assert_eq!(&call.payload[..4], &descriptor.function.selector);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::Broadcast.to_string(), "broadcast");
        assert_eq!(PipelineStage::TimedOut.to_string(), "timed-out");
        assert_eq!(ConfirmationStatus::Mined { success: false }.to_string(), "failed");
    }

    #[tokio::test]
    async fn test_submit_only_leaves_pending() {
        let transport = MockTransport::new();
        let client = ExoClient::with_transport(transport.clone());
        let wallet = Wallet::new_random();
        let result = dispatcher()
            .submit_only(&client, &wallet, deposit(ASSET))
            .await
            .unwrap();
        assert_eq!(result.status, ConfirmationStatus::Pending);
        assert!(result.receipt.is_none());
        assert_eq!(
            result.simulated_outputs,
            Some(vec![Token::Bool(true), Token::uint(0)])
        );
        assert!(!transport
            .methods()
            .contains(&"eth_getTransactionReceipt".to_string()));
    }

    #[tokio::test]
    async fn test_encoding_failure_stage_is_idle() {
        let client = ExoClient::new_mock();
        let err = dispatcher()
            .invoke_with(&client, &Wallet::new_random(), deposit("0x12"))
            .await
            .unwrap_err();
        assert_eq!(err.stage, PipelineStage::Idle);
        assert!(err.tx_hash.is_none());
        assert!(err.destination.is_none());
    }

    #[tokio::test]
    async fn test_query_client_chains() {
        let transport = MockTransport::new();
        // (true, [101, 102])
        let words = [1u64, 0x40, 2, 101, 102]
            .iter()
            .map(|w| format!("{:064x}", w))
            .collect::<String>();
        transport.set_response("eth_call", serde_json::json!(format!("0x{}", words)));
        let client = ExoClient::with_transport(transport);

        let result = dispatcher()
            .query(&client, QueryOperation::ClientChains)
            .await
            .unwrap();
        assert_eq!(result.get("success"), Some(&Token::Bool(true)));
        assert_eq!(
            result.outputs[1].1,
            Token::Array(vec![Token::uint(101), Token::uint(102)])
        );
    }

    #[tokio::test]
    async fn test_query_call_failure_reports_connected_stage() {
        let transport = MockTransport::new();
        transport.push_error("eth_call", -32603, "connection refused");
        let client = ExoClient::with_transport(transport);

        let err = dispatcher()
            .query(&client, QueryOperation::ClientChains)
            .await
            .unwrap_err();
        assert_eq!(err.stage, PipelineStage::Connected);
        assert_eq!(err.destination, Some(Address::from_low_u16(0x0804)));
        assert!(err.tx_hash.is_none());
    }
}
