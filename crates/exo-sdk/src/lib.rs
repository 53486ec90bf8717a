//! # exo-sdk
//!
//! Client pipeline for the Exocore asset, delegation and reward precompiles.
//!
//! ## Features
//!
//! - **SchemaRegistry**: versioned interface schemas with fixed destinations
//! - **Dispatcher**: encodes an [`Operation`], signs it, broadcasts it and
//!   waits for the receipt
//! - **ExoClient**: JSON-RPC client over a pluggable [`Transport`]
//! - **Wallet** / **TxBuilder**: EIP-155 legacy transaction signing
//! - **ABI**: Solidity ABI encoding and decoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use exo_primitives::U256;
//! use exo_sdk::{Dispatcher, ExoClient, Operation, PipelineSettings, SchemaRegistry,
//!               SchemaSelection, Wallet};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(SchemaRegistry::new(&SchemaSelection::default())?);
//!     let dispatcher = Dispatcher::new(registry, PipelineSettings::default());
//!
//!     let client = ExoClient::new_mock();
//!     let wallet = Wallet::new_random();
//!     let result = dispatcher
//!         .invoke_with(&client, &wallet, Operation::DepositLst {
//!             client_chain_id: 101,
//!             asset: "0xdac17f958d2ee523a2206206994597c13d831ec7".into(),
//!             staker: wallet.address().to_hex(),
//!             amount: U256::from(1000),
//!         })
//!         .await?;
//!     println!("{} {}", result.tx_hash, result.status);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
pub mod client;
pub mod codec;
pub mod dispatcher;
mod error;
pub mod operation;
pub mod schema;
pub mod submit;
pub mod transport;
pub mod tx_builder;
pub mod types;
pub mod waiter;
pub mod wallet;

pub use client::ExoClient;
pub use dispatcher::{
    ConfirmationStatus, Dispatcher, EncodedCall, PipelineSettings, PipelineStage, QueryResult,
    SubmissionResult,
};
pub use error::{DispatchError, SdkError};
pub use operation::{Operation, OperationKind, OperatorShare, QueryOperation, RewardCoin};
pub use schema::{
    Domain, DomainSelection, OperationDescriptor, SchemaRegistry, SchemaSelection, SchemaVersion,
};
pub use submit::{SimulationOutcome, SimulationPolicy, Submission, Submitter};
pub use transport::{MockTransport, Transport};
pub use tx_builder::TxBuilder;
pub use waiter::ConfirmationWaiter;
pub use wallet::Wallet;

#[cfg(feature = "http")]
pub use transport::HttpTransport;
