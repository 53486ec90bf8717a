//! # exo-types
//!
//! Transaction and receipt types exchanged with an Exocore node.
//!
//! - [`LegacyTx`] / [`SignedTransaction`]: the EIP-155 legacy envelope,
//!   RLP-encoded for `eth_sendRawTransaction`
//! - [`Receipt`] and [`TransactionInfo`]: what the node reports back

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod receipt;
pub mod transaction;

pub use receipt::{Log, Receipt, TransactionInfo, TxStatus};
pub use transaction::{LegacyTx, SignedTransaction, TxError, TxSignature};
