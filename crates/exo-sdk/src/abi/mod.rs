//! Solidity ABI encoding and decoding for precompile calls
//!
//! # Example
//!
//! ```rust
//! use exo_sdk::abi::{FunctionDef, NamedArgs, Token};
//!
//! let f = FunctionDef::parse(
//!     "dissociateOperatorFromStaker(uint32 clientChainID, bytes staker)",
//!     "(bool success)",
//! )
//! .unwrap();
//! let args = NamedArgs::new()
//!     .with("clientChainID", Token::uint(101))
//!     .with("staker", Token::Bytes(vec![0xab; 20]));
//! let data = f.encode_named(&args).unwrap();
//! assert_eq!(&data[..4], &f.selector);
//! ```

mod decode;
mod encode;
mod function;
mod types;

pub use decode::decode;
pub use encode::{encode, encode_call, function_selector};
pub use function::{parse_type, FunctionDef, NamedArgs, Param};
pub use types::{ParamType, Token};
