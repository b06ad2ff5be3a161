//! chainreg-evm — EVM JSON-RPC backend for ChainReg.
//!
//! Implements the `chainreg-core` collaborator traits against a registry
//! contract exposing `changeRegistrationStatuses(address[],bool)`,
//! `registered(address)` and `owner()`:
//!
//! - [`RpcTransport`] / [`HttpTransport`] — JSON-RPC 2.0 over HTTP
//! - [`RegistryAbi`] — calldata encoding and return decoding via alloy
//! - [`RegistryContract`] — probes with `eth_estimateGas`, queries with
//!   `eth_call`, submits with `eth_sendTransaction` and waits for the receipt

pub mod abi;
pub mod contract;
pub mod http;
pub mod rpc;

pub use abi::RegistryAbi;
pub use contract::{ContractConfig, RegistryContract};
pub use http::HttpTransport;
pub use rpc::{JsonRpcRequest, JsonRpcResponse, RpcClient, RpcTransport};
