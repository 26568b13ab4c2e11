//! # bodhi-chain
//!
//! Wallet-based access gate for the Bodhi interactor API.
//!
//! A caller proves control of an address by signing a message with
//! `personal_sign` (EIP-191). The gate recovers the signer, and if it matches
//! the claimed address, reads the address's share balance of a fixed Bodhi
//! asset over JSON-RPC and compares it with a minimum hold.
//!
//! ```text
//! (addr, msg, sig) ──▶ recover signer ──▶ eth_call balanceOf ──▶ balance >= min
//! ```
//!
//! Every failure (bad hex, wrong length, recovery error, RPC error) yields
//! `false`; nothing is propagated to the caller.

pub mod abi;
pub mod gate;
pub mod rpc;
pub mod signature;

pub use ethereum_types::{H160 as Address, U256};
pub use gate::{BalanceReader, ChainGate};
pub use rpc::JsonRpcBalanceReader;
pub use signature::{eip191_hash, parse_address, recover_address, verify_signer};
