//! Share-balance access gate.

use std::sync::Arc;

use async_trait::async_trait;
use ethereum_types::{H160, U256};
use tracing::{debug, warn};

use bodhi_core::defaults::{GATE_ASSET_ID, GATE_MIN_HOLD_BASE_UNITS};
use bodhi_core::Result;

use crate::signature::verify_signer;

/// Source of ERC-1155 style share balances.
#[async_trait]
pub trait BalanceReader: Send + Sync {
    /// Balance of `owner` for token `id`, in base units.
    async fn balance_of(&self, owner: &H160, id: U256) -> Result<U256>;
}

/// Grants access to holders of at least `min_hold` shares of `asset_id`.
#[derive(Clone)]
pub struct ChainGate {
    reader: Arc<dyn BalanceReader>,
    asset_id: U256,
    min_hold: U256,
}

impl ChainGate {
    pub fn new(reader: Arc<dyn BalanceReader>, asset_id: U256, min_hold: U256) -> Self {
        Self {
            reader,
            asset_id,
            min_hold,
        }
    }

    /// Gate on the fixed Bodhi asset with a 0.001 share minimum.
    pub fn bodhi(reader: Arc<dyn BalanceReader>) -> Self {
        Self::new(
            reader,
            U256::from(GATE_ASSET_ID),
            U256::from(GATE_MIN_HOLD_BASE_UNITS),
        )
    }

    pub fn asset_id(&self) -> U256 {
        self.asset_id
    }

    pub fn min_hold(&self) -> U256 {
        self.min_hold
    }

    /// Returns true only when `signature` is `address`'s EIP-191 signature
    /// over `message` and the address holds at least the minimum.
    ///
    /// Fails closed: any parse, recovery, or RPC error yields false.
    pub async fn authenticate(&self, address: &str, message: &str, signature: &str) -> bool {
        let owner = match verify_signer(address, message, signature) {
            Ok(owner) => owner,
            Err(e) => {
                debug!(
                    subsystem = "chain",
                    component = "gate",
                    op = "authenticate",
                    address = %address,
                    error = %e,
                    "Signature check failed"
                );
                return false;
            }
        };

        let balance = match self.reader.balance_of(&owner, self.asset_id).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(
                    subsystem = "chain",
                    component = "gate",
                    op = "authenticate",
                    address = %address,
                    asset_id = %self.asset_id,
                    error = %e,
                    "Balance lookup failed"
                );
                return false;
            }
        };

        let pass = balance >= self.min_hold;
        debug!(
            subsystem = "chain",
            component = "gate",
            op = "authenticate",
            address = %address,
            asset_id = %self.asset_id,
            balance = %balance,
            success = pass,
            "Gate decision"
        );
        pass
    }
}
