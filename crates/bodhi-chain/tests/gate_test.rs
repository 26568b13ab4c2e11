//! Gate decisions with a stubbed balance source and real signatures.
//!
//! Covers the threshold boundary, signer mismatch, and the fail-closed paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bodhi_chain::signature::address_of;
use bodhi_chain::{eip191_hash, Address, BalanceReader, ChainGate, U256};
use bodhi_core::{Error, Result};
use k256::ecdsa::SigningKey;

/// Returns a fixed balance (or an error) and counts calls.
struct StubReader {
    balance: Option<U256>,
    calls: AtomicUsize,
}

impl StubReader {
    fn holding(balance: U256) -> Arc<Self> {
        Arc::new(Self {
            balance: Some(balance),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            balance: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceReader for StubReader {
    async fn balance_of(&self, _owner: &Address, id: U256) -> Result<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(id, U256::from(14020u64));
        self.balance
            .ok_or_else(|| Error::Chain("rpc unavailable".to_string()))
    }
}

struct Wallet {
    key: SigningKey,
}

impl Wallet {
    fn new(seed: u8) -> Self {
        Self {
            key: SigningKey::from_slice(&[seed; 32]).unwrap(),
        }
    }

    fn address(&self) -> String {
        format!("{:#x}", address_of(self.key.verifying_key()))
    }

    fn sign(&self, message: &str) -> String {
        let hash = eip191_hash(message.as_bytes());
        let (sig, recid) = self.key.sign_prehash_recoverable(&hash).unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(recid.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }

    /// 64-byte EIP-2098 form: y-parity folded into the top bit of `s`.
    fn sign_compact(&self, message: &str) -> String {
        let hash = eip191_hash(message.as_bytes());
        let (sig, recid) = self.key.sign_prehash_recoverable(&hash).unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        if recid.is_y_odd() {
            bytes[32] |= 0x80;
        }
        format!("0x{}", hex::encode(bytes))
    }
}

fn min_hold() -> U256 {
    U256::exp10(15)
}

#[tokio::test]
async fn test_holder_at_threshold_passes() {
    let reader = StubReader::holding(min_hold());
    let gate = ChainGate::bodhi(reader.clone());
    let wallet = Wallet::new(11);
    let msg = "Sign in to Bodhi";

    assert!(gate.authenticate(&wallet.address(), msg, &wallet.sign(msg)).await);
    assert_eq!(reader.calls(), 1);
}

#[tokio::test]
async fn test_holder_above_threshold_passes() {
    let gate = ChainGate::bodhi(StubReader::holding(U256::exp10(18) * U256::from(3u64)));
    let wallet = Wallet::new(12);
    assert!(gate.authenticate(&wallet.address(), "m", &wallet.sign("m")).await);
}

#[tokio::test]
async fn test_holder_below_threshold_fails() {
    let gate = ChainGate::bodhi(StubReader::holding(min_hold() - U256::one()));
    let wallet = Wallet::new(13);
    assert!(!gate.authenticate(&wallet.address(), "m", &wallet.sign("m")).await);
}

#[tokio::test]
async fn test_zero_balance_fails() {
    let gate = ChainGate::bodhi(StubReader::holding(U256::zero()));
    let wallet = Wallet::new(14);
    assert!(!gate.authenticate(&wallet.address(), "m", &wallet.sign("m")).await);
}

#[tokio::test]
async fn test_signer_mismatch_fails_without_balance_lookup() {
    let reader = StubReader::holding(U256::MAX);
    let gate = ChainGate::bodhi(reader.clone());
    let signer = Wallet::new(15);
    let claimed = Wallet::new(16);

    assert!(!gate.authenticate(&claimed.address(), "m", &signer.sign("m")).await);
    assert_eq!(reader.calls(), 0);
}

#[tokio::test]
async fn test_uppercase_claimed_address_is_accepted() {
    let gate = ChainGate::bodhi(StubReader::holding(min_hold()));
    let wallet = Wallet::new(17);
    let upper = format!("0x{}", wallet.address()[2..].to_uppercase());
    assert!(gate.authenticate(&upper, "m", &wallet.sign("m")).await);
}

#[tokio::test]
async fn test_malformed_signature_fails() {
    let reader = StubReader::holding(U256::MAX);
    let gate = ChainGate::bodhi(reader.clone());
    let wallet = Wallet::new(18);

    assert!(!gate.authenticate(&wallet.address(), "m", "0xdeadbeef").await);
    assert!(!gate.authenticate(&wallet.address(), "m", "not-a-signature").await);
    assert_eq!(reader.calls(), 0);
}

#[tokio::test]
async fn test_rpc_failure_fails_closed() {
    let reader = StubReader::failing();
    let gate = ChainGate::bodhi(reader.clone());
    let wallet = Wallet::new(19);

    assert!(!gate.authenticate(&wallet.address(), "m", &wallet.sign("m")).await);
    assert_eq!(reader.calls(), 1);
}

#[tokio::test]
async fn test_compact_signature_passes() {
    let reader = StubReader::holding(min_hold());
    let gate = ChainGate::bodhi(reader.clone());
    for seed in 20..26u8 {
        let wallet = Wallet::new(seed);
        let sig = wallet.sign_compact("hello");
        assert!(gate.authenticate(&wallet.address(), "hello", &sig).await);
    }
    assert_eq!(reader.calls(), 6);
}

#[tokio::test]
async fn test_address_without_prefix_fails() {
    let reader = StubReader::holding(U256::MAX);
    let gate = ChainGate::bodhi(reader.clone());
    let wallet = Wallet::new(27);
    let bare = wallet.address()[2..].to_string();

    assert!(!gate.authenticate(&bare, "m", &wallet.sign("m")).await);
    assert_eq!(reader.calls(), 0);
}
