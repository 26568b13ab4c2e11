//! EIP-191 personal-message signature recovery.

use ethereum_types::H160;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

use bodhi_core::{Error, Result};

/// Hash a message the way `personal_sign` does:
/// `keccak256("\x19Ethereum Signed Message:\n" ++ len(message) ++ message)`.
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()).as_bytes());
    hasher.update(message);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| Error::Chain(format!("invalid hex: {}", e)))
}

/// Parse a `0x`-prefixed 20-byte hex address (any case). Bare hex is refused
/// so that only what a lowercase string compare would accept passes.
pub fn parse_address(input: &str) -> Result<H160> {
    let trimmed = input.trim();
    if !(trimmed.starts_with("0x") || trimmed.starts_with("0X")) {
        return Err(Error::Chain("address must start with 0x".to_string()));
    }
    let bytes = decode_hex(trimmed)?;
    if bytes.len() != 20 {
        return Err(Error::Chain(format!(
            "address must be 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(H160::from_slice(&bytes))
}

/// Split a signature into its ECDSA part and recovery id.
///
/// Accepts 65-byte `r || s || v` with `v` in 0/1 or 27/28, and 64-byte
/// EIP-2098 compact `r || yParityAndS` where the top bit of `s` carries the
/// parity. High-s signatures are normalized (and the recovery parity
/// flipped) so malleated forms recover the same key.
fn parse_signature(input: &str) -> Result<(Signature, RecoveryId)> {
    let mut bytes = decode_hex(input)?;
    let v = match bytes.len() {
        65 => match bytes[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            other => return Err(Error::Chain(format!("invalid recovery byte: {}", other))),
        },
        64 => {
            let parity = bytes[32] >> 7;
            bytes[32] &= 0x7f;
            parity
        }
        other => {
            return Err(Error::Chain(format!(
                "signature must be 64 or 65 bytes, got {}",
                other
            )))
        }
    };
    let mut recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| Error::Chain(format!("invalid recovery id: {}", v)))?;

    let mut signature = Signature::from_slice(&bytes[..64])
        .map_err(|e| Error::Chain(format!("invalid signature: {}", e)))?;
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }
    Ok((signature, recovery_id))
}

/// Ethereum address of a public key: last 20 bytes of the Keccak-256 of the
/// uncompressed point without its `0x04` prefix.
pub fn address_of(key: &VerifyingKey) -> H160 {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    H160::from_slice(&hash[12..])
}

/// Recover the address that signed `message` with `personal_sign`.
pub fn recover_address(message: &str, signature: &str) -> Result<H160> {
    let (sig, recovery_id) = parse_signature(signature)?;
    let hash = eip191_hash(message.as_bytes());
    let key = VerifyingKey::recover_from_prehash(&hash, &sig, recovery_id)
        .map_err(|e| Error::Chain(format!("signature recovery failed: {}", e)))?;
    Ok(address_of(&key))
}

/// Recover the signer and require it to equal `claimed` (case-insensitive).
///
/// Returns the parsed address on success.
pub fn verify_signer(claimed: &str, message: &str, signature: &str) -> Result<H160> {
    let claimed_addr = parse_address(claimed)?;
    let recovered = recover_address(message, signature)?;
    if recovered != claimed_addr {
        return Err(Error::Forbidden(format!(
            "signer {:#x} does not match claimed address",
            recovered
        )));
    }
    Ok(claimed_addr)
}
