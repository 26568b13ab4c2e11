//! Minimal ABI encoding for the one contract call the gate makes.

use ethereum_types::{H160, U256};
use sha3::{Digest, Keccak256};

use bodhi_core::{Error, Result};

/// Canonical signature of the ERC-1155 balance query.
pub const BALANCE_OF_SIGNATURE: &str = "balanceOf(address,uint256)";

/// First four bytes of the Keccak-256 of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Calldata for `balanceOf(owner, id)` as a `0x`-prefixed hex string.
pub fn encode_balance_of(owner: &H160, id: U256) -> String {
    let mut data = Vec::with_capacity(4 + 32 + 32);
    data.extend_from_slice(&selector(BALANCE_OF_SIGNATURE));

    // address: left-padded to a 32-byte word
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(owner.as_bytes());

    let mut word = [0u8; 32];
    id.to_big_endian(&mut word);
    data.extend_from_slice(&word);

    format!("0x{}", hex::encode(data))
}

/// Decode a single `uint256` return value.
///
/// An empty result (`0x`) means the call hit an address without code and is
/// treated as an error rather than a zero balance.
pub fn decode_uint256(result: &str) -> Result<U256> {
    let digits = result.trim().trim_start_matches("0x");
    if digits.is_empty() {
        return Err(Error::Chain("empty eth_call result".to_string()));
    }
    let bytes =
        hex::decode(digits).map_err(|e| Error::Chain(format!("invalid eth_call result: {}", e)))?;
    if bytes.len() > 32 {
        return Ok(U256::from_big_endian(&bytes[..32]));
    }
    Ok(U256::from_big_endian(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_of_selector() {
        assert_eq!(hex::encode(selector(BALANCE_OF_SIGNATURE)), "00fdd58e");
    }

    #[test]
    fn test_encode_balance_of_layout() {
        let owner = H160::from_low_u64_be(0xabcdef);
        let data = encode_balance_of(&owner, U256::from(14020u64));
        assert_eq!(data.len(), 2 + 2 * (4 + 64));
        assert!(data.starts_with("0x00fdd58e"));
        // owner word
        assert!(data[10..74].ends_with("abcdef"));
        assert!(data[10..74].starts_with(&"0".repeat(24)));
        // id word: 14020 = 0x36c4
        assert!(data[74..].ends_with("36c4"));
        assert_eq!(data[74..].trim_start_matches('0'), "36c4");
    }

    #[test]
    fn test_decode_uint256() {
        let word = format!("0x{:0>64}", "038d7ea4c68000");
        assert_eq!(decode_uint256(&word).unwrap(), U256::exp10(15));
        assert_eq!(decode_uint256(&format!("0x{}", "0".repeat(64))).unwrap(), U256::zero());
        assert!(decode_uint256("0x").is_err());
        assert!(decode_uint256("0xzz").is_err());
    }
}
