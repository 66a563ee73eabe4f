//! Secure randomness for credential ids and request nonces.
//!
//! Draws from the operating system generator. A failing source is reported
//! to the caller; there is no fallback generator.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// The operating system entropy source could not be read.
#[derive(Debug, Error)]
#[error("Entropy source failure: {0}")]
pub struct EntropyError(String);

/// Returns `len` bytes from the operating system generator.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, EntropyError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| EntropyError(e.to_string()))?;
    Ok(bytes)
}

/// Returns a fixed-size array from the operating system generator.
pub fn random_array<const N: usize>() -> Result<[u8; N], EntropyError> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| EntropyError(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_length() {
        assert_eq!(random_bytes(0).unwrap().len(), 0);
        assert_eq!(random_bytes(16).unwrap().len(), 16);
    }

    #[test]
    fn test_random_values_differ() {
        let a: [u8; 32] = random_array().unwrap();
        let b: [u8; 32] = random_array().unwrap();
        assert_ne!(a, b);
    }
}
