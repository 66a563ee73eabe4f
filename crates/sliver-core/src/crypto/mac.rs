//! HMAC-SHA-256 per RFC 2104.
//!
//! Used to derive a credential's private key from its public id and to bind
//! a signed request to its canonical byte stream.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes HMAC-SHA-256 of a message using the given key.
///
/// # Arguments
/// * `key` - The HMAC key
/// * `message` - The message to authenticate
///
/// # Returns
/// 32-byte MAC output
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    let result = mac.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result.into_bytes());
    output
}

/// Checks `tag` against HMAC-SHA-256(key, message) in constant time.
///
/// Tags of the wrong length never match.
pub fn verify_hmac_sha256(key: &[u8], message: &[u8], tag: &[u8]) -> bool {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.verify_slice(tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RFC 4231 Test Case 2
    #[test]
    fn test_rfc4231_case2() {
        let key = b"Jefe";
        let data = b"what do ya want for nothing?";

        let mac = hmac_sha256(key, data);

        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    /// RFC 4231 Test Case 1
    #[test]
    fn test_rfc4231_case1() {
        let key = [0x0bu8; 20];
        let mac = hmac_sha256(&key, b"Hi There");

        assert_eq!(
            hex::encode(mac),
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
        );
    }

    #[test]
    fn test_verify_accepts_matching_tag() {
        let key = [0x42u8; 32];
        let tag = hmac_sha256(&key, b"message");
        assert!(verify_hmac_sha256(&key, b"message", &tag));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let key = [0x42u8; 32];
        let mut tag = hmac_sha256(&key, b"message");

        assert!(!verify_hmac_sha256(&key, b"messagE", &tag));
        assert!(!verify_hmac_sha256(&[0x43u8; 32], b"message", &tag));
        assert!(!verify_hmac_sha256(&key, b"message", &tag[..31]));

        tag[0] ^= 0x01;
        assert!(!verify_hmac_sha256(&key, b"message", &tag));
    }
}
