//! Request signing.
//!
//! The signature covers one canonical byte stream built from the request
//! and the signing parameters, concatenated in this order:
//!
//! 1. credential public id
//! 2. `unix_time` as 8-byte little-endian `i64`
//! 3. nonce
//! 4. host
//! 5. method
//! 6. path and query
//! 7. content type as UTF-8, or nothing if absent
//! 8. body, or nothing if absent
//!
//! The signer and the verifier both build the stream with
//! [`canonical_stream`], so a token only verifies against the exact request
//! it was created for.

use sliver_core::{hmac_sha256, random_bytes, UnixTime};
use sliver_proto::{AuthorizationToken, Credential, Request, RequestView};

use crate::AuthError;

/// Default nonce length in bytes.
pub const DEFAULT_NONCE_LENGTH: usize = 16;

/// Builds the canonical byte stream signed for `request`.
pub fn canonical_stream<R: RequestView + ?Sized>(
    request: &R,
    public_id: &[u8],
    nonce: &[u8],
    unix_time: UnixTime,
) -> Vec<u8> {
    let content_type = request.content_type().unwrap_or_default();
    let body = request.body().unwrap_or_default();

    let mut stream = Vec::with_capacity(
        public_id.len()
            + 8
            + nonce.len()
            + request.host().len()
            + request.method().len()
            + request.path_and_query().len()
            + content_type.len()
            + body.len(),
    );
    stream.extend_from_slice(public_id);
    stream.extend_from_slice(&unix_time.as_secs().to_le_bytes());
    stream.extend_from_slice(nonce);
    stream.extend_from_slice(request.host().as_bytes());
    stream.extend_from_slice(request.method().as_bytes());
    stream.extend_from_slice(request.path_and_query().as_bytes());
    stream.extend_from_slice(content_type.as_bytes());
    stream.extend_from_slice(body);
    stream
}

/// Signs `request` with `credential`, binding `nonce` and `unix_time`.
pub fn create_token_for<R: RequestView + ?Sized>(
    request: &R,
    credential: &Credential,
    nonce: &[u8],
    unix_time: UnixTime,
) -> AuthorizationToken {
    let stream = canonical_stream(request, &credential.public, nonce, unix_time);
    let hmac = hmac_sha256(&credential.private, &stream);
    AuthorizationToken::new(
        credential.public.clone(),
        hmac.to_vec(),
        nonce.to_vec(),
        unix_time,
    )
}

/// Draws a fresh nonce from the secure random source.
pub fn new_nonce(len: usize) -> Result<Vec<u8>, AuthError> {
    Ok(random_bytes(len)?)
}

/// Signs `request` with a fresh nonce at the current time and sets its
/// authorization header. Returns the token.
pub fn sign_request(
    request: &mut Request,
    credential: &Credential,
    nonce_length: usize,
) -> Result<AuthorizationToken, AuthError> {
    let nonce = new_nonce(nonce_length)?;
    let token = create_token_for(&*request, credential, &nonce, UnixTime::now());
    request.authorization = Some(token.to_header_value());
    Ok(token)
}
