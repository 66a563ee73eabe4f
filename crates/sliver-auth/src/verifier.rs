//! Request verification.
//!
//! Checks, in order: token shape, clock skew, signature, replay. The
//! signature is checked before the replay detector sees the token, so a
//! forged token cannot burn a nonce. Every failure is returned as the same
//! [`AuthError::Unauthorized`].

use sliver_core::{verify_hmac_sha256, ClockSkewValidator, UnixTime};
use sliver_proto::{AuthorizationToken, RequestView};
use tracing::debug;

use crate::authority::CredentialAuthority;
use crate::factory::canonical_stream;
use crate::replay::ReplayDetector;
use crate::AuthError;

/// Identity established by a verified request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Public id of the signing credential
    pub public_id: Vec<u8>,
}

/// Verifies signed requests for one server secret.
pub struct RequestVerifier {
    authority: CredentialAuthority,
    clock: ClockSkewValidator,
    replay: ReplayDetector<(Vec<u8>, Vec<u8>)>,
}

impl RequestVerifier {
    /// Creates a verifier accepting tokens within `max_skew_secs` of now.
    pub fn new(authority: CredentialAuthority, max_skew_secs: i64) -> Self {
        Self {
            authority,
            clock: ClockSkewValidator::with_max_skew(max_skew_secs),
            replay: ReplayDetector::new(),
        }
    }

    /// The authority whose credentials are accepted.
    pub fn authority(&self) -> &CredentialAuthority {
        &self.authority
    }

    /// Verifies `request` against its authorization header value.
    pub fn verify_header<R: RequestView + ?Sized>(
        &self,
        request: &R,
        header: Option<&str>,
    ) -> Result<Verified, AuthError> {
        self.verify_header_at(request, header, UnixTime::now())
    }

    /// Same as [`verify_header`](Self::verify_header) with an explicit clock.
    pub fn verify_header_at<R: RequestView + ?Sized>(
        &self,
        request: &R,
        header: Option<&str>,
        now: UnixTime,
    ) -> Result<Verified, AuthError> {
        let Some(header) = header else {
            debug!("Missing authorization header");
            return Err(AuthError::Unauthorized);
        };
        let token = AuthorizationToken::parse(header).map_err(|e| {
            debug!(error = %e, "Malformed authorization token");
            AuthError::Unauthorized
        })?;
        self.verify_at(request, &token, now)
    }

    /// Verifies `request` against `token` at the current time.
    pub fn verify<R: RequestView + ?Sized>(
        &self,
        request: &R,
        token: &AuthorizationToken,
    ) -> Result<Verified, AuthError> {
        self.verify_at(request, token, UnixTime::now())
    }

    /// Verifies `request` against `token` as of `now`.
    pub fn verify_at<R: RequestView + ?Sized>(
        &self,
        request: &R,
        token: &AuthorizationToken,
        now: UnixTime,
    ) -> Result<Verified, AuthError> {
        // Tokens older than the skew window are rejected by the clock check,
        // so their replay entries can go.
        self.replay
            .clean(self.clock.oldest_accepted(now).as_secs().saturating_sub(1));

        if let Err(e) = self.clock.validate_at(token.unix_time, now) {
            debug!(error = %e, "Token outside clock skew window");
            return Err(AuthError::Unauthorized);
        }

        let private = self.authority.derive_private(&token.id);
        let stream = canonical_stream(request, &token.id, &token.nonce, token.unix_time);
        if !verify_hmac_sha256(&private, &stream, &token.hmac) {
            debug!(
                method = request.method(),
                path = request.path_and_query(),
                "Token signature mismatch"
            );
            return Err(AuthError::Unauthorized);
        }

        if !self
            .replay
            .try_add((token.id.clone(), token.nonce.clone()), token.unix_time.as_secs())
        {
            debug!(unix_time = token.unix_time.as_secs(), "Replayed token");
            return Err(AuthError::Unauthorized);
        }

        Ok(Verified {
            public_id: token.id.clone(),
        })
    }

    /// Replay entries currently retained.
    pub fn retained_nonces(&self) -> usize {
        self.replay.len()
    }
}
