//! Session issuance: minting bearer tokens for authenticated identities.
//!
//! Gatehouse only mints tokens. Expiry enforcement and revocation belong to
//! whatever validates tokens downstream; [`JwtIssuer::validate`] is there so
//! that a validator in the same process can share the issuer's key.

use std::fmt;
use std::future::Future;

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use gatehouse_protocol::Username;

use crate::IssueError;

/// Mints an unforgeable opaque token bound to a username.
///
/// Issuance may suspend (e.g. a remote signing service), so the method
/// returns a `Send` future. Implementations written as `async fn` satisfy
/// this automatically.
pub trait SessionIssuer: Send + Sync + 'static {
    /// Issues a fresh token for `username`.
    fn issue_token(
        &self,
        username: &Username,
    ) -> impl Future<Output = Result<String, IssueError>> + Send;
}

// ---------------------------------------------------------------------------
// IssuerConfig
// ---------------------------------------------------------------------------

/// Settings for [`JwtIssuer`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerConfig {
    /// HMAC secret used to sign tokens. Must not be empty.
    pub secret: String,
    /// Value of the `iss` claim.
    pub issuer: String,
    /// Token lifetime in seconds.
    pub ttl_secs: u64,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "gatehouse".to_string(),
            ttl_secs: 24 * 60 * 60,
        }
    }
}

impl fmt::Debug for IssuerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Claims carried by tokens from [`JwtIssuer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the username.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued at (Unix seconds).
    pub iat: i64,
    /// Expiry (Unix seconds).
    pub exp: i64,
    /// Random token id; two tokens issued in the same second still differ.
    pub jti: String,
}

// ---------------------------------------------------------------------------
// JwtIssuer
// ---------------------------------------------------------------------------

/// [`SessionIssuer`] producing HS256-signed JSON Web Tokens.
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: TimeDelta,
}

impl JwtIssuer {
    /// Builds an issuer from its config.
    ///
    /// # Errors
    /// - [`IssueError::MissingSecret`] — `config.secret` is empty
    /// - [`IssueError::InvalidTtl`] — `config.ttl_secs` is out of range
    pub fn new(config: &IssuerConfig) -> Result<Self, IssueError> {
        if config.secret.is_empty() {
            return Err(IssueError::MissingSecret);
        }
        let ttl = i64::try_from(config.ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or(IssueError::InvalidTtl(config.ttl_secs))?;
        tracing::debug!(issuer = %config.issuer, ttl_secs = config.ttl_secs, "jwt issuer configured");

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            ttl,
        })
    }

    /// Signs a token for `username`, valid from now for the configured TTL.
    pub fn mint(&self, username: &Username) -> Result<String, IssueError> {
        let now = Utc::now();
        let expires = now.checked_add_signed(self.ttl).ok_or(
            IssueError::InvalidTtl(self.ttl.num_seconds().unsigned_abs()),
        )?;
        let claims = Claims {
            sub: username.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            jti: random_hex(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(IssueError::Signing)
    }

    /// Checks signature, issuer and expiry, returning the claims.
    ///
    /// # Errors
    /// Returns [`IssueError::Rejected`] for any token this issuer would not
    /// have produced, or one that has expired.
    pub fn validate(&self, token: &str) -> Result<Claims, IssueError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(IssueError::Rejected)
    }
}

impl fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("issuer", &self.issuer)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl SessionIssuer for JwtIssuer {
    async fn issue_token(
        &self,
        username: &Username,
    ) -> Result<String, IssueError> {
        self.mint(username)
    }
}

// ---------------------------------------------------------------------------
// OpaqueTokenIssuer
// ---------------------------------------------------------------------------

/// [`SessionIssuer`] producing random 128-bit hex strings.
///
/// The token carries no claims; it is unforgeable only because it is
/// unguessable. Useful when a separate service records which token belongs
/// to whom, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueTokenIssuer;

impl SessionIssuer for OpaqueTokenIssuer {
    async fn issue_token(
        &self,
        _username: &Username,
    ) -> Result<String, IssueError> {
        Ok(random_hex())
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn random_hex() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
