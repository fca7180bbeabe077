//! JWT access-token issuing and validation.
//!
//! [`TokenCodec`] is purely computational: it holds the signing keys and TTL
//! and never consults external state. Both directions take an explicit
//! `now` variant so expiry behaviour can be tested without sleeping.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors returned by [`TokenCodec`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Key material for the configured algorithm.
///
/// HMAC algorithms take a shared secret; RSA, ECDSA and EdDSA take a PEM
/// encoded private key (signing) and public key (verification).
pub enum SigningKey {
    Secret(Vec<u8>),
    Pem {
        private_pem: Vec<u8>,
        public_pem: Vec<u8>,
    },
}

/// Identity embedded into a freshly issued token.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub user_id: Uuid,
    pub email: &'a str,
    pub role: u8,
}

/// JWT claims payload.
///
/// | Field | JWT claim | Meaning |
/// |-------|-----------|---------|
/// | `sub` | `sub` | user ID (UUID string) |
/// | `email` | custom | account email at issue time |
/// | `role` | custom | `u8` wire value of the user role |
/// | `iat` | `iat` | issued-at, seconds since epoch |
/// | `exp` | `exp` | expiry, seconds since epoch |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub email: String,
    pub role: u8,
    pub iat: u64,
    pub exp: u64,
}

/// User identity extracted from a validated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub user_id: Uuid,
    pub email: String,
    pub role: u8,
    pub issued_at: u64,
    pub expires_at: u64,
}

/// A signed token together with its expiry (seconds since epoch).
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

/// Parse an algorithm name such as `"HS256"` or `"EdDSA"`.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, TokenError> {
    Algorithm::from_str(name).map_err(|_| TokenError::InvalidKey(format!("unknown algorithm {name}")))
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec for `algorithm`. Fails if the key type does not belong
    /// to the algorithm family or the PEM data cannot be parsed.
    pub fn new(algorithm: Algorithm, key: SigningKey, ttl_secs: u64) -> Result<Self, TokenError> {
        let invalid = |e: jsonwebtoken::errors::Error| TokenError::InvalidKey(e.to_string());
        let (encoding_key, decoding_key) = match (algorithm, &key) {
            (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512, SigningKey::Secret(secret)) => {
                if secret.is_empty() {
                    return Err(TokenError::InvalidKey("empty secret".to_owned()));
                }
                (
                    EncodingKey::from_secret(secret),
                    DecodingKey::from_secret(secret),
                )
            }
            (
                Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512,
                SigningKey::Pem {
                    private_pem,
                    public_pem,
                },
            ) => (
                EncodingKey::from_rsa_pem(private_pem).map_err(invalid)?,
                DecodingKey::from_rsa_pem(public_pem).map_err(invalid)?,
            ),
            (
                Algorithm::ES256 | Algorithm::ES384,
                SigningKey::Pem {
                    private_pem,
                    public_pem,
                },
            ) => (
                EncodingKey::from_ec_pem(private_pem).map_err(invalid)?,
                DecodingKey::from_ec_pem(public_pem).map_err(invalid)?,
            ),
            (
                Algorithm::EdDSA,
                SigningKey::Pem {
                    private_pem,
                    public_pem,
                },
            ) => (
                EncodingKey::from_ed_pem(private_pem).map_err(invalid)?,
                DecodingKey::from_ed_pem(public_pem).map_err(invalid)?,
            ),
            _ => {
                return Err(TokenError::InvalidKey(format!(
                    "key type does not match algorithm {algorithm:?}"
                )));
            }
        };

        Ok(Self {
            algorithm,
            encoding_key,
            decoding_key,
            ttl_secs,
        })
    }

    /// HS256 codec over a shared secret.
    pub fn hmac(secret: &[u8], ttl_secs: u64) -> Result<Self, TokenError> {
        Self::new(Algorithm::HS256, SigningKey::Secret(secret.to_vec()), ttl_secs)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn issue(&self, subject: &TokenSubject<'_>) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, now_secs())
    }

    pub fn issue_at(&self, subject: &TokenSubject<'_>, now: u64) -> Result<IssuedToken, TokenError> {
        let exp = now
            .checked_add(self.ttl_secs)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_owned()))?;
        let claims = JwtClaims {
            sub: subject.user_id.to_string(),
            email: subject.email.to_owned(),
            role: subject.role,
            iat: now,
            exp,
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    pub fn validate(&self, token: &str) -> Result<TokenInfo, TokenError> {
        self.validate_at(token, now_secs())
    }

    /// Validate signature and structure, then reject if `now` is strictly
    /// after the embedded `exp`. No leeway is applied.
    pub fn validate_at(&self, token: &str, now: u64) -> Result<TokenInfo, TokenError> {
        let claims = self.decode_claims(token)?;
        if now > claims.exp {
            return Err(TokenError::Expired);
        }
        let user_id = claims
            .sub
            .parse::<Uuid>()
            .map_err(|_| TokenError::Malformed)?;
        Ok(TokenInfo {
            user_id,
            email: claims.email,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    fn decode_claims(&self, token: &str) -> Result<JwtClaims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is compared against the caller's clock in `validate_at`.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidEcdsaKey
                | ErrorKind::InvalidRsaKey(_) => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        Ok(data.claims)
    }
}
