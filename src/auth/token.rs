use crate::error::AppError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the username of the authenticated user.
    pub sub: String,
    /// Timestamp (seconds since epoch) at which the token was issued.
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: usize,
}

/// Issues and validates signed, time-bounded identity tokens.
///
/// Tokens are stateless: validity is a pure function of the signature, the
/// expiry claim and the subject. There is no server-side session store and no
/// revocation list, so logout is client-local only.
///
/// The service is constructed once at process start from the configured
/// secret and lifetime, and shared immutably across requests.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime_secs: i64,
}

impl TokenService {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Issues a token whose subject is `username`, issued now and expiring
    /// after the configured lifetime.
    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        let now = chrono::Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::seconds(self.lifetime_secs))
            .expect("valid timestamp");

        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Verifies the signature and decodes the subject claim without checking
    /// expiry. Used to answer "who is this token for" before the identity
    /// lookup; expiry is checked later by [`TokenService::validate`].
    pub fn extract_subject(&self, token: &str) -> Result<String, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }

    /// Returns true only if the token's signature verifies, the subject claim
    /// equals `username`, and the current time is before the expiry claim.
    /// Any parse or signature failure is treated as invalid, not as an error.
    pub fn validate(&self, token: &str, username: &str) -> bool {
        // Expiry is a hard boundary: no clock-skew leeway.
        let mut validation = Validation::default();
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims.sub == username,
            Err(_) => false,
        }
    }
}
