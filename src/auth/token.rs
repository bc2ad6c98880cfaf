// JWT token issuance and verification service

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::context::AuthContext;
use crate::auth::error::AuthError;

/// Lifetime of every issued token, in seconds
pub const TOKEN_TTL_SECONDS: i64 = 3600;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub iat: i64,    // issued at timestamp
    pub exp: i64,    // expiration timestamp
}

/// Why a token was not accepted; only ever logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Malformed,
    Expired,
}

/// Token service for JWT operations
///
/// Holds the process-wide signing secret. Tokens are stateless: nothing is
/// stored server-side and a token stops working only when it expires.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a new TokenService with secret key
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by hand against the caller's clock with no leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a token for an account, valid for one hour from now
    pub fn issue(&self, account_id: Uuid) -> Result<String, AuthError> {
        self.issue_at(account_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, account_id: Uuid, now: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            iat,
            exp: iat + TOKEN_TTL_SECONDS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Dependency(format!("token signing failed: {}", e)))
    }

    /// Decode and check a token against the instant `now`
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenRejection> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                TokenRejection::Malformed
            })?;

        if now.timestamp() > claims.exp {
            return Err(TokenRejection::Expired);
        }

        Ok(claims)
    }

    /// Verify a token and build the authorization context for a request
    pub fn verify(&self, token: &str) -> AuthContext {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`
    ///
    /// Never fails: any problem with the token yields an anonymous context.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> AuthContext {
        let claims = match self.decode_at(token, now) {
            Ok(claims) => claims,
            Err(rejection) => {
                debug!("Treating request as anonymous: {:?} token", rejection);
                return AuthContext::Anonymous;
            }
        };

        match Uuid::parse_str(&claims.sub) {
            Ok(account_id) => AuthContext::Authenticated { account_id },
            Err(_) => {
                debug!("Treating request as anonymous: subject is not an account id");
                AuthContext::Anonymous
            }
        }
    }
}
