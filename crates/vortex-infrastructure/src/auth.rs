//! JWT token service (HS256 bearer tokens).

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use vortex_domain::constants::auth::ACCESS_TOKEN_EXPIRE_MINUTES;
use vortex_domain::entities::Role;
use vortex_domain::error::{Error, Result};
use vortex_domain::value_objects::{AuthMethod, UserContext};

/// Bearer token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Role string
    pub role: String,
    /// Stable user identifier
    pub user_id: String,
    /// Team attribute for ABAC, when assigned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Expiry (epoch seconds)
    pub exp: i64,
}

/// Issues and validates HS256 bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    /// Service signing with `secret`.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for an authenticated user.
    ///
    /// # Errors
    /// Returns an error when signing fails.
    pub fn issue(&self, username: &str, role: Role, team: Option<String>) -> Result<String> {
        let exp = chrono::Utc::now()
            + chrono::Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES);
        let claims = Claims {
            sub: username.to_owned(),
            role: role.as_str().to_owned(),
            user_id: username.to_owned(),
            team,
            exp: exp.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| Error::internal(format!("token signing failed: {e}")))
    }

    /// Validate a token and build the caller's security context.
    ///
    /// # Errors
    /// `UNAUTHORIZED` for expired, malformed, or mis-signed tokens.
    pub fn validate(&self, token: &str) -> Result<UserContext> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| Error::unauthorized(format!("invalid token: {e}")))?;

        let role: Role = data
            .claims
            .role
            .parse()
            .map_err(|_| Error::unauthorized(format!("unknown role '{}'", data.claims.role)))?;

        Ok(UserContext {
            user_id: data.claims.user_id,
            role,
            team: data.claims.team,
            is_contractor: false,
            emergency_access: false,
            auth: AuthMethod::Bearer,
        })
    }
}
