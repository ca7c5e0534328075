//! Signed bearer tokens. Expiry, issuer, audience, and algorithm are fixed
//! configuration; revocation happens by deleting the backing session row,
//! so a stolen token stays cryptographically valid until then.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::JwtConfig;
use crate::db::User;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    /// Signature, expiry, issuer, and audience failures all collapse here;
    /// callers must not be able to distinguish them.
    #[error("Invalid or expired token")]
    Invalid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleClaim {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub id: String,
    pub sub: String,
    /// Unique per issuance; two logins in the same second must still yield
    /// distinct tokens, since sessions key on (user id, token).
    pub jti: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub phone_number: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleClaim>,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    issuer: String,
    audience: String,
    expires_days: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expires_days: config.expires_days,
        }
    }

    /// Token lifetime; the session row created at login uses the same span.
    #[must_use]
    pub fn validity(&self) -> Duration {
        Duration::days(self.expires_days)
    }

    /// Signs a token embedding the user's identity and role summaries.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            id: user.id.clone(),
            sub: user.id.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            display_name: user.display_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            phone_number: user.phone_number.clone(),
            roles: user
                .roles
                .iter()
                .map(|role| RoleClaim {
                    id: role.id,
                    name: role.name.clone(),
                    description: role.description.clone(),
                })
                .collect(),
            iat: now.timestamp() as usize,
            exp: (now + self.validity()).timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(TokenError::Sign)
    }

    /// Verifies signature, expiry, issuer, and audience.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| TokenError::Invalid)
    }
}
