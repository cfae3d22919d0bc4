use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

/// Token claims as issued by the session provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub role: String,
    /// Email-verification flag
    pub verified: bool,
    /// Expiration time as UTC timestamp
    pub exp: usize,
}

/// The authenticated caller, extracted from a `Authorization: Bearer` token.
///
/// Token issuance and password verification live in the external session
/// provider; this service only validates the signature and reads the claims.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
    pub verified: bool,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin-only routes reject non-admin callers with 401, matching the
    /// public API contract.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

fn session_from_request(req: &HttpRequest) -> Result<Session, AppError> {
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| AppError::Internal("AppConfig not registered".to_string()))?;

    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::Unauthorized)?;
    let role = match data.claims.role.as_str() {
        "admin" => Role::Admin,
        "customer" => Role::Customer,
        _ => return Err(AppError::Unauthorized),
    };

    Ok(Session {
        user_id,
        role,
        verified: data.claims.verified,
    })
}

impl FromRequest for Session {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(session_from_request(req))
    }
}

#[cfg(test)]
pub mod test_tokens {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    /// Mint a token the way the session provider would. Test helper only.
    pub fn issue(secret: &str, user_id: Uuid, role: Role) -> String {
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            verified: true,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("token encoding failed")
    }
}
