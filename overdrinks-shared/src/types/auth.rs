use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by the session token. The identity provider issues tokens
/// with the user's id in `sub` plus the basic profile fields it knows about;
/// token issuance itself lives outside this backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            email: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
            iat: now,
            exp: now + duration_secs,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// The authenticated caller, extracted from the bearer token on every
/// `/api/*` route.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            profile_image_url: claims.profile_image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_claims_are_not_expired() {
        let claims = Claims::new(Uuid::new_v4(), 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn past_expiry_is_detected() {
        let mut claims = Claims::new(Uuid::new_v4(), 3600);
        claims.exp = Utc::now().timestamp() - 10;
        assert!(claims.is_expired());
    }
}
