use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::auth::dto::Claims;
use crate::config::SessionConfig;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "eduleaner_session";

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub cookie_secure: bool,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            cookie_secure,
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_minutes.max(1) as u64) * 60),
            cookie_secure,
        }
    }
}

impl SessionKeys {
    pub fn sign(&self, user_id: i64) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "session token signed");
        Ok(token)
    }

    /// Verify signature, expiry, issuer and audience; return the user id.
    pub fn verify(&self, token: &str) -> anyhow::Result<i64> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        let user_id = data.claims.sub.parse::<i64>()?;
        debug!(user_id, "session token verified");
        Ok(user_id)
    }

    pub fn max_age_secs(&self) -> i64 {
        self.ttl.as_secs() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_with(issuer: &str, audience: &str) -> SessionKeys {
        SessionKeys {
            encoding: EncodingKey::from_secret(b"same-secret"),
            decoding: DecodingKey::from_secret(b"same-secret"),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl: Duration::from_secs(300),
            cookie_secure: false,
        }
    }

    #[test]
    fn sign_and_verify_session_token() {
        let keys = keys_with("test-issuer", "test-aud");
        let token = keys.sign(42).expect("sign");
        assert_eq!(keys.verify(&token).expect("verify"), 42);
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = keys_with("good-iss", "good-aud");
        let bad = keys_with("bad-iss", "bad-aud");
        let token = good.sign(7).expect("sign");
        assert!(bad.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = keys_with("iss", "aud");
        let mut token = keys.sign(1).expect("sign");
        token.push('x');
        assert!(keys.verify(&token).is_err());
        assert!(keys.verify("not.a.token").is_err());
    }

    #[tokio::test]
    async fn keys_follow_app_config() {
        let state = AppState::for_tests().await;
        let keys = SessionKeys::from_ref(&state);
        assert_eq!(keys.issuer, "test-issuer");
        assert_eq!(keys.max_age_secs(), 5 * 60);
    }
}
