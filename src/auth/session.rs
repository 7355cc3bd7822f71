use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::SessionConfig;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "nyayasetu_session";

#[derive(Debug, Clone)]
struct Session {
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// In-process session store. The cookie value is `{token}.{signature}`
/// where the signature is an HMAC-SHA256 of the token under the server
/// secret, so a forged or tampered cookie is rejected before the map is
/// even consulted.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    secret: String,
    ttl: Duration,
    production: bool,
}

impl SessionStore {
    pub fn new(cfg: &SessionConfig, production: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            secret: cfg.secret.clone(),
            ttl: Duration::hours(cfg.ttl_hours),
            production,
        }
    }

    fn sign(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Creates a session and returns the signed cookie value. Expired
    /// entries are swept here so abandoned sessions cannot pile up for
    /// the process lifetime.
    pub fn create(&self, user_id: &str) -> String {
        self.sweep_expired();

        let token = Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                user_id: user_id.to_string(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        let signature = self.sign(&token);
        format!("{}.{}", token, signature)
    }

    /// Resolves a cookie value to a user id. Bad signature, unknown token
    /// and expired session all resolve to `None`; an expired entry is
    /// evicted on the way out.
    pub fn resolve(&self, cookie_value: &str) -> Option<String> {
        let (token, signature) = cookie_value.split_once('.')?;
        if !self.sign(token).eq_ignore_ascii_case(signature) {
            return None;
        }

        let expired = match self.sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => {
                return Some(session.user_id.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.sessions.remove(token);
        }
        None
    }

    pub fn destroy(&self, cookie_value: &str) {
        if let Some((token, _)) = cookie_value.split_once('.') {
            self.sessions.remove(token);
        }
    }

    fn sweep_expired(&self) {
        let now = Utc::now();
        self.sessions.retain(|_, session| session.expires_at > now);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.len()
    }

    /// `Set-Cookie` value establishing the session.
    pub fn cookie_header(&self, cookie_value: &str) -> String {
        let mut header = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            cookie_value,
            self.ttl.num_seconds()
        );
        if self.production {
            header.push_str("; Secure");
        }
        header
    }

    /// `Set-Cookie` value clearing the session cookie.
    pub fn clear_cookie_header(&self) -> String {
        let mut header = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
        if self.production {
            header.push_str("; Secure");
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl_hours: i64) -> SessionStore {
        SessionStore::new(
            &SessionConfig {
                secret: "test-secret".into(),
                ttl_hours,
            },
            false,
        )
    }

    #[test]
    fn created_session_resolves_to_its_user() {
        let store = store(24);
        let cookie = store.create("42");
        assert_eq!(store.resolve(&cookie).as_deref(), Some("42"));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let store = store(24);
        let cookie = store.create("42");
        let (token, _) = cookie.split_once('.').unwrap();
        let forged = format!("{}.{}", token, "0".repeat(64));
        assert!(store.resolve(&forged).is_none());
    }

    #[test]
    fn token_swap_under_valid_signature_is_rejected() {
        let store = store(24);
        store.create("42");
        let other_token = Uuid::new_v4().to_string();
        let forged = format!("{}.{}", other_token, store.sign(&other_token));
        // Signature checks out but no session exists for the token.
        assert!(store.resolve(&forged).is_none());
    }

    #[test]
    fn expired_session_does_not_resolve() {
        let store = store(0);
        let cookie = store.create("42");
        assert!(store.resolve(&cookie).is_none());
    }

    #[test]
    fn create_sweeps_expired_sessions() {
        let store = store(0);
        for _ in 0..5 {
            store.create("42");
        }
        // Every prior session is already expired by the time the next
        // create runs, so only the newest entry survives.
        assert_eq!(store.len(), 1);

        let live = self::store(24);
        for _ in 0..5 {
            live.create("42");
        }
        assert_eq!(live.len(), 5);
    }

    #[test]
    fn destroyed_session_does_not_resolve() {
        let store = store(24);
        let cookie = store.create("42");
        store.destroy(&cookie);
        assert!(store.resolve(&cookie).is_none());
    }

    #[test]
    fn secure_flag_tracks_production() {
        let dev = store(24);
        assert!(!dev.cookie_header("abc.def").contains("Secure"));

        let prod = SessionStore::new(
            &SessionConfig {
                secret: "s".into(),
                ttl_hours: 24,
            },
            true,
        );
        assert!(prod.cookie_header("abc.def").ends_with("; Secure"));
    }
}
