// 🔐 Identity provider contract
//
// The catalog never depends on authentication. Sign-in, sign-up and OTP
// verification go through `IdentityProvider`; hosted services implement it
// remotely, `InMemoryIdentityProvider` implements it locally for the CLI and
// tests.

use crate::config::AuthConfig;
use crate::error::{AuthError, FieldError};
use crate::validation::{
    validate_email, validate_otp_code, validate_password, validate_phone, MIN_PASSWORD_LEN,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

// ============================================================================
// TYPES
// ============================================================================

/// Email address or phone number a user signs in with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Identity {
    Email(String),
    Phone(String),
}

impl Identity {
    /// Anything with an '@' is an email, everything else a phone number.
    pub fn parse(input: &str) -> Result<Identity, FieldError> {
        if input.contains('@') {
            validate_email(input).map(Identity::Email)
        } else {
            validate_phone(input).map(Identity::Phone)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Identity::Email(v) | Identity::Phone(v) => v,
        }
    }

    /// Canonical form so "A@B.com" and "a@b.com" are the same account.
    fn normalized(&self) -> Result<Identity, FieldError> {
        match self {
            Identity::Email(email) => validate_email(email).map(Identity::Email),
            Identity::Phone(phone) => validate_phone(phone).map(Identity::Phone),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign-up details beyond the credential
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: String,
}

/// Authenticated session handed back by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub identity: Identity,
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Broadcast to `on_session_change` subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
}

pub type SubscriptionId = u64;

pub type SessionCallback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// IdentityProvider - hosted auth treated as a black box
pub trait IdentityProvider: Send + Sync {
    /// Password sign-in with an email or phone identity
    fn sign_in(&self, identity: &Identity, credential: &str) -> Result<Session, AuthError>;

    /// Register a new account and sign it in
    fn sign_up(
        &self,
        identity: &Identity,
        credential: &str,
        profile: Profile,
    ) -> Result<Session, AuthError>;

    /// Start a passwordless sign-in by sending a one-time code
    fn send_otp(&self, identity: &Identity) -> Result<(), AuthError>;

    /// Finish a passwordless sign-in
    fn verify_otp(&self, identity: &Identity, code: &str) -> Result<Session, AuthError>;

    /// Active, unexpired session if any
    fn current_session(&self) -> Option<Session>;

    fn sign_out(&self) -> Result<(), AuthError>;

    /// Register a callback fired on every sign-in and sign-out
    fn on_session_change(&self, callback: SessionCallback) -> SubscriptionId;

    /// Returns false when the id was not subscribed
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

// ============================================================================
// IN-MEMORY PROVIDER
// ============================================================================

struct Account {
    user_id: String,
    salt: String,
    password_hash: Option<String>,
    profile: Profile,
}

struct PendingOtp {
    code: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct ProviderState {
    accounts: HashMap<Identity, Account>,
    pending_otps: HashMap<Identity, PendingOtp>,
    session: Option<Session>,
}

/// Longest accepted one-time code lifetime.
pub const MAX_OTP_TTL_SECS: u64 = 24 * 60 * 60;

/// Local provider keeping accounts in memory for the life of the process
pub struct InMemoryIdentityProvider {
    state: Mutex<ProviderState>,
    subscribers: Mutex<Vec<(SubscriptionId, SessionCallback)>>,
    next_subscription: Mutex<SubscriptionId>,
    otp_ttl: Duration,
    session_ttl: Duration,
    min_password_len: usize,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        InMemoryIdentityProvider {
            state: Mutex::new(ProviderState::default()),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: Mutex::new(1),
            otp_ttl: Duration::minutes(5),
            session_ttl: Duration::hours(1),
            min_password_len: MIN_PASSWORD_LEN,
        }
    }

    /// Provider tuned by the `[auth]` config section. The code lifetime is
    /// capped at one day.
    pub fn from_config(config: &AuthConfig) -> Self {
        let otp_secs = config.otp_ttl_secs.min(MAX_OTP_TTL_SECS) as i64;
        InMemoryIdentityProvider::new()
            .with_otp_ttl(Duration::seconds(otp_secs))
            .with_min_password_len(config.min_password_len)
    }

    pub fn with_otp_ttl(mut self, ttl: Duration) -> Self {
        self.otp_ttl = ttl;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_min_password_len(mut self, min_len: usize) -> Self {
        self.min_password_len = min_len;
        self
    }

    /// Code waiting for verification. Stands in for the SMS/email outbox.
    pub fn pending_code(&self, identity: &Identity) -> Option<String> {
        let identity = identity.normalized().ok()?;
        self.state()
            .pending_otps
            .get(&identity)
            .map(|otp| otp.code.clone())
    }

    /// Profile stored at sign-up; empty for passwordless accounts.
    pub fn profile(&self, identity: &Identity) -> Option<Profile> {
        let identity = identity.normalized().ok()?;
        self.state()
            .accounts
            .get(&identity)
            .map(|account| account.profile.clone())
    }

    fn state(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn start_session(&self, user_id: &str, identity: Identity) -> Session {
        let now = Utc::now();
        let session = Session {
            user_id: user_id.to_string(),
            identity,
            token: uuid::Uuid::new_v4().to_string(),
            issued_at: now,
            expires_at: now
                .checked_add_signed(self.session_ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };

        self.state().session = Some(session.clone());
        info!(user_id = %session.user_id, "signed in");
        self.notify(&SessionEvent::SignedIn(session.clone()));
        session
    }

    fn notify(&self, event: &SessionEvent) {
        // Clone out so callbacks may call back into the provider.
        let callbacks: Vec<SessionCallback> = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn sign_in(&self, identity: &Identity, credential: &str) -> Result<Session, AuthError> {
        let identity = identity.normalized()?;

        let user_id = {
            let state = self.state();
            let account = state
                .accounts
                .get(&identity)
                .ok_or(AuthError::InvalidCredentials)?;

            match &account.password_hash {
                Some(hash) if *hash == hash_credential(&account.salt, credential) => {
                    account.user_id.clone()
                }
                _ => return Err(AuthError::InvalidCredentials),
            }
        };

        Ok(self.start_session(&user_id, identity))
    }

    fn sign_up(
        &self,
        identity: &Identity,
        credential: &str,
        profile: Profile,
    ) -> Result<Session, AuthError> {
        let identity = identity.normalized()?;
        validate_password(credential, self.min_password_len)?;

        let user_id = {
            let mut state = self.state();
            if state.accounts.contains_key(&identity) {
                return Err(AuthError::UserExists);
            }

            let salt = uuid::Uuid::new_v4().to_string();
            let account = Account {
                user_id: uuid::Uuid::new_v4().to_string(),
                password_hash: Some(hash_credential(&salt, credential)),
                salt,
                profile,
            };
            let user_id = account.user_id.clone();
            state.accounts.insert(identity.clone(), account);
            user_id
        };

        info!(user_id = %user_id, "account created");
        Ok(self.start_session(&user_id, identity))
    }

    fn send_otp(&self, identity: &Identity) -> Result<(), AuthError> {
        let identity = identity.normalized()?;
        let code = format!("{:06}", uuid::Uuid::new_v4().as_u128() % 1_000_000);

        let expires_at = Utc::now()
            .checked_add_signed(self.otp_ttl)
            .ok_or_else(|| AuthError::Provider("verification code lifetime out of range".into()))?;

        debug!(identity = %identity, "verification code issued");
        self.state()
            .pending_otps
            .insert(identity, PendingOtp { code, expires_at });
        Ok(())
    }

    fn verify_otp(&self, identity: &Identity, code: &str) -> Result<Session, AuthError> {
        let identity = identity.normalized()?;
        let code = validate_otp_code(code)?;

        let user_id = {
            let mut state = self.state();
            let pending = state
                .pending_otps
                .get(&identity)
                .ok_or(AuthError::NoPendingOtp)?;

            if Utc::now() >= pending.expires_at {
                state.pending_otps.remove(&identity);
                return Err(AuthError::OtpExpired);
            }
            if pending.code != code {
                return Err(AuthError::OtpMismatch);
            }
            state.pending_otps.remove(&identity);

            // Passwordless sign-in creates the account on first use.
            state
                .accounts
                .entry(identity.clone())
                .or_insert_with(|| Account {
                    user_id: uuid::Uuid::new_v4().to_string(),
                    salt: uuid::Uuid::new_v4().to_string(),
                    password_hash: None,
                    profile: Profile::default(),
                })
                .user_id
                .clone()
        };

        Ok(self.start_session(&user_id, identity))
    }

    fn current_session(&self) -> Option<Session> {
        let mut state = self.state();
        match &state.session {
            Some(session) if session.is_expired_at(Utc::now()) => {
                state.session = None;
                None
            }
            other => other.clone(),
        }
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        let previous = self.state().session.take();
        if previous.is_none() {
            return Err(AuthError::NotSignedIn);
        }
        info!("signed out");
        self.notify(&SessionEvent::SignedOut);
        Ok(())
    }

    fn on_session_change(&self, callback: SessionCallback) -> SubscriptionId {
        let mut next = self
            .next_subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let id = *next;
        *next += 1;

        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }
}

fn hash_credential(salt: &str, credential: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(credential.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn email(addr: &str) -> Identity {
        Identity::Email(addr.to_string())
    }

    #[test]
    fn test_from_config_applies_password_policy() {
        let config = AuthConfig {
            otp_ttl_secs: 60,
            min_password_len: 10,
        };
        let provider = InMemoryIdentityProvider::from_config(&config);

        let err = provider
            .sign_up(&email("a@example.com"), "short-pw", Profile::default())
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)), "8 chars is below the configured 10");
        assert!(provider
            .sign_up(&email("a@example.com"), "long-enough-pw", Profile::default())
            .is_ok());
    }

    #[test]
    fn test_huge_otp_ttl_is_capped() {
        let config = AuthConfig {
            otp_ttl_secs: u64::MAX,
            min_password_len: 6,
        };
        let provider = InMemoryIdentityProvider::from_config(&config);
        let identity = email("slow@example.com");

        provider.send_otp(&identity).unwrap();
        let code = provider.pending_code(&identity).unwrap();
        assert!(
            provider.verify_otp(&identity, &code).is_ok(),
            "Capped TTL still accepts a fresh code"
        );

        let config = AuthConfig {
            otp_ttl_secs: 10_000_000_000_000_000,
            min_password_len: 6,
        };
        assert!(InMemoryIdentityProvider::from_config(&config)
            .send_otp(&identity)
            .is_ok());
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let provider = InMemoryIdentityProvider::new().with_otp_ttl(Duration::MAX);
        let err = provider.send_otp(&email("a@example.com")).unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));

        let provider = InMemoryIdentityProvider::new().with_session_ttl(Duration::MAX);
        assert!(provider
            .sign_up(&email("b@example.com"), "123456", Profile::default())
            .is_ok());
        assert!(provider.current_session().is_some(), "Session expiry saturates");
    }

    #[test]
    fn test_identity_parse() {
        assert_eq!(
            Identity::parse("Student@Example.com").unwrap(),
            email("student@example.com")
        );
        assert_eq!(
            Identity::parse("+91 98765 43210").unwrap(),
            Identity::Phone("+919876543210".to_string())
        );
        assert!(Identity::parse("nope").is_err());
    }

    #[test]
    fn test_sign_up_then_sign_in() {
        let provider = InMemoryIdentityProvider::new();
        let identity = email("student@example.com");

        let session = provider
            .sign_up(&identity, "hunter22", Profile { full_name: "Asha".to_string() })
            .unwrap();
        assert_eq!(provider.current_session(), Some(session.clone()));
        assert_eq!(provider.profile(&identity).unwrap().full_name, "Asha");

        provider.sign_out().unwrap();
        assert!(provider.current_session().is_none());

        let again = provider.sign_in(&email("STUDENT@example.com"), "hunter22").unwrap();
        assert_eq!(again.user_id, session.user_id, "Same account, different case");
        assert_ne!(again.token, session.token);
    }

    #[test]
    fn test_sign_up_rejects_duplicates_and_short_passwords() {
        let provider = InMemoryIdentityProvider::new();
        let identity = email("a@b.com");

        assert!(matches!(
            provider.sign_up(&identity, "123", Profile::default()),
            Err(AuthError::Validation(_))
        ));
        provider.sign_up(&identity, "123456", Profile::default()).unwrap();
        assert_eq!(
            provider.sign_up(&identity, "123456", Profile::default()),
            Err(AuthError::UserExists)
        );
    }

    #[test]
    fn test_sign_in_wrong_password() {
        let provider = InMemoryIdentityProvider::new();
        let identity = email("a@b.com");
        provider.sign_up(&identity, "correct-horse", Profile::default()).unwrap();

        assert_eq!(
            provider.sign_in(&identity, "wrong-horse"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            provider.sign_in(&email("nobody@b.com"), "x"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_otp_flow() {
        let provider = InMemoryIdentityProvider::new();
        let phone = Identity::Phone("9876543210".to_string());

        assert_eq!(provider.verify_otp(&phone, "123456"), Err(AuthError::NoPendingOtp));

        provider.send_otp(&phone).unwrap();
        let code = provider.pending_code(&phone).unwrap();
        assert_eq!(code.len(), 6);

        let wrong = if code == "000000" { "111111" } else { "000000" };
        assert_eq!(provider.verify_otp(&phone, wrong), Err(AuthError::OtpMismatch));

        let session = provider.verify_otp(&phone, &code).unwrap();
        assert_eq!(session.identity, phone);
        assert!(provider.pending_code(&phone).is_none(), "Code is single-use");
    }

    #[test]
    fn test_otp_expiry() {
        let provider = InMemoryIdentityProvider::new().with_otp_ttl(Duration::zero());
        let identity = email("late@example.com");
        provider.send_otp(&identity).unwrap();
        let code = provider.pending_code(&identity).unwrap();

        assert_eq!(provider.verify_otp(&identity, &code), Err(AuthError::OtpExpired));
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let provider = InMemoryIdentityProvider::new().with_session_ttl(Duration::zero());
        provider
            .sign_up(&email("a@b.com"), "123456", Profile::default())
            .unwrap();
        assert!(provider.current_session().is_none());
    }

    #[test]
    fn test_session_change_notifications() {
        let provider = InMemoryIdentityProvider::new();
        let events = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&events);
        let id = provider.on_session_change(Arc::new(move |event: &SessionEvent| {
            sink.lock().unwrap().push(matches!(event, SessionEvent::SignedIn(_)));
        }));

        provider.sign_up(&email("a@b.com"), "123456", Profile::default()).unwrap();
        provider.sign_out().unwrap();
        assert_eq!(*events.lock().unwrap(), vec![true, false]);

        assert!(provider.unsubscribe(id));
        assert!(!provider.unsubscribe(id));
        provider.sign_in(&email("a@b.com"), "123456").unwrap();
        assert_eq!(events.lock().unwrap().len(), 2, "No events after unsubscribe");
    }

    #[test]
    fn test_sign_out_without_session() {
        let provider = InMemoryIdentityProvider::new();
        assert_eq!(provider.sign_out(), Err(AuthError::NotSignedIn));
    }
}
