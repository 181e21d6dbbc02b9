use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use pawmart_shared::Masked;

use crate::validation::{validate_phone, validate_email, validate_name, FieldErrors};
use crate::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Seller => "SELLER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CUSTOMER" => Some(Role::Customer),
            "SELLER" => Some(Role::Seller),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub phone: Masked<String>,
    pub name: String,
    pub email: Option<String>,
    pub roles: Vec<Role>,
    pub active_role: Role,
    pub order_count: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Profile details needed to register an unknown phone number
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_ttl")]
    pub ttl_seconds: i64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    #[serde(default = "default_cooldown")]
    pub resend_cooldown_seconds: i64,
    /// No SMS is ever sent; when set, the code is returned to the caller
    #[serde(default = "default_expose")]
    pub expose_codes: bool,
}

fn default_ttl() -> i64 { 300 }
fn default_max_attempts() -> u32 { 3 }
fn default_code_length() -> usize { 6 }
fn default_cooldown() -> i64 { 30 }
fn default_expose() -> bool { true }

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            max_attempts: default_max_attempts(),
            code_length: default_code_length(),
            resend_cooldown_seconds: default_cooldown(),
            expose_codes: default_expose(),
        }
    }
}

/// Whether a code will sign in an existing account or create one
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    Register,
}

/// Short-lived in-memory one-time-password record, keyed by phone
#[derive(Debug, Clone)]
pub struct OtpSession {
    pub phone: Masked<String>,
    pub purpose: OtpPurpose,
    code: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_sent_at: DateTime<Utc>,
}

/// What the caller learns after requesting a code
#[derive(Debug, Clone, Serialize)]
pub struct OtpChallenge {
    pub phone: Masked<String>,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
    pub resend_after: DateTime<Utc>,
    pub is_registered: bool,
    pub dev_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SignIn {
    pub user: User,
    pub is_new: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("Please wait {retry_after_seconds}s before requesting another code")]
    CooldownActive {
        retry_after_seconds: i64,
    },

    #[error("No verification code was requested for this phone")]
    NoActiveChallenge,

    #[error("Verification code expired")]
    ChallengeExpired,

    #[error("Incorrect verification code, {remaining_attempts} attempt(s) left")]
    InvalidCode {
        remaining_attempts: u32,
    },

    #[error("Too many incorrect attempts, request a new code")]
    TooManyAttempts,

    #[error("New phone number: a name is required to register")]
    ProfileRequired,

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Role {0:?} is not granted to this account")]
    RoleNotGranted(Role),
}

/// Mock phone-number authentication: user directory plus OTP sessions
pub struct AuthService {
    config: OtpConfig,
    users: HashMap<Uuid, User>,
    otp_sessions: HashMap<String, OtpSession>,
}

impl AuthService {
    pub fn new(config: OtpConfig) -> Self {
        Self {
            config,
            users: HashMap::new(),
            otp_sessions: HashMap::new(),
        }
    }

    /// Service pre-populated with one account per role combination
    pub fn with_demo_accounts(config: OtpConfig) -> Self {
        let mut service = Self::new(config);
        let demo = [
            ("5550000001", "Avery Customer", vec![Role::Customer]),
            ("5550000002", "Sam Seller", vec![Role::Customer, Role::Seller]),
            ("5550000003", "Alex Admin", vec![Role::Customer, Role::Seller, Role::Admin]),
        ];
        for (phone, name, roles) in demo {
            service.insert_user(phone.to_string(), name.to_string(), None, roles);
        }
        service
    }

    pub fn config(&self) -> &OtpConfig {
        &self.config
    }

    pub fn user(&self, id: &Uuid) -> Option<&User> {
        self.users.get(id)
    }

    pub fn user_by_phone(&self, raw_phone: &str) -> Option<&User> {
        let phone = validate_phone("phone", raw_phone).ok()?;
        self.users.values().find(|u| u.phone.expose() == phone)
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Replace the user directory (snapshot restore)
    pub fn restore_users(&mut self, users: Vec<User>) {
        self.users = users.into_iter().map(|u| (u.id, u)).collect();
    }

    /// Issue a fresh code for `raw_phone`, replacing any pending one
    pub fn request_otp(&mut self, raw_phone: &str) -> Result<OtpChallenge, AuthError> {
        let phone = validate_phone("phone", raw_phone)
            .map_err(|e| CoreError::InvalidFields(vec![e]))?;
        let now = Utc::now();

        if let Some(existing) = self.otp_sessions.get(&phone) {
            let ready_at = existing.last_sent_at + Duration::seconds(self.config.resend_cooldown_seconds);
            if now < ready_at {
                return Err(AuthError::CooldownActive {
                    retry_after_seconds: (ready_at - now).num_seconds().max(1),
                });
            }
        }

        let code = self.generate_code();
        let purpose = if self.users.values().any(|u| u.phone.expose() == phone) {
            OtpPurpose::Login
        } else {
            OtpPurpose::Register
        };
        let session = OtpSession {
            phone: Masked(phone.clone()),
            purpose,
            code: code.clone(),
            expires_at: now + Duration::seconds(self.config.ttl_seconds),
            attempts: 0,
            last_sent_at: now,
        };

        tracing::info!("Issued OTP for {}", session.phone);

        let challenge = OtpChallenge {
            phone: session.phone.clone(),
            purpose,
            expires_at: session.expires_at,
            resend_after: now + Duration::seconds(self.config.resend_cooldown_seconds),
            is_registered: purpose == OtpPurpose::Login,
            dev_code: self.config.expose_codes.then_some(code),
        };
        self.otp_sessions.insert(phone, session);

        Ok(challenge)
    }

    /// Check a code; signs in a known phone or registers a new one.
    ///
    /// A correct code for an unknown phone without a profile leaves the
    /// session intact so the caller can retry with the profile attached.
    pub fn verify_otp(&mut self, raw_phone: &str, code: &str, profile: Option<NewProfile>) -> Result<SignIn, AuthError> {
        let phone = validate_phone("phone", raw_phone)
            .map_err(|e| CoreError::InvalidFields(vec![e]))?;
        let now = Utc::now();
        let max_attempts = self.config.max_attempts;

        let session = self.otp_sessions.get_mut(&phone)
            .ok_or(AuthError::NoActiveChallenge)?;

        if now > session.expires_at {
            self.otp_sessions.remove(&phone);
            return Err(AuthError::ChallengeExpired);
        }

        if session.code != code.trim() {
            session.attempts += 1;
            if session.attempts >= max_attempts {
                tracing::warn!("OTP locked out for {}", session.phone);
                self.otp_sessions.remove(&phone);
                return Err(AuthError::TooManyAttempts);
            }
            return Err(AuthError::InvalidCode {
                remaining_attempts: max_attempts - session.attempts,
            });
        }

        let existing = self.users.values().find(|u| u.phone.expose() == phone).cloned();
        let sign_in = match existing {
            Some(user) => SignIn { user, is_new: false },
            None => {
                let profile = profile.ok_or(AuthError::ProfileRequired)?;
                let mut errors = FieldErrors::new();
                let name = errors.check(validate_name("name", &profile.name));
                let email = match profile.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
                    Some(raw) => errors.check(validate_email("email", raw)),
                    None => None,
                };
                errors.into_result()?;

                let user = self.insert_user(phone.clone(), name.unwrap_or_default(), email, vec![Role::Customer]);
                tracing::info!("Registered user {} for {}", user.id, user.phone);
                SignIn { user, is_new: true }
            }
        };

        self.otp_sessions.remove(&phone);
        Ok(sign_in)
    }

    /// Change the role a multi-role account is acting as
    pub fn switch_role(&mut self, user_id: &Uuid, role: Role) -> Result<&User, AuthError> {
        let user = self.users.get_mut(user_id)
            .ok_or(AuthError::UserNotFound(*user_id))?;

        if !user.has_role(role) {
            return Err(AuthError::RoleNotGranted(role));
        }

        user.active_role = role;
        tracing::info!("User {} switched to {:?}", user.id, role);
        Ok(user)
    }

    pub fn record_order(&mut self, user_id: &Uuid) -> Result<u32, AuthError> {
        let user = self.users.get_mut(user_id)
            .ok_or(AuthError::UserNotFound(*user_id))?;
        user.order_count += 1;
        Ok(user.order_count)
    }

    pub fn is_first_order(&self, user_id: &Uuid) -> bool {
        self.users.get(user_id).is_some_and(|u| u.order_count == 0)
    }

    /// Drop expired OTP sessions; returns how many were removed
    pub fn purge_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.otp_sessions.len();
        self.otp_sessions.retain(|_, s| s.expires_at > now);
        before - self.otp_sessions.len()
    }

    fn insert_user(&mut self, phone: String, name: String, email: Option<String>, roles: Vec<Role>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            phone: Masked(phone),
            name,
            email,
            active_role: roles.first().copied().unwrap_or(Role::Customer),
            roles,
            order_count: 0,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        user
    }

    fn generate_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.config.code_length.max(4))
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::with_demo_accounts(OtpConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(service: &mut AuthService, phone: &str) -> String {
        service.request_otp(phone).unwrap().dev_code.unwrap()
    }

    #[test]
    fn test_login_existing_user() {
        let mut service = AuthService::default();
        let challenge = service.request_otp("555-000-0001").unwrap();
        assert!(challenge.is_registered);
        assert_eq!(challenge.purpose, OtpPurpose::Login);
        let code = challenge.dev_code.unwrap();
        assert_eq!(code.len(), 6);

        let sign_in = service.verify_otp("5550000001", &code, None).unwrap();
        assert!(!sign_in.is_new);
        assert_eq!(sign_in.user.name, "Avery Customer");

        // Code is single use
        assert!(matches!(
            service.verify_otp("5550000001", &code, None),
            Err(AuthError::NoActiveChallenge)
        ));
    }

    #[test]
    fn test_register_requires_profile() {
        let mut service = AuthService::default();
        let code = request(&mut service, "2125550199");

        assert!(matches!(
            service.verify_otp("2125550199", &code, None),
            Err(AuthError::ProfileRequired)
        ));

        let profile = NewProfile {
            name: "Jordan Lee".to_string(),
            email: Some("Jordan@Example.com".to_string()),
        };
        let sign_in = service.verify_otp("2125550199", &code, Some(profile)).unwrap();
        assert!(sign_in.is_new);
        assert_eq!(sign_in.user.roles, vec![Role::Customer]);
        assert_eq!(sign_in.user.email.as_deref(), Some("jordan@example.com"));
        assert!(service.user_by_phone("(212) 555-0199").is_some());
    }

    #[test]
    fn test_register_validates_profile() {
        let mut service = AuthService::default();
        let code = request(&mut service, "2125550123");
        let profile = NewProfile {
            name: "X".to_string(),
            email: Some("bad-email".to_string()),
        };

        match service.verify_otp("2125550123", &code, Some(profile)) {
            Err(AuthError::Invalid(CoreError::InvalidFields(fields))) => assert_eq!(fields.len(), 2),
            other => panic!("expected invalid fields, got {:?}", other.map(|s| s.user.id)),
        }
    }

    #[test]
    fn test_wrong_code_locks_out() {
        let mut service = AuthService::default();
        let code = request(&mut service, "5550000001");
        let wrong = if code == "000000" { "111111" } else { "000000" };

        assert!(matches!(
            service.verify_otp("5550000001", wrong, None),
            Err(AuthError::InvalidCode { remaining_attempts: 2 })
        ));
        assert!(matches!(
            service.verify_otp("5550000001", wrong, None),
            Err(AuthError::InvalidCode { remaining_attempts: 1 })
        ));
        assert!(matches!(
            service.verify_otp("5550000001", wrong, None),
            Err(AuthError::TooManyAttempts)
        ));
        assert!(matches!(
            service.verify_otp("5550000001", &code, None),
            Err(AuthError::NoActiveChallenge)
        ));
    }

    #[test]
    fn test_expired_code() {
        let mut service = AuthService::default();
        let code = request(&mut service, "5550000001");
        service.otp_sessions.get_mut("5550000001").unwrap().expires_at = Utc::now() - Duration::seconds(1);

        assert!(matches!(
            service.verify_otp("5550000001", &code, None),
            Err(AuthError::ChallengeExpired)
        ));
    }

    #[test]
    fn test_resend_cooldown() {
        let mut service = AuthService::default();
        request(&mut service, "5550000001");
        assert!(matches!(
            service.request_otp("5550000001"),
            Err(AuthError::CooldownActive { .. })
        ));

        service.otp_sessions.get_mut("5550000001").unwrap().last_sent_at = Utc::now() - Duration::seconds(31);
        assert!(service.request_otp("5550000001").is_ok());
    }

    #[test]
    fn test_codes_hidden_when_not_exposed() {
        let mut service = AuthService::with_demo_accounts(OtpConfig {
            expose_codes: false,
            ..Default::default()
        });
        assert!(service.request_otp("5550000001").unwrap().dev_code.is_none());
    }

    #[test]
    fn test_invalid_phone_rejected() {
        let mut service = AuthService::default();
        assert!(matches!(service.request_otp("123"), Err(AuthError::Invalid(_))));
    }

    #[test]
    fn test_switch_role() {
        let mut service = AuthService::default();
        let admin_id = service.user_by_phone("5550000003").unwrap().id;
        let customer_id = service.user_by_phone("5550000001").unwrap().id;

        let user = service.switch_role(&admin_id, Role::Admin).unwrap();
        assert_eq!(user.active_role, Role::Admin);

        assert!(matches!(
            service.switch_role(&customer_id, Role::Seller),
            Err(AuthError::RoleNotGranted(Role::Seller))
        ));
        assert!(matches!(
            service.switch_role(&Uuid::new_v4(), Role::Customer),
            Err(AuthError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_first_order_tracking() {
        let mut service = AuthService::default();
        let id = service.user_by_phone("5550000001").unwrap().id;

        assert!(service.is_first_order(&id));
        service.record_order(&id).unwrap();
        assert!(!service.is_first_order(&id));
    }

    #[test]
    fn test_purge_expired() {
        let mut service = AuthService::default();
        request(&mut service, "5550000001");
        request(&mut service, "5550000002");
        service.otp_sessions.get_mut("5550000002").unwrap().expires_at = Utc::now() - Duration::seconds(1);

        assert_eq!(service.purge_expired(), 1);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("guest"), None);
        assert_eq!(Role::Seller.as_str(), "SELLER");
    }
}
