//! Access control.
//!
//! Defines the `Authenticator` trait the HTTP shell depends on, plus the
//! two credential sources the app has used: a single shared password and
//! a static user table carrying each user's plan.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Subscription plan attached to an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Free => write!(f, "Free"),
            Plan::Pro => write!(f, "Pro"),
        }
    }
}

/// Credentials presented with a request.
#[derive(Debug)]
pub struct Credentials {
    pub user: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: SecretString::new(password.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

// ---------------------------------------------------------------------------
// Authenticator trait
// ---------------------------------------------------------------------------

/// Validates credentials and tells the caller which plan applies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Plan, AuthError>;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Shared password
// ---------------------------------------------------------------------------

/// One password for everybody. The user name is informational only.
pub struct SharedPassword {
    password: SecretString,
    plan: Plan,
}

impl SharedPassword {
    pub fn new(password: SecretString) -> Self {
        Self {
            password,
            plan: Plan::Free,
        }
    }

    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = plan;
        self
    }
}

#[async_trait]
impl Authenticator for SharedPassword {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Plan, AuthError> {
        if constant_time_eq(
            credentials.password.expose_secret().as_bytes(),
            self.password.expose_secret().as_bytes(),
        ) {
            Ok(self.plan)
        } else {
            warn!(user = %credentials.user, "Shared password rejected");
            Err(AuthError::InvalidCredentials)
        }
    }

    fn name(&self) -> &str {
        "shared_password"
    }
}

// ---------------------------------------------------------------------------
// Static credential table
// ---------------------------------------------------------------------------

struct Account {
    password: SecretString,
    plan: Plan,
}

/// Fixed user → (password, plan) table, loaded once at startup.
#[derive(Default)]
pub struct CredentialTable {
    accounts: HashMap<String, Account>,
}

impl CredentialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: impl Into<String>, password: SecretString, plan: Plan) -> Self {
        self.insert(user, password, plan);
        self
    }

    pub fn insert(&mut self, user: impl Into<String>, password: SecretString, plan: Plan) {
        self.accounts.insert(user.into(), Account { password, plan });
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl Authenticator for CredentialTable {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Plan, AuthError> {
        let Some(account) = self.accounts.get(&credentials.user) else {
            warn!(user = %credentials.user, "Unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if constant_time_eq(
            credentials.password.expose_secret().as_bytes(),
            account.password.expose_secret().as_bytes(),
        ) {
            debug!(user = %credentials.user, plan = %account.plan, "User authenticated");
            Ok(account.plan)
        } else {
            warn!(user = %credentials.user, "Wrong password");
            Err(AuthError::InvalidCredentials)
        }
    }

    fn name(&self) -> &str {
        "credential_table"
    }
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
