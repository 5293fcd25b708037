//! Deterministic authenticator for integration testing.
//!
//! Accepts a fixed set of user/password pairs and records every attempt
//! so tests can assert on what the shell sent.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lucra::auth::{AuthError, Authenticator, Credentials, Plan};

pub struct MockAuth {
    users: HashMap<String, (String, Plan)>,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl MockAuth {
    /// `demo`/`demo-pass` on Free and `daniel`/`pro-pass` on Pro.
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert("demo".to_string(), ("demo-pass".to_string(), Plan::Free));
        users.insert("daniel".to_string(), ("pro-pass".to_string(), Plan::Pro));
        Self {
            users,
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the list of user names seen so far.
    pub fn attempts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.attempts)
    }
}

#[async_trait]
impl Authenticator for MockAuth {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Plan, AuthError> {
        self.attempts.lock().unwrap().push(credentials.user.clone());
        match self.users.get(&credentials.user) {
            Some((password, plan)) if password == credentials.password.expose_secret() => Ok(*plan),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
