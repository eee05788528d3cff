//! Administrator sessions.
//!
//! The credential check is the original flat-file scheme with a soft lockout
//! counter; it is deliberately not a security boundary. What this service
//! adds is the request-scoped session token: a successful login issues a
//! token, and every other operation is gated on presenting it.

use anyhow::Result;
use chrono::{DateTime, Duration, Local};
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::backend::storage::{AdminRepository, AdminStorage, CsvConnection};

const MAX_LOGIN_ATTEMPTS: u32 = 3;
const LOCKOUT_SECONDS: i64 = 30;

/// Outcome of a login attempt
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub success: bool,
    pub token: Option<String>,
    pub message: String,
    pub locked_for_seconds: Option<i64>,
}

/// Outcome of a password change
#[derive(Debug, Clone)]
pub struct ChangePasswordResult {
    pub success: bool,
    pub message: String,
}

#[derive(Default)]
struct AuthState {
    /// token -> username
    sessions: HashMap<String, String>,
    failed_attempts: u32,
    locked_until: Option<DateTime<Local>>,
}

/// Service for administrator login, lockout and session tokens
#[derive(Clone)]
pub struct AuthService {
    repository: AdminRepository,
    state: Arc<Mutex<AuthState>>,
}

impl AuthService {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            repository: AdminRepository::new(connection),
            state: Arc::new(Mutex::new(AuthState::default())),
        }
    }

    /// Attempt a login. Three failures in a row lock further attempts for
    /// thirty seconds.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult> {
        if let Some(remaining) = self.lockout_remaining() {
            warn!("Login rejected during lockout ({}s left)", remaining);
            return Ok(LoginResult {
                success: false,
                token: None,
                message: format!(
                    "Too many failed attempts. Please try again in {} seconds.",
                    remaining
                ),
                locked_for_seconds: Some(remaining),
            });
        }

        let credentials = self.repository.load_credentials().await?;
        let matched = credentials
            .iter()
            .any(|c| c.username == username && c.password == password);

        let mut state = self.state.lock().unwrap();
        if matched {
            state.failed_attempts = 0;
            state.locked_until = None;
            let token = Uuid::new_v4().to_string();
            state.sessions.insert(token.clone(), username.to_string());
            info!("Administrator '{}' logged in", username);
            return Ok(LoginResult {
                success: true,
                token: Some(token),
                message: "Login successful".to_string(),
                locked_for_seconds: None,
            });
        }

        state.failed_attempts += 1;
        if state.failed_attempts >= MAX_LOGIN_ATTEMPTS {
            state.locked_until = Some(Local::now() + Duration::seconds(LOCKOUT_SECONDS));
            state.failed_attempts = 0;
            warn!("Login locked out for {} seconds", LOCKOUT_SECONDS);
            Ok(LoginResult {
                success: false,
                token: None,
                message: format!(
                    "Too many failed attempts. Please try again in {} seconds.",
                    LOCKOUT_SECONDS
                ),
                locked_for_seconds: Some(LOCKOUT_SECONDS),
            })
        } else {
            let remaining = MAX_LOGIN_ATTEMPTS - state.failed_attempts;
            Ok(LoginResult {
                success: false,
                token: None,
                message: format!("Invalid credentials. {} attempts remaining.", remaining),
                locked_for_seconds: None,
            })
        }
    }

    /// Whether a token belongs to a live session
    pub fn validate_token(&self, token: &str) -> bool {
        self.state.lock().unwrap().sessions.contains_key(token)
    }

    /// End the session behind a token
    pub fn logout(&self, token: &str) {
        if self.state.lock().unwrap().sessions.remove(token).is_some() {
            info!("Administrator session ended");
        }
    }

    /// Change the password of the account behind a live session
    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<ChangePasswordResult> {
        let username = match self.state.lock().unwrap().sessions.get(token) {
            Some(username) => username.clone(),
            None => {
                return Ok(ChangePasswordResult {
                    success: false,
                    message: "A valid administrator session is required".to_string(),
                })
            }
        };

        if new_password.is_empty() || new_password != confirm_password {
            return Ok(ChangePasswordResult {
                success: false,
                message: "New passwords don't match or password is empty".to_string(),
            });
        }

        let mut credentials = self.repository.load_credentials().await?;
        let account = credentials.iter_mut().find(|c| c.username == username);
        match account {
            Some(account) if account.password == current_password => {
                account.password = new_password.to_string();
            }
            _ => {
                return Ok(ChangePasswordResult {
                    success: false,
                    message: "Current password is incorrect".to_string(),
                })
            }
        }

        self.repository.store_credentials(&credentials).await?;
        info!("Password updated for administrator '{}'", username);
        Ok(ChangePasswordResult {
            success: true,
            message: "Password updated successfully".to_string(),
        })
    }

    fn lockout_remaining(&self) -> Option<i64> {
        let mut state = self.state.lock().unwrap();
        match state.locked_until {
            Some(until) => {
                let remaining = (until - Local::now()).num_seconds();
                if remaining > 0 {
                    Some(remaining)
                } else {
                    state.locked_until = None;
                    None
                }
            }
            None => None,
        }
    }
}
