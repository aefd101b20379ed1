//! User management: Argon2 password hashing, authentication, role
//! assignment.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use vortex_domain::entities::{Role, User};
use vortex_domain::error::{Error, Result};
use vortex_domain::ports::users::UserStore;

/// User account service.
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    /// Wrap a user store.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Hash a password with Argon2id and a random salt.
    ///
    /// # Errors
    /// Returns an error when hashing fails.
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| Error::internal(format!("password hashing failed: {e}")))
    }

    /// Constant-time verification of a password against its stored hash.
    #[must_use]
    pub fn verify_password(password: &str, password_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Create a user account.
    ///
    /// # Errors
    /// Fails when the username is taken or hashing fails.
    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> Result<User> {
        if self.store.find(username).await?.is_some() {
            return Err(Error::invalid_request(format!(
                "user '{username}' already exists"
            )));
        }
        let password_hash = Self::hash_password(password)?;
        let user = self.store.create(username, &password_hash, role).await?;
        tracing::info!(username, role = %role, "user created");
        Ok(user)
    }

    /// Authenticate a user; returns `None` on bad credentials or an inactive
    /// account. A successful login updates `last_login`.
    ///
    /// # Errors
    /// Propagates store failures only; credential mismatches are `None`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.store.find(username).await? else {
            return Ok(None);
        };
        if !Self::verify_password(password, &user.password_hash) {
            return Ok(None);
        }
        if !user.is_active {
            tracing::warn!(username, "inactive user attempted login");
            return Ok(None);
        }
        self.store.touch_login(username).await?;
        Ok(Some(user))
    }

    /// All user accounts.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.store.list().await
    }

    /// Delete a user account; returns false when absent.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        self.store.delete(username).await
    }
}
