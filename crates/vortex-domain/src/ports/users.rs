//! User persistence port.

use async_trait::async_trait;

use crate::entities::{Role, User};
use crate::error::Result;

/// User table operations.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user; fails when the username exists
    async fn create(&self, username: &str, password_hash: &str, role: Role) -> Result<User>;

    /// Fetch a user by username
    async fn find(&self, username: &str) -> Result<Option<User>>;

    /// Record a successful login
    async fn touch_login(&self, username: &str) -> Result<()>;

    /// All users
    async fn list(&self) -> Result<Vec<User>>;

    /// Delete a user; returns false when absent
    async fn delete(&self, username: &str) -> Result<bool>;
}
