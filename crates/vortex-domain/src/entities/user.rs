//! User accounts and roles.

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Gateway roles, ordered roughly by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access
    #[display("admin")]
    Admin,
    /// Read/write/delete/search
    #[display("engineer")]
    Engineer,
    /// Read/search
    #[display("analyst")]
    Analyst,
    /// Read only
    #[display("viewer")]
    Viewer,
    /// Internal service (read/write)
    #[display("service")]
    Service,
    /// Unauthenticated caller
    #[display("guest")]
    Guest,
}

impl Role {
    /// String form used in tokens and the user table
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Engineer => "engineer",
            Self::Analyst => "analyst",
            Self::Viewer => "viewer",
            Self::Service => "service",
            Self::Guest => "guest",
        }
    }

    /// Highest `access_level` visible to this role
    #[must_use]
    pub fn access_ceiling(&self) -> i64 {
        match self {
            Self::Admin => i64::MAX,
            Self::Engineer | Self::Service => 5,
            Self::Analyst => 4,
            Self::Viewer => 2,
            Self::Guest => 1,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "engineer" => Ok(Self::Engineer),
            "analyst" => Ok(Self::Analyst),
            "viewer" => Ok(Self::Viewer),
            "service" => Ok(Self::Service),
            "guest" => Ok(Self::Guest),
            other => Err(Error::invalid_request(format!("Unknown role: {other}"))),
        }
    }
}

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Row ID
    pub id: i64,
    /// Unique username
    pub username: String,
    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Assigned role
    pub role: Role,
    /// Inactive users cannot authenticate
    pub is_active: bool,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Last successful login, if any
    pub last_login: Option<DateTime<Utc>>,
}
