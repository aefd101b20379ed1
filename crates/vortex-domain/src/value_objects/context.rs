//! Request-scoped caller identity.

use serde::{Deserialize, Serialize};

use crate::entities::user::Role;

/// How the caller authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Bearer JWT issued by `/auth/login`
    Bearer,
    /// Internal service API key
    ApiKey,
    /// No credentials presented
    Anonymous,
}

/// The security context attached to every request after the middleware runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    /// Stable user identifier (username for humans, service ID for services)
    pub user_id: String,
    /// Effective role
    pub role: Role,
    /// Team attribute for ABAC isolation, when set
    pub team: Option<String>,
    /// Contractor flag; restricts access to business hours
    pub is_contractor: bool,
    /// Break-the-glass flag; grants with a warn-level audit event
    pub emergency_access: bool,
    /// How the caller authenticated
    pub auth: AuthMethod,
}

impl UserContext {
    /// Anonymous guest context for unauthenticated requests
    #[must_use]
    pub fn guest() -> Self {
        Self {
            user_id: "anonymous".to_owned(),
            role: Role::Guest,
            team: None,
            is_contractor: false,
            emergency_access: false,
            auth: AuthMethod::Anonymous,
        }
    }

    /// Context for a whitelisted internal service
    #[must_use]
    pub fn service(service_id: &str) -> Self {
        Self {
            user_id: service_id.to_owned(),
            role: Role::Service,
            team: None,
            is_contractor: false,
            emergency_access: false,
            auth: AuthMethod::ApiKey,
        }
    }

    /// True for the admin role
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Highest `access_level` this caller may see
    #[must_use]
    pub fn access_ceiling(&self) -> i64 {
        self.role.access_ceiling()
    }
}
