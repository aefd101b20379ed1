//! Hybrid RBAC + ABAC access control.
//!
//! RBAC grants the baseline per role; ABAC overlays refine or override it:
//! team isolation, business-hours restriction for contractors, and the
//! break-the-glass escape hatch. `check_permission` is the sole public entry
//! point and always returns a human-readable reason for the audit trail.

use std::collections::HashSet;

use chrono::{NaiveTime, Timelike};
use derive_more::Display;

use vortex_domain::constants::auth::SERVICE_WHITELIST;
use vortex_domain::entities::Role;
use vortex_domain::value_objects::{AuthMethod, UserContext};

/// Actions a caller can request on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ResourceAction {
    /// Read stored documents
    #[display("read")]
    Read,
    /// Create or update documents
    #[display("write")]
    Write,
    /// Delete documents or collections
    #[display("delete")]
    Delete,
    /// Run search queries
    #[display("search")]
    Search,
    /// Administer user accounts
    #[display("manage_users")]
    ManageUsers,
    /// Change runtime configuration
    #[display("manage_config")]
    ManageConfig,
    /// Read audit logs
    #[display("view_audit")]
    ViewAudit,
    /// Bulk data export
    #[display("export_data")]
    ExportData,
}

/// Attributes of the resource being accessed.
#[derive(Debug, Clone, Default)]
pub struct Resource {
    /// Collection the action targets, when applicable
    pub collection: Option<String>,
    /// Owning team tag, when applicable
    pub team: Option<String>,
}

/// The RBAC + ABAC policy evaluator.
pub struct AccessControl {
    service_whitelist: HashSet<String>,
    business_hours: (NaiveTime, NaiveTime),
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessControl {
    /// Evaluator with the default service whitelist and 09:00–18:00
    /// business hours.
    #[must_use]
    pub fn new() -> Self {
        Self {
            service_whitelist: SERVICE_WHITELIST.iter().map(|s| (*s).to_owned()).collect(),
            business_hours: (
                NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            ),
        }
    }

    /// Check whether the caller may perform `action` on `resource`.
    /// Returns the decision and a reason string for audit.
    #[must_use]
    pub fn check_permission(
        &self,
        ctx: &UserContext,
        resource: &Resource,
        action: ResourceAction,
    ) -> (bool, String) {
        self.check_permission_at(ctx, resource, action, now_local_time())
    }

    /// Same as [`AccessControl::check_permission`] with an explicit wall
    /// clock, for deterministic evaluation.
    #[must_use]
    pub fn check_permission_at(
        &self,
        ctx: &UserContext,
        resource: &Resource,
        action: ResourceAction,
        now: NaiveTime,
    ) -> (bool, String) {
        // Service-to-service trust is a whitelist, then plain RBAC.
        if ctx.auth == AuthMethod::ApiKey {
            if !self.service_whitelist.contains(&ctx.user_id) {
                tracing::warn!(service = %ctx.user_id, "unknown service denied");
                return (false, "unknown_service".to_owned());
            }
            if rbac_allows(Role::Service, action) {
                return (true, format!("service_auth:{}", ctx.user_id));
            }
            return (false, format!("rbac_denied:{}", Role::Service));
        }

        let rbac_allowed = rbac_allows(ctx.role, action);

        if let Some((decision, reason)) = self.check_abac(ctx, resource, now) {
            return (decision, reason);
        }

        if rbac_allowed {
            (true, format!("rbac:{}", ctx.role))
        } else {
            (false, format!("rbac_denied:{}", ctx.role))
        }
    }

    /// ABAC overlays; `Some` short-circuits the RBAC fallback.
    fn check_abac(
        &self,
        ctx: &UserContext,
        resource: &Resource,
        now: NaiveTime,
    ) -> Option<(bool, String)> {
        // Team isolation: non-admins with a team attribute only touch
        // resources of their own team or "public".
        if ctx.role != Role::Admin
            && let Some(resource_team) = &resource.team
            && resource_team != "public"
            && ctx.team.as_deref() != Some(resource_team.as_str())
        {
            return Some((
                false,
                format!(
                    "abac:team_mismatch(user={}, res={resource_team})",
                    ctx.team.as_deref().unwrap_or("none")
                ),
            ));
        }

        // Contractors are denied outside business hours.
        if ctx.is_contractor {
            let (start, end) = self.business_hours;
            if now < start || now > end {
                return Some((false, "abac:outside_business_hours".to_owned()));
            }
        }

        // Break-the-glass: grants, with a warn-level trace for the audit log.
        if ctx.emergency_access {
            tracing::warn!(user = %ctx.user_id, "EMERGENCY ACCESS used");
            return Some((true, "abac:emergency_access".to_owned()));
        }

        None
    }
}

fn rbac_allows(role: Role, action: ResourceAction) -> bool {
    use ResourceAction as A;
    match role {
        Role::Admin => true,
        Role::Engineer => matches!(action, A::Read | A::Write | A::Delete | A::Search),
        Role::Analyst => matches!(action, A::Read | A::Search),
        Role::Viewer => matches!(action, A::Read),
        Role::Service => matches!(action, A::Read | A::Write),
        Role::Guest => matches!(action, A::Read | A::Search),
    }
}

fn now_local_time() -> NaiveTime {
    let now = chrono::Local::now();
    NaiveTime::from_hms_opt(now.hour(), now.minute(), now.second()).unwrap_or_default()
}
