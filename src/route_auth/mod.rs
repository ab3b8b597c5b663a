// ABOUTME: Runtime switch for authentication enforcement on CRM API routes
// ABOUTME: Route construction asks RouteAuthPolicy for identity instead of hard-coding placeholders

pub mod patcher;

use crate::error::AdminError;
use crate::seed::{DEV_TENANT_ID, DEV_USER_ID};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use patcher::{patch_route_files, patch_route_source, FileReport, PatchOutcome};

/// Whether routes require a verified identity.
///
/// Read from `CRM_AUTH_MODE` (`enforced` or `dev-bypass`) at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Enforced,
    DevBypass,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Enforced => write!(f, "enforced"),
            AuthMode::DevBypass => write!(f, "dev-bypass"),
        }
    }
}

impl FromStr for AuthMode {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforced" | "on" | "true" => Ok(AuthMode::Enforced),
            "dev-bypass" | "dev_bypass" | "off" | "false" => Ok(AuthMode::DevBypass),
            other => Err(AdminError::malformed(format!(
                "Unknown auth mode '{}'. Expected 'enforced' or 'dev-bypass'",
                other
            ))),
        }
    }
}

/// Identity established by the authentication middleware for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: String,
    pub organization_id: Option<String>,
}

/// Identity a route handler acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub organization_id: String,
    pub user_id: String,
    /// True when the identity is the development placeholder rather than a verified one.
    pub placeholder: bool,
}

/// Membership roles within an organization, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrganizationRole {
    Viewer,
    Billing,
    Member,
    Admin,
    Owner,
}

impl fmt::Display for OrganizationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrganizationRole::Viewer => "viewer",
            OrganizationRole::Billing => "billing",
            OrganizationRole::Member => "member",
            OrganizationRole::Admin => "admin",
            OrganizationRole::Owner => "owner",
        };
        f.write_str(name)
    }
}

impl FromStr for OrganizationRole {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(OrganizationRole::Viewer),
            "billing" => Ok(OrganizationRole::Billing),
            "member" => Ok(OrganizationRole::Member),
            "admin" => Ok(OrganizationRole::Admin),
            "owner" => Ok(OrganizationRole::Owner),
            other => Err(AdminError::malformed(format!(
                "Unknown organization role '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteAuthError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("User {0} is not associated with an organization")]
    NoOrganization(String),
    #[error("Insufficient permissions. Required role: {required}")]
    InsufficientRole { required: OrganizationRole },
}

/// Policy consumed when the API router is built.
#[derive(Debug, Clone, Copy)]
pub struct RouteAuthPolicy {
    mode: AuthMode,
}

impl RouteAuthPolicy {
    pub fn new(mode: AuthMode) -> Self {
        if mode == AuthMode::DevBypass {
            tracing::warn!(
                "⚠ Route authentication is bypassed; requests run as the development placeholder identity"
            );
        }
        Self { mode }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Whether the router must register the authentication middleware.
    pub fn requires_authentication(&self) -> bool {
        self.mode == AuthMode::Enforced
    }

    /// Whether per-route `requireOrganizationRole` checks must run.
    pub fn requires_role_check(&self) -> bool {
        self.mode == AuthMode::Enforced
    }

    /// Check the caller's membership role against the role a route requires.
    ///
    /// Unknown or absent roles rank below every known role. `DevBypass` admits
    /// every caller.
    pub fn authorize_role(
        &self,
        member_role: Option<&str>,
        required: OrganizationRole,
    ) -> Result<(), RouteAuthError> {
        if !self.requires_role_check() {
            return Ok(());
        }
        let granted = member_role.and_then(|role| role.parse::<OrganizationRole>().ok());
        match granted {
            Some(role) if role >= required => Ok(()),
            _ => Err(RouteAuthError::InsufficientRole { required }),
        }
    }

    /// Resolve the identity for a request.
    ///
    /// A verified identity always wins. Without one, `Enforced` rejects the request
    /// and `DevBypass` falls back to the seeded development tenant and user.
    pub fn resolve(
        &self,
        verified: Option<&VerifiedIdentity>,
    ) -> Result<RequestIdentity, RouteAuthError> {
        match (verified, self.mode) {
            (Some(identity), _) => {
                let organization_id = identity
                    .organization_id
                    .clone()
                    .ok_or_else(|| RouteAuthError::NoOrganization(identity.user_id.clone()))?;
                Ok(RequestIdentity {
                    organization_id,
                    user_id: identity.user_id.clone(),
                    placeholder: false,
                })
            }
            (None, AuthMode::Enforced) => Err(RouteAuthError::Unauthenticated),
            (None, AuthMode::DevBypass) => Ok(RequestIdentity {
                organization_id: DEV_TENANT_ID.to_string(),
                user_id: DEV_USER_ID.to_string(),
                placeholder: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verified() -> VerifiedIdentity {
        VerifiedIdentity {
            user_id: "8a3c0b8e-0000-4000-8000-000000000042".into(),
            organization_id: Some("8a3c0b8e-0000-4000-8000-000000000007".into()),
        }
    }

    #[test]
    fn parses_modes() {
        assert_eq!("enforced".parse::<AuthMode>().unwrap(), AuthMode::Enforced);
        assert_eq!("DEV-BYPASS".parse::<AuthMode>().unwrap(), AuthMode::DevBypass);
        assert_eq!(" off ".parse::<AuthMode>().unwrap(), AuthMode::DevBypass);
        assert!("maybe".parse::<AuthMode>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for mode in [AuthMode::Enforced, AuthMode::DevBypass] {
            assert_eq!(mode.to_string().parse::<AuthMode>().unwrap(), mode);
        }
    }

    #[test]
    fn enforced_requires_verified_identity() {
        let policy = RouteAuthPolicy::new(AuthMode::Enforced);
        assert!(policy.requires_authentication());
        assert_eq!(policy.resolve(None), Err(RouteAuthError::Unauthenticated));

        let identity = policy.resolve(Some(&verified())).unwrap();
        assert_eq!(identity.user_id, "8a3c0b8e-0000-4000-8000-000000000042");
        assert_eq!(identity.organization_id, "8a3c0b8e-0000-4000-8000-000000000007");
        assert!(!identity.placeholder);
    }

    #[test]
    fn enforced_rejects_identity_without_organization() {
        let policy = RouteAuthPolicy::new(AuthMode::Enforced);
        let mut identity = verified();
        identity.organization_id = None;
        assert!(matches!(
            policy.resolve(Some(&identity)),
            Err(RouteAuthError::NoOrganization(_))
        ));
    }

    #[test]
    fn dev_bypass_falls_back_to_seeded_identity() {
        let policy = RouteAuthPolicy::new(AuthMode::DevBypass);
        assert!(!policy.requires_authentication());

        let identity = policy.resolve(None).unwrap();
        assert_eq!(identity.organization_id, DEV_TENANT_ID);
        assert_eq!(identity.user_id, DEV_USER_ID);
        assert!(identity.placeholder);

        // A real identity is still preferred when one is present
        let identity = policy.resolve(Some(&verified())).unwrap();
        assert!(!identity.placeholder);
    }

    #[test]
    fn enforced_checks_role_hierarchy() {
        let policy = RouteAuthPolicy::new(AuthMode::Enforced);
        assert!(policy.requires_role_check());

        assert!(policy.authorize_role(Some("owner"), OrganizationRole::Admin).is_ok());
        assert!(policy.authorize_role(Some("member"), OrganizationRole::Member).is_ok());
        assert_eq!(
            policy.authorize_role(Some("viewer"), OrganizationRole::Member),
            Err(RouteAuthError::InsufficientRole {
                required: OrganizationRole::Member
            })
        );
        assert!(policy.authorize_role(Some("superuser"), OrganizationRole::Viewer).is_err());
        assert!(policy.authorize_role(None, OrganizationRole::Viewer).is_err());
    }

    #[test]
    fn dev_bypass_skips_role_checks() {
        let policy = RouteAuthPolicy::new(AuthMode::DevBypass);
        assert!(!policy.requires_role_check());
        assert!(policy.authorize_role(None, OrganizationRole::Owner).is_ok());
    }
}
