// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veriflow Labs

//! User roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, including system statistics and audit queries
/// - `Applicant` - Normal user, can only work with their own sessions
/// - `Auditor` - Read-only access to the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Normal user going through verification
    Applicant,
    /// Read-only audit access
    Auditor,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            // Admin can do anything
            (Role::Admin, _) => true,
            (Role::Applicant, Role::Applicant) => true,
            (Role::Auditor, Role::Auditor) => true,
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive).
    /// Used when extracting the role claim from a JWT.
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "applicant" => Some(Role::Applicant),
            "auditor" => Some(Role::Auditor),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is Applicant (least privilege for authenticated users).
    fn default() -> Self {
        Role::Applicant
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Applicant => write!(f, "applicant"),
            Role::Auditor => write!(f, "auditor"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_all_privileges() {
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(Role::Admin.has_privilege(Role::Applicant));
        assert!(Role::Admin.has_privilege(Role::Auditor));
    }

    #[test]
    fn applicant_only_has_applicant_privilege() {
        assert!(!Role::Applicant.has_privilege(Role::Admin));
        assert!(Role::Applicant.has_privilege(Role::Applicant));
        assert!(!Role::Applicant.has_privilege(Role::Auditor));
    }

    #[test]
    fn auditor_cannot_act_as_applicant() {
        assert!(!Role::Auditor.has_privilege(Role::Applicant));
        assert!(Role::Auditor.has_privilege(Role::Auditor));
    }

    #[test]
    fn from_str_parses_correctly() {
        assert_eq!(Role::from_str("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_str("Applicant"), Some(Role::Applicant));
        assert_eq!(Role::from_str("unknown"), None);
    }

    #[test]
    fn default_role_is_applicant() {
        assert_eq!(Role::default(), Role::Applicant);
    }
}
