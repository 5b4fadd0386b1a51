//! Request attributes for hospital authorization.
//!
//! Two categories feed every decision:
//! - **Principal**: the authenticated staff member (role, department,
//!   clearance, user id)
//! - **Resource**: the record being touched (type, owning department, owner)
//!
//! Policies can only compare an attribute with a literal, so relations
//! between the two sides are precomputed here as booleans
//! (`resource.same_department`, `resource.is_owner`).

use serde::{Deserialize, Serialize};

use crate::context::AttributeContext;
use crate::error::ContextError;

/// Conventional attribute names written by [`AttributeContext::for_request`].
pub mod names {
    pub const ROLE: &str = "role";
    pub const DEPARTMENT: &str = "department";
    pub const CLEARANCE: &str = "clearance";
    pub const USER_ID: &str = "user_id";
    pub const RESOURCE_TYPE: &str = "resource.type";
    pub const RESOURCE_DEPARTMENT: &str = "resource.department";
    pub const RESOURCE_OWNER: &str = "resource.owner";
    pub const SAME_DEPARTMENT: &str = "resource.same_department";
    pub const IS_OWNER: &str = "resource.is_owner";
}

// ============================================================================
// Role
// ============================================================================

/// Hospital staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Hospital administration. Manages accounts and sees everything.
    Admin,
    Doctor,
    Nurse,
    /// Laboratory technician. Processes orders and records results.
    LabTech,
    /// Front desk. Registers patients and books appointments.
    Receptionist,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::LabTech,
        Role::Receptionist,
    ];

    /// The string stored under the `role` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
            Role::LabTech => "LabTech",
            Role::Receptionist => "Receptionist",
        }
    }

    /// Doctors, nurses and lab technicians.
    pub fn is_clinical(self) -> bool {
        matches!(self, Role::Doctor | Role::Nurse | Role::LabTech)
    }

    /// Parses a role name, ignoring case and `_`/`-` separators
    /// (`lab_tech`, `LabTech` and `LAB-TECH` all match).
    pub fn parse(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(&normalized))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Principal
// ============================================================================

/// The authenticated user making the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
    pub department: Option<String>,
    /// Higher is more trusted. Absent means the attribute is not set and
    /// any clearance comparison is false.
    pub clearance: Option<i64>,
}

impl Principal {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self {
            user_id,
            role,
            department: None,
            clearance: None,
        }
    }

    pub fn with_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    pub fn with_clearance(mut self, clearance: i64) -> Self {
        self.clearance = Some(clearance);
        self
    }
}

// ============================================================================
// Resource Attributes
// ============================================================================

/// The record being accessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAttributes {
    /// e.g. `"patient"`, `"lab_order"`, `"medical_record"`.
    pub resource_type: String,
    pub department: Option<String>,
    /// User id of the owning staff member, if the record has one.
    pub owner: Option<i64>,
}

impl ResourceAttributes {
    pub fn new(resource_type: &str) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            department: None,
            owner: None,
        }
    }

    pub fn with_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    pub fn with_owner(mut self, owner: i64) -> Self {
        self.owner = Some(owner);
        self
    }
}

// ============================================================================
// Context Population
// ============================================================================

impl AttributeContext {
    /// Builds a context for one request from the principal and, if the
    /// request targets a specific record, the resource.
    ///
    /// Optional fields that are `None` are left absent. The relation
    /// attributes are only set when both sides are known.
    ///
    /// Uses the default capacity; see
    /// [`PolicyEngine::context_for_request`](crate::PolicyEngine::context_for_request)
    /// for an engine's configured bound.
    pub fn for_request(
        principal: &Principal,
        resource: Option<&ResourceAttributes>,
    ) -> Result<Self, ContextError> {
        Self::for_request_in(Self::new(), principal, resource)
    }

    /// Populates `ctx`, keeping its capacity.
    pub(crate) fn for_request_in(
        mut ctx: Self,
        principal: &Principal,
        resource: Option<&ResourceAttributes>,
    ) -> Result<Self, ContextError> {
        ctx.set(names::ROLE, principal.role.as_str())?;
        ctx.set(names::USER_ID, principal.user_id)?;
        if let Some(department) = &principal.department {
            ctx.set(names::DEPARTMENT, department.as_str())?;
        }
        if let Some(clearance) = principal.clearance {
            ctx.set(names::CLEARANCE, clearance)?;
        }

        let Some(resource) = resource else {
            return Ok(ctx);
        };

        ctx.set(names::RESOURCE_TYPE, resource.resource_type.as_str())?;
        if let Some(department) = &resource.department {
            ctx.set(names::RESOURCE_DEPARTMENT, department.as_str())?;
            if let Some(own) = &principal.department {
                ctx.set(names::SAME_DEPARTMENT, own == department)?;
            }
        }
        if let Some(owner) = resource.owner {
            ctx.set(names::RESOURCE_OWNER, owner)?;
            ctx.set(names::IS_OWNER, owner == principal.user_id)?;
        }
        Ok(ctx)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AttributeValue;

    #[test]
    fn test_role_strings() {
        assert_eq!(Role::LabTech.as_str(), "LabTech");
        assert_eq!(Role::Receptionist.to_string(), "Receptionist");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("doctor"), Some(Role::Doctor));
        assert_eq!(Role::parse("lab_tech"), Some(Role::LabTech));
        assert_eq!(Role::parse("LAB-TECH"), Some(Role::LabTech));
        assert_eq!(Role::parse("janitor"), None);
    }

    #[test]
    fn test_clinical_roles() {
        let clinical: Vec<Role> = Role::ALL.into_iter().filter(|r| r.is_clinical()).collect();
        assert_eq!(clinical, vec![Role::Doctor, Role::Nurse, Role::LabTech]);
    }

    #[test]
    fn test_principal_only() {
        let principal = Principal::new(7, Role::Nurse).with_department("Cardiology");
        let ctx = AttributeContext::for_request(&principal, None).unwrap();

        assert_eq!(ctx.get(names::ROLE), Some(&AttributeValue::from("Nurse")));
        assert_eq!(ctx.get(names::USER_ID), Some(&AttributeValue::Integer(7)));
        assert_eq!(
            ctx.get(names::DEPARTMENT),
            Some(&AttributeValue::from("Cardiology"))
        );
        assert!(!ctx.contains(names::CLEARANCE));
        assert!(!ctx.contains(names::RESOURCE_TYPE));
    }

    #[test]
    fn test_relations_computed() {
        let principal = Principal::new(7, Role::Doctor)
            .with_department("Cardiology")
            .with_clearance(3);
        let resource = ResourceAttributes::new("medical_record")
            .with_department("Cardiology")
            .with_owner(9);
        let ctx = AttributeContext::for_request(&principal, Some(&resource)).unwrap();

        assert_eq!(
            ctx.get(names::SAME_DEPARTMENT),
            Some(&AttributeValue::Boolean(true))
        );
        assert_eq!(ctx.get(names::IS_OWNER), Some(&AttributeValue::Boolean(false)));
        assert_eq!(ctx.get(names::RESOURCE_OWNER), Some(&AttributeValue::Integer(9)));
        assert_eq!(ctx.get(names::CLEARANCE), Some(&AttributeValue::Integer(3)));
    }

    #[test]
    fn test_relation_absent_when_side_unknown() {
        let principal = Principal::new(7, Role::Doctor);
        let resource = ResourceAttributes::new("patient").with_department("Oncology");
        let ctx = AttributeContext::for_request(&principal, Some(&resource)).unwrap();

        assert!(ctx.contains(names::RESOURCE_DEPARTMENT));
        assert!(!ctx.contains(names::SAME_DEPARTMENT));
        assert!(!ctx.contains(names::IS_OWNER));
    }
}
