//! Standard hospital policies.
//!
//! Each permission class the web layer checks is expressed here as policy
//! text over the attribute names from [`crate::attributes::names`]. The texts
//! are compiled like any other policy; the tests below make sure they always
//! do.

use serde::Serialize;

/// A named policy text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamedPolicy {
    /// Stable identifier, e.g. `"clinical-staff"`.
    pub name: &'static str,
    pub description: &'static str,
    pub text: &'static str,
}

/// Pre-built policies for the hospital's roles.
pub struct StandardPolicies;

impl StandardPolicies {
    /// Administrators only.
    pub const ADMIN_ONLY: &'static str = r#"role == "Admin""#;

    /// Doctors, nurses and lab technicians.
    pub const CLINICAL_STAFF: &'static str =
        r#"role == "Doctor" OR role == "Nurse" OR role == "LabTech""#;

    /// Who may place lab orders: administrators, doctors and nurses.
    pub const ORDER_LABS: &'static str =
        r#"role == "Admin" OR role == "Doctor" OR role == "Nurse""#;

    /// Every recognised staff role may view patients.
    pub const VIEW_PATIENTS: &'static str = r#"role == "Admin" OR role == "Doctor" OR role == "Nurse" OR role == "LabTech" OR role == "Receptionist""#;

    /// Administrators, or the staff member who owns the record.
    pub const OWNER_OR_ADMIN: &'static str = r#"role == "Admin" OR resource.is_owner == true"#;

    /// Medical records: doctors in the owning department with clearance of
    /// at least 3, or administrators.
    pub const SENSITIVE_RECORD: &'static str = r#"role == "Admin" OR (role == "Doctor" AND resource.same_department == true AND clearance >= 3)"#;

    /// All standard policies, in display order.
    pub fn all() -> [NamedPolicy; 6] {
        [
            NamedPolicy {
                name: "admin-only",
                description: "Administrators only",
                text: Self::ADMIN_ONLY,
            },
            NamedPolicy {
                name: "clinical-staff",
                description: "Doctors, nurses and lab technicians",
                text: Self::CLINICAL_STAFF,
            },
            NamedPolicy {
                name: "order-labs",
                description: "Staff allowed to place lab orders",
                text: Self::ORDER_LABS,
            },
            NamedPolicy {
                name: "view-patients",
                description: "Any recognised staff role",
                text: Self::VIEW_PATIENTS,
            },
            NamedPolicy {
                name: "owner-or-admin",
                description: "Record owner or an administrator",
                text: Self::OWNER_OR_ADMIN,
            },
            NamedPolicy {
                name: "sensitive-record",
                description: "Same-department doctors with clearance >= 3, or administrators",
                text: Self::SENSITIVE_RECORD,
            },
        ]
    }

    /// Looks a standard policy up by its `name`.
    pub fn by_name(name: &str) -> Option<NamedPolicy> {
        Self::all().into_iter().find(|p| p.name == name)
    }
}
