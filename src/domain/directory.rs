//! Organization directory types consumed during auditor resolution.

use serde::{Deserialize, Serialize};

use super::{DeptId, EmpId};

/// An employee. `dept_id` is `None` for staff not attached to a department;
/// `Sys` director/manager resolution yields nothing for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emp {
    pub id: EmpId,
    pub name: String,
    pub dept_id: Option<DeptId>,
}

/// A department with its responsible staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dept {
    pub id: DeptId,
    pub name: String,
    pub director_id: EmpId,
    pub manager_id: EmpId,
}
