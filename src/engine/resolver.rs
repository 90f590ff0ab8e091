//! Auditor resolution: turn a node's auditor declaration into a concrete,
//! deduplicated list of approver identities.

use crate::domain::{EmpId, LinkKind, ProcessId, SYS_DIRECTOR, SYS_MANAGER, SYS_REQUESTER};
use crate::error::EngineResult;

use super::Engine;

impl Engine {
    /// Resolve the approvers declared at `process_id` for a request raised
    /// by `requester`.
    ///
    /// Precedence: a `Sys` link maps its sentinel to a single identity, an
    /// `Emp` link is taken verbatim, a `Dept` link resolves to each
    /// department's director. An empty result means "no one to assign" and
    /// is the caller's decision to treat as fatal or as the auto-advance
    /// case. A `Sys` link pointing at an unset requester department also
    /// resolves empty.
    pub(crate) async fn resolve_auditors(
        &self,
        requester: EmpId,
        process_id: ProcessId,
    ) -> EngineResult<Vec<EmpId>> {
        let links = self.flows.links_from(process_id).await?;

        if let Some(sys) = links.iter().find(|l| l.kind == LinkKind::Sys) {
            let ids: Vec<EmpId> = match sys.sys_code() {
                Some(SYS_REQUESTER) => vec![requester],
                Some(SYS_DIRECTOR) => self
                    .requester_dept(requester)
                    .await?
                    .map(|d| d.director_id)
                    .into_iter()
                    .collect(),
                Some(SYS_MANAGER) => self
                    .requester_dept(requester)
                    .await?
                    .map(|d| d.manager_id)
                    .into_iter()
                    .collect(),
                _ => Vec::new(),
            };
            return Ok(dedupe(ids));
        }

        if let Some(emp_link) = links.iter().find(|l| l.kind == LinkKind::Emp) {
            return Ok(dedupe(emp_link.auditor_emp_ids()));
        }

        if let Some(dept_link) = links.iter().find(|l| l.kind == LinkKind::Dept) {
            let mut ids: Vec<EmpId> = Vec::new();
            for dept_id in dept_link.auditor_dept_ids() {
                if let Some(dept) = self.directory.dept(dept_id).await? {
                    ids.push(dept.director_id);
                }
            }
            return Ok(dedupe(ids));
        }

        Ok(Vec::new())
    }

    /// The requester's department, if the requester belongs to one.
    async fn requester_dept(
        &self,
        requester: EmpId,
    ) -> EngineResult<Option<crate::domain::Dept>> {
        let Some(emp) = self.directory.emp(requester).await? else {
            return Ok(None);
        };
        match emp.dept_id {
            Some(dept_id) => self.directory.dept(dept_id).await,
            None => Ok(None),
        }
    }
}

fn dedupe(ids: Vec<EmpId>) -> Vec<EmpId> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
