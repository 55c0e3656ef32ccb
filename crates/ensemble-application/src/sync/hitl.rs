use ensemble_core::task::TaskSpec;
use serde::Serialize;

/// A plan held back for human review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingPlan {
    pub session_id: String,
    pub tasks: Vec<TaskSpec>,
}

/// Human-in-the-loop checkpoint between "plan proposed" and "plan executing".
///
/// The gate only buffers. Approving is a two-step protocol run by the
/// synchronizer: clear the gate, then revise the registry with the plan.
#[derive(Debug, Default, Clone)]
pub struct HitlGate {
    pending_plan: Option<PendingPlan>,
    is_waiting_for_approval: bool,
}

impl HitlGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers a plan and starts waiting for approval.
    ///
    /// A plan already waiting is replaced.
    pub fn set_pending_plan(&mut self, session_id: &str, tasks: Vec<TaskSpec>) {
        if self.pending_plan.is_some() {
            tracing::debug!("[HitlGate] Replacing plan already awaiting approval");
        }
        self.pending_plan = Some(PendingPlan {
            session_id: session_id.to_string(),
            tasks,
        });
        self.is_waiting_for_approval = true;
    }

    /// Empties the buffer and stops waiting, handing back the buffered plan.
    pub fn clear_pending_plan(&mut self) -> Option<PendingPlan> {
        self.is_waiting_for_approval = false;
        self.pending_plan.take()
    }

    pub fn pending_plan(&self) -> Option<&PendingPlan> {
        self.pending_plan.as_ref()
    }

    pub fn is_waiting_for_approval(&self) -> bool {
        self.is_waiting_for_approval
    }
}
