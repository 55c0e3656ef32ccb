use super::*;
use chrono::TimeZone;
use ensemble_core::EnsembleError;
use ensemble_core::session::{PersistedSession, PersistedSubTask};
use ensemble_core::task::{SourceRef, TaskStatus};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn spec(id: &str, sort_order: i64) -> TaskSpec {
    TaskSpec::new(id, "researcher", format!("task {id}"), sort_order)
}

fn proposed(session_id: &str, tasks: Vec<TaskSpec>) -> ExecutionEvent {
    ExecutionEvent::PlanProposed {
        session: SessionDescriptor::new(session_id, "compare options"),
        tasks,
    }
}

fn started(session_id: &str, task_id: &str, secs: i64) -> ExecutionEvent {
    ExecutionEvent::TaskStarted {
        session_id: session_id.to_string(),
        task_id: task_id.to_string(),
        started_at: at(secs),
    }
}

fn completed(
    session_id: &str,
    task_id: &str,
    output: Option<TaskOutput>,
    artifacts: Vec<Artifact>,
) -> ExecutionEvent {
    ExecutionEvent::TaskCompleted {
        session_id: session_id.to_string(),
        task_id: task_id.to_string(),
        completed_at: at(10),
        duration_ms: None,
        output,
        artifacts,
    }
}

fn failed(session_id: &str, task_id: &str) -> ExecutionEvent {
    ExecutionEvent::TaskFailed {
        session_id: session_id.to_string(),
        task_id: task_id.to_string(),
        error: "expert crashed".to_string(),
    }
}

fn ids(sync: &Synchronizer) -> Vec<String> {
    sync.registry().tasks().iter().map(|t| t.id.clone()).collect()
}

fn running(sync: &Synchronizer) -> Vec<String> {
    sync.selection().running_task_ids().iter().cloned().collect()
}

/// Checks that the running set mirrors task statuses exactly.
fn assert_running_in_sync(sync: &Synchronizer) {
    assert_eq!(
        sync.selection().running_task_ids(),
        &sync.registry().running_task_ids()
    );
}

#[test]
fn test_plan_start_complete_with_citations() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("B", 1), spec("A", 0)]));
    assert_eq!(ids(&sync), vec!["A", "B"]);

    sync.apply(started("S1", "A", 0));
    assert_eq!(running(&sync), vec!["A"]);

    let output = TaskOutput::Cited {
        content: "done".to_string(),
        source: vec![SourceRef {
            title: "x".to_string(),
            url: "http://x".to_string(),
        }],
    };
    sync.apply(completed(
        "S1",
        "A",
        Some(output),
        vec![Artifact::new("document", "report", "# Report")],
    ));

    let task = sync.registry().task("A").unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(
        task.output.as_deref(),
        Some("done\n\n---\n**Sources:**\n> 1. [x](http://x)\n")
    );
    assert!(running(&sync).is_empty());
    assert_eq!(sync.selection().selected_task_id(), Some("A"));
}

#[test]
fn test_completion_without_artifacts_does_not_focus() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    sync.apply(started("S1", "A", 0));
    sync.apply(completed("S1", "A", Some("plain".into()), vec![]));

    assert_eq!(sync.selection().selected_task_id(), None);
    assert_eq!(sync.registry().task("A").unwrap().output.as_deref(), Some("plain"));
}

#[test]
fn test_auto_focus_keeps_existing_selection() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0), spec("B", 1)]));
    sync.select_task(Some("B".to_string()));
    sync.apply(started("S1", "A", 0));
    sync.apply(completed("S1", "A", None, vec![Artifact::new("code", "main.rs", "fn main() {}")]));

    assert_eq!(sync.selection().selected_task_id(), Some("B"));
}

#[test]
fn test_auto_focus_can_be_disabled() {
    let config = SyncConfig {
        auto_focus_on_artifacts: false,
        ..SyncConfig::default()
    };
    let mut sync = Synchronizer::new(config);
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    sync.apply(started("S1", "A", 0));
    sync.apply(completed("S1", "A", None, vec![Artifact::new("code", "x", "y")]));

    assert_eq!(sync.selection().selected_task_id(), None);
}

#[test]
fn test_artifact_events_accumulate_before_completion() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    sync.apply(started("S1", "A", 0));

    let streamed = Artifact::new("search_result", "hits", "...");
    sync.apply(ExecutionEvent::TaskArtifact {
        session_id: "S1".to_string(),
        task_id: "A".to_string(),
        artifact: streamed.clone(),
    });
    // Re-delivered with the completion payload.
    sync.apply(completed("S1", "A", None, vec![streamed]));

    assert_eq!(sync.registry().task("A").unwrap().artifacts.len(), 1);
    assert_eq!(sync.selection().selected_task_id(), Some("A"));
}

#[test]
fn test_refused_completion_leaves_no_trace() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0), spec("B", 1)]));
    let version = sync.version();

    // Pending task: completion is not a valid edge.
    sync.apply(completed("S1", "A", Some("early".into()), vec![Artifact::new("code", "x", "y")]));
    let task = sync.registry().task("A").unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.artifacts.is_empty());
    assert!(task.output.is_none());
    assert_eq!(sync.version(), version);
    assert_eq!(sync.selection().selected_task_id(), None);

    // Duplicate completion after the real one.
    sync.apply(started("S1", "B", 0));
    sync.apply(completed("S1", "B", None, vec![]));
    let version = sync.version();
    sync.apply(completed("S1", "B", None, vec![Artifact::new("code", "late", "z")]));
    assert!(sync.registry().task("B").unwrap().artifacts.is_empty());
    assert_eq!(sync.version(), version);
}

#[test]
fn test_failure_clears_running_and_keeps_session_running() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0), spec("B", 1)]));
    sync.apply(started("S1", "A", 0));
    sync.apply(failed("S1", "A"));

    assert!(running(&sync).is_empty());
    let task = sync.registry().task("A").unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error.as_deref(), Some("expert crashed"));
    assert_eq!(
        sync.registry().session().unwrap().status,
        SessionStatus::Running
    );
}

#[test]
fn test_running_set_tracks_every_event_sequence() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0), spec("B", 1), spec("C", 2)]));

    let events = vec![
        started("S1", "A", 0),
        started("S1", "A", 1),
        started("S1", "B", 2),
        completed("S1", "C", None, vec![]),
        failed("S1", "B"),
        started("S1", "B", 3),
        completed("S1", "A", None, vec![]),
        completed("S1", "A", None, vec![]),
        failed("S1", "A"),
        started("S1", "ghost", 4),
    ];
    for event in events {
        sync.apply(event);
        assert_running_in_sync(&sync);
    }

    let registry = sync.registry();
    assert_eq!(registry.task("A").unwrap().status, TaskStatus::Completed);
    assert_eq!(registry.task("B").unwrap().status, TaskStatus::Failed);
    assert_eq!(registry.task("C").unwrap().status, TaskStatus::Pending);
}

#[test]
fn test_events_for_other_sessions_are_ignored() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    let version = sync.version();

    sync.apply(started("OLD", "A", 0));
    sync.apply(failed("OLD", "A"));
    sync.apply(ExecutionEvent::PlanRevised {
        session_id: "OLD".to_string(),
        tasks: vec![spec("Z", 0)],
    });

    assert_eq!(sync.version(), version);
    assert_eq!(sync.registry().task("A").unwrap().status, TaskStatus::Pending);
    assert!(running(&sync).is_empty());
}

#[test]
fn test_new_session_replaces_previous_run() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0), spec("B", 1)]));
    sync.apply(started("S1", "A", 0));
    sync.select_task(Some("B".to_string()));

    sync.apply(proposed("S2", vec![spec("X", 0)]));

    assert_eq!(ids(&sync), vec!["X"]);
    assert_eq!(sync.registry().session().unwrap().session_id, "S2");
    assert!(running(&sync).is_empty());
    assert_eq!(sync.selection().selected_task_id(), None);
}

#[test]
fn test_same_session_proposal_merges_mid_run() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0), spec("B", 1)]));
    sync.apply(started("S1", "A", 0));

    sync.apply(proposed("S1", vec![spec("A", 5), spec("C", 1)]));

    assert_eq!(ids(&sync), vec!["C", "A"]);
    assert_eq!(sync.registry().task("A").unwrap().status, TaskStatus::Running);
    assert_eq!(running(&sync), vec!["A"]);
}

#[test]
fn test_revision_prunes_and_drops_stale_selection() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0), spec("B", 1)]));
    sync.apply(started("S1", "A", 0));
    sync.apply(completed("S1", "A", None, vec![]));
    sync.apply(started("S1", "B", 1));
    sync.select_task(Some("B".to_string()));

    sync.apply(ExecutionEvent::PlanRevised {
        session_id: "S1".to_string(),
        tasks: vec![spec("A", 0), spec("C", 1)],
    });

    let registry = sync.registry();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.task("A").unwrap().status, TaskStatus::Completed);
    assert_eq!(registry.task("C").unwrap().status, TaskStatus::Pending);
    assert!(!registry.contains("B"));
    assert!(running(&sync).is_empty());
    assert_eq!(sync.selection().selected_task_id(), None);
}

#[test]
fn test_planning_text_streams_for_its_session() {
    let mut sync = Synchronizer::default();
    sync.apply(ExecutionEvent::PlanStarted {
        session_id: "S1".to_string(),
        title: "Planning".to_string(),
    });
    sync.apply(ExecutionEvent::PlanThinking {
        session_id: "S1".to_string(),
        delta: "...".to_string(),
    });
    sync.apply(ExecutionEvent::PlanThinking {
        session_id: "S9".to_string(),
        delta: "noise".to_string(),
    });

    assert_eq!(sync.planning().content(), "Planning...");
    let session = sync.registry().session().unwrap();
    assert_eq!(session.session_id, "S1");
    assert_eq!(session.status, SessionStatus::Running);
    assert!(sync.registry().is_empty());
}

#[test]
fn test_plan_started_keeps_existing_session() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    sync.start_plan("S2", "Replanning");

    assert_eq!(sync.registry().session().unwrap().session_id, "S1");
    assert_eq!(sync.registry().len(), 1);
    assert_eq!(sync.planning().content(), "Replanning");
}

#[test]
fn test_hitl_approval_applies_buffered_plan() {
    let mut sync = Synchronizer::default();
    sync.apply(ExecutionEvent::PlanApprovalRequested {
        session_id: "S1".to_string(),
        tasks: vec![spec("A", 0), spec("B", 1)],
    });

    assert!(sync.hitl().is_waiting_for_approval());
    assert!(sync.registry().is_empty());
    assert_eq!(
        sync.registry().session().unwrap().status,
        SessionStatus::Pending
    );

    assert!(sync.approve_plan(None));
    assert!(!sync.hitl().is_waiting_for_approval());
    assert_eq!(ids(&sync), vec!["A", "B"]);
    let session = sync.registry().session().unwrap();
    assert_eq!(session.status, SessionStatus::Running);
    assert_eq!(session.estimated_steps, 3);

    assert!(!sync.approve_plan(None));
}

#[test]
fn test_hitl_approval_with_edits() {
    let mut sync = Synchronizer::default();
    sync.apply(ExecutionEvent::PlanApprovalRequested {
        session_id: "S1".to_string(),
        tasks: vec![spec("A", 0), spec("B", 1)],
    });

    assert!(sync.approve_plan(Some(vec![spec("B", 0)])));
    assert_eq!(ids(&sync), vec!["B"]);
}

#[test]
fn test_hitl_rejection_leaves_tasks_untouched() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    sync.apply(ExecutionEvent::PlanApprovalRequested {
        session_id: "S1".to_string(),
        tasks: vec![spec("Z", 0)],
    });
    let version = sync.version();

    assert!(sync.reject_plan());
    assert!(!sync.hitl().is_waiting_for_approval());
    assert_eq!(ids(&sync), vec!["A"]);
    assert_eq!(sync.version(), version);
    assert!(!sync.reject_plan());
}

#[test]
fn test_required_approval_intercepts_proposals() {
    let config = SyncConfig {
        require_plan_approval: true,
        ..SyncConfig::default()
    };
    let mut sync = Synchronizer::new(config);
    sync.apply(proposed("S1", vec![spec("A", 0)]));

    assert!(sync.registry().is_empty());
    assert_eq!(sync.registry().session().unwrap().summary, "compare options");
    assert_eq!(sync.hitl().pending_plan().unwrap().tasks.len(), 1);

    sync.approve_plan(None);
    assert_eq!(ids(&sync), vec!["A"]);
}

#[test]
fn test_replacement_discards_plan_pending_for_old_session() {
    let mut sync = Synchronizer::default();
    sync.apply(ExecutionEvent::PlanApprovalRequested {
        session_id: "S1".to_string(),
        tasks: vec![spec("A", 0)],
    });
    sync.apply(proposed("S2", vec![spec("X", 0)]));

    assert!(!sync.hitl().is_waiting_for_approval());
    assert!(sync.hitl().pending_plan().is_none());
}

#[test]
fn test_session_terminal_status_is_explicit_and_sticky() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    sync.apply(started("S1", "A", 0));
    sync.apply(completed("S1", "A", None, vec![]));
    assert_eq!(
        sync.registry().session().unwrap().status,
        SessionStatus::Running
    );

    sync.apply(ExecutionEvent::SessionCompleted {
        session_id: "S1".to_string(),
    });
    sync.apply(ExecutionEvent::SessionFailed {
        session_id: "S1".to_string(),
        error: Some("late".to_string()),
    });
    assert_eq!(
        sync.registry().session().unwrap().status,
        SessionStatus::Completed
    );
}

#[test]
fn test_reset_refused_while_running() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    sync.apply(started("S1", "A", 0));
    let before = sync.snapshot();

    let err = sync.reset_tasks(false).unwrap_err();
    assert!(matches!(err, EnsembleError::TasksRunning { ref running } if running == &["A"]));
    assert_eq!(sync.version(), before.version);
    assert_eq!(running(&sync), vec!["A"]);

    sync.reset_tasks(true).unwrap();
    assert!(sync.registry().session().is_none());
    assert!(sync.registry().is_empty());
    assert!(running(&sync).is_empty());
}

#[test]
fn test_entering_simple_mode_is_a_full_reset() {
    let mut sync = Synchronizer::default();
    sync.set_mode(RunMode::Complex);
    sync.start_plan("S1", "Planning");
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    sync.apply(started("S1", "A", 0));
    sync.select_task(Some("A".to_string()));

    sync.set_mode(RunMode::Simple);

    let view = sync.snapshot();
    assert_eq!(view.mode, Some(RunMode::Simple));
    assert!(view.session.is_none());
    assert!(view.tasks.is_empty());
    assert!(view.running_task_ids.is_empty());
    assert_eq!(view.selected_task_id, None);
    assert_eq!(view.plan_thinking, "");
}

#[test]
fn test_delete_clears_selection_of_removed_task() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0), spec("B", 1)]));
    sync.select_task(Some("B".to_string()));

    assert!(sync.delete_task("B"));
    assert_eq!(sync.selection().selected_task_id(), None);

    assert!(sync.add_task(spec("C", 2)));
    assert!(sync.update_task(
        "C",
        TaskPatch {
            description: Some("renamed".to_string()),
            ..TaskPatch::default()
        }
    ));
    assert_eq!(sync.registry().task("C").unwrap().description, "renamed");
}

fn persisted(status: TaskStatus, id: &str, sort_order: i64, artifacts: Vec<Artifact>) -> PersistedSubTask {
    PersistedSubTask {
        id: id.to_string(),
        expert_type: "writer".to_string(),
        description: format!("task {id}"),
        status,
        sort_order,
        output: None,
        error: None,
        duration_ms: None,
        started_at: None,
        completed_at: None,
        artifacts,
    }
}

fn persisted_session(session_id: &str) -> PersistedSession {
    PersistedSession {
        session_id: session_id.to_string(),
        summary: "restored".to_string(),
        execution_mode: Default::default(),
        status: SessionStatus::Running,
        estimated_steps: None,
    }
}

#[test]
fn test_hydrate_runs_full_initialization_sequence() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("OLD", vec![spec("Q", 0)]));
    sync.apply(started("OLD", "Q", 0));

    sync.hydrate(SessionSnapshot {
        session: persisted_session("S7"),
        sub_tasks: vec![
            persisted(TaskStatus::Completed, "A", 0, vec![]),
            persisted(
                TaskStatus::Completed,
                "B",
                1,
                vec![Artifact::new("document", "summary", "...")],
            ),
            persisted(TaskStatus::Running, "C", 2, vec![]),
        ],
    });

    let view = sync.snapshot();
    assert_eq!(view.session.as_ref().unwrap().session_id, "S7");
    assert_eq!(view.session.as_ref().unwrap().estimated_steps, 4);
    assert_eq!(view.mode, Some(RunMode::Complex));
    assert!(view.is_initialized);
    assert_eq!(view.selected_task_id.as_deref(), Some("B"));
    assert_eq!(view.running_task_ids.iter().collect::<Vec<_>>(), vec!["C"]);
    assert_eq!(view.selected_task().unwrap().id, "B");
}

#[test]
fn test_hydrate_without_artifacts_selects_first_task() {
    let mut sync = Synchronizer::default();
    sync.hydrate(SessionSnapshot {
        session: persisted_session("S7"),
        sub_tasks: vec![
            persisted(TaskStatus::Pending, "B", 1, vec![]),
            persisted(TaskStatus::Pending, "A", 0, vec![]),
        ],
    });
    assert_eq!(sync.selection().selected_task_id(), Some("A"));
}

#[test]
fn test_snapshot_serializes_for_consumers() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    sync.apply(started("S1", "A", 0));

    let value = serde_json::to_value(sync.snapshot()).unwrap();
    assert_eq!(value["tasks"][0]["id"], "A");
    assert_eq!(value["tasks"][0]["status"], "running");
    assert_eq!(value["running_task_ids"][0], "A");
    assert_eq!(value["progress"]["running"], 1);
    assert_eq!(value["is_waiting_for_approval"], false);
}

#[test]
fn test_snapshot_is_independent_of_later_mutations() {
    let mut sync = Synchronizer::default();
    sync.apply(proposed("S1", vec![spec("A", 0)]));
    let before = sync.snapshot();

    sync.apply(started("S1", "A", 0));
    let after = sync.snapshot();

    assert!(after.version > before.version);
    assert_eq!(before.tasks[0].status, TaskStatus::Pending);
    assert_eq!(after.tasks[0].status, TaskStatus::Running);
    assert!(!Arc::ptr_eq(&before.tasks, &after.tasks));
}
