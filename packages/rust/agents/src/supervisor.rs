//! The supervisor: a fixed research → write → review → revise sequence.
//!
//! ```text
//! START → RESEARCHING → WRITING(0) → REVIEWING(0) → WRITING(1) → DONE
//!                    ↘ any stage error → FAILED
//! ```
//!
//! The feedback loop is capped at [`MAX_REVISIONS`] round-trips; the last
//! draft is returned whatever its critique said.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument};

use newsdesk_shared::tags::{self, StageTag};
use newsdesk_shared::{Draft, Feedback, NewsdeskError, RawInput, Result, RunId};

use crate::stage_failure;
use crate::tools::AgentTools;
use crate::writer::{compose_initial, compose_revision};

/// Writer/reviewer round-trips allowed after the first draft.
pub const MAX_REVISIONS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SupervisorState {
    Start,
    Researching,
    Writing { iteration: u32 },
    Reviewing { iteration: u32 },
    Done,
    Failed,
}

impl SupervisorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => f.write_str("START"),
            Self::Researching => f.write_str("RESEARCHING"),
            Self::Writing { iteration } => write!(f, "WRITING({iteration})"),
            Self::Reviewing { iteration } => write!(f, "REVIEWING({iteration})"),
            Self::Done => f.write_str("DONE"),
            Self::Failed => f.write_str("FAILED"),
        }
    }
}

/// Per-run record, owned by one [`Supervisor::run`] call.
#[derive(Debug, Default)]
pub struct PipelineState {
    pub iteration_count: u32,
    pub last_draft: Option<Draft>,
    pub last_feedback: Option<Feedback>,
}

impl PipelineState {
    /// Record a reviewed draft and move to the next iteration.
    fn record(&mut self, draft: Draft, feedback: Feedback) {
        self.last_draft = Some(draft);
        self.last_feedback = Some(feedback);
        self.iteration_count += 1;
    }

    /// Writer input for the next revision: the last draft and its critique.
    pub fn revision_input(&self) -> Option<String> {
        match (&self.last_draft, &self.last_feedback) {
            (Some(draft), Some(feedback)) => Some(compose_revision(draft, feedback)),
            _ => None,
        }
    }
}

/// Result of one completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: RunId,
    pub session_id: Option<String>,
    /// Final draft text with every stage tag removed.
    pub article: String,
    pub states: Vec<SupervisorState>,
    pub writer_calls: u32,
    pub reviewer_calls: u32,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Progress callback for reporting supervisor transitions.
pub trait StageObserver: Send + Sync {
    /// Called on every state entry.
    fn state(&self, state: SupervisorState);
    /// Called once when the run reaches `DONE`.
    fn done(&self, outcome: &RunOutcome);
    /// Called once when the run reaches `FAILED`.
    fn failed(&self, error: &NewsdeskError);
}

/// No-op observer for headless/test usage.
pub struct SilentObserver;

impl StageObserver for SilentObserver {
    fn state(&self, _state: SupervisorState) {}
    fn done(&self, _outcome: &RunOutcome) {}
    fn failed(&self, _error: &NewsdeskError) {}
}

pub struct Supervisor<'a> {
    tools: &'a dyn AgentTools,
    observer: &'a dyn StageObserver,
    states: Vec<SupervisorState>,
    writer_calls: u32,
    reviewer_calls: u32,
}

impl<'a> Supervisor<'a> {
    pub fn new(tools: &'a dyn AgentTools, observer: &'a dyn StageObserver) -> Self {
        Self {
            tools,
            observer,
            states: Vec::new(),
            writer_calls: 0,
            reviewer_calls: 0,
        }
    }

    /// Run the pipeline to `DONE` or `FAILED`.
    ///
    /// The first stage error ends the run and is returned unchanged; no
    /// later stage is started.
    #[instrument(skip_all, fields(run_id = %run_id, session_id = session_id.unwrap_or("-")))]
    pub async fn run(
        mut self,
        run_id: RunId,
        input: &RawInput,
        session_id: Option<&str>,
    ) -> Result<RunOutcome> {
        let started_at = Utc::now();
        let start = Instant::now();
        info!("starting article pipeline");

        match self.drive(input).await {
            Ok(draft) => {
                self.enter(SupervisorState::Done);
                let outcome = RunOutcome {
                    run_id,
                    session_id: session_id.map(str::to_string),
                    article: tags::strip_all(draft.text()),
                    states: self.states,
                    writer_calls: self.writer_calls,
                    reviewer_calls: self.reviewer_calls,
                    started_at,
                    elapsed: start.elapsed(),
                };
                info!(
                    writer_calls = outcome.writer_calls,
                    reviewer_calls = outcome.reviewer_calls,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "article pipeline complete"
                );
                self.observer.done(&outcome);
                Ok(outcome)
            }
            Err(err) => {
                self.enter(SupervisorState::Failed);
                error!(error = %err, "article pipeline failed");
                self.observer.failed(&err);
                Err(err)
            }
        }
    }

    fn enter(&mut self, state: SupervisorState) {
        info!(state = %state, "entering state");
        self.states.push(state);
        self.observer.state(state);
    }

    async fn drive(&mut self, input: &RawInput) -> Result<Draft> {
        let mut pipeline = PipelineState::default();
        self.enter(SupervisorState::Start);

        self.enter(SupervisorState::Researching);
        let research = self.tools.research(input.as_str()).await?;

        let mut writer_input = compose_initial(input.as_str(), &research);
        loop {
            let iteration = pipeline.iteration_count;

            self.enter(SupervisorState::Writing { iteration });
            self.writer_calls += 1;
            let written = self.tools.write(&writer_input).await?;
            let draft = Draft::parse(iteration, tags::unwrap(StageTag::Article, &written))
                .map_err(|e| stage_failure(e, NewsdeskError::Generation))?;

            if iteration >= MAX_REVISIONS {
                return Ok(draft);
            }

            self.enter(SupervisorState::Reviewing { iteration });
            self.reviewer_calls += 1;
            let reviewed = self.tools.review(draft.text()).await?;
            let feedback = Feedback::new(
                iteration,
                tags::unwrap(StageTag::ReviewFeedback, &reviewed),
            )
            .map_err(|e| stage_failure(e, NewsdeskError::Review))?;

            let priorities = feedback.priorities();
            info!(
                iteration,
                critical = priorities.critical,
                important = priorities.important,
                minor = priorities.minor,
                "feedback received, revising"
            );

            pipeline.record(draft, feedback);
            writer_input = pipeline.revision_input().ok_or_else(|| {
                NewsdeskError::Generation("no reviewed draft to revise".into())
            })?;
        }
    }
}
