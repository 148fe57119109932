//! Plan orchestration state machine
//!
//! A plan session progresses through:
//! GENERATING → VERIFYING → (DONE | REFINING → VERIFYING …) → DONE | DONE_WITH_WARNINGS | FAILED
//!
//! TIMED_OUT is entered instead when the wall-clock budget runs out after an
//! itinerary exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Issue, Itinerary, TransportMode};

/// Plan orchestration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanState {
    /// Language model drafting the initial itinerary
    Generating,
    /// Checking venues, events and routes against maps services
    Verifying,
    /// Language model correcting the flagged issues
    Refining,
    /// Verified with no issues
    Done,
    /// Refinement passes exhausted with issues remaining
    DoneWithWarnings,
    /// Wall-clock budget exhausted, best itinerary returned
    TimedOut,
    /// Generation or refinement hard error
    Failed,
}

impl PlanState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlanState::Done | PlanState::DoneWithWarnings | PlanState::TimedOut | PlanState::Failed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub old_state: PlanState,
    pub new_state: PlanState,
    pub transitioned_at: DateTime<Utc>,
}

/// Result of one verification pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Refinement passes applied before this verification
    pub iteration: u32,
    pub issue_count: usize,
    pub issues: Vec<String>,
}

/// Plan session (in-memory, one per request)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSession {
    pub session_id: Uuid,
    pub state: PlanState,
    pub query: String,
    pub transport_mode: TransportMode,
    pub max_iterations: u32,
    pub transitions: Vec<StateTransition>,
    pub history: Vec<VerificationRecord>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl PlanSession {
    pub fn new(query: impl Into<String>, transport_mode: TransportMode, max_iterations: u32) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: PlanState::Generating,
            query: query.into(),
            transport_mode,
            max_iterations,
            transitions: Vec::new(),
            history: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state
    pub fn transition_to(&mut self, new_state: PlanState) -> &StateTransition {
        let transition = StateTransition {
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;

        if new_state.is_terminal() {
            self.ended_at = Some(transition.transitioned_at);
        }

        self.transitions.push(transition);
        &self.transitions[self.transitions.len() - 1]
    }

    /// State to enter after a verification pass
    ///
    /// No issues → DONE. Issues with refinement passes left → REFINING.
    /// Otherwise → DONE_WITH_WARNINGS.
    pub fn next_after_verification(&self, issue_count: usize, iteration_count: u32) -> PlanState {
        if issue_count == 0 {
            PlanState::Done
        } else if iteration_count < self.max_iterations {
            PlanState::Refining
        } else {
            PlanState::DoneWithWarnings
        }
    }

    pub fn record_pass(&mut self, iteration: u32, issues: &[Issue]) {
        self.history.push(VerificationRecord {
            iteration,
            issue_count: issues.len(),
            issues: issues.iter().map(|i| i.message.clone()).collect(),
        });
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn elapsed_ms(&self) -> i64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds()
    }
}

/// Terminal result of a plan session that produced an itinerary
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub session_id: Uuid,
    pub status: PlanState,
    pub itinerary: Itinerary,
    /// Refinement passes performed
    pub iterations: u32,
    pub history: Vec<VerificationRecord>,
}

impl PlanOutcome {
    pub fn from_session(session: PlanSession, itinerary: Itinerary) -> Self {
        Self {
            session_id: session.session_id,
            status: session.state,
            iterations: itinerary.iteration_count,
            itinerary,
            history: session.history,
        }
    }
}
