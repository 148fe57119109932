//! Plan orchestrator
//!
//! Drives one plan request through GENERATING → VERIFYING → REFINING … until
//! the itinerary verifies cleanly, refinement passes run out, or the wall-clock
//! budget expires.

use marquee_common::config::PlannerConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::llm::LanguageModel;
use super::maps::{DirectionsService, PlacesService};
use super::plan_generator::PlanGenerator;
use super::plan_refiner::PlanRefiner;
use super::plan_verifier::{PlanVerifier, VerifierSettings};
use crate::error::PlanError;
use crate::models::{Issue, IssueKind, Itinerary, PlanOutcome, PlanRequest, PlanSession, PlanState};

/// Loop bounds
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Refinement passes when the request does not say
    pub default_max_iterations: u32,
    /// Largest value accepted from a request
    pub max_iterations_limit: u32,
    /// `None` disables the wall-clock budget
    pub time_budget: Option<Duration>,
}

impl From<&PlannerConfig> for OrchestratorSettings {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            default_max_iterations: config.max_iterations,
            max_iterations_limit: config.max_iterations_limit,
            time_budget: (config.time_budget_secs > 0)
                .then(|| Duration::from_secs(config.time_budget_secs)),
        }
    }
}

pub struct PlanOrchestrator {
    generator: PlanGenerator,
    verifier: PlanVerifier,
    refiner: PlanRefiner,
    settings: OrchestratorSettings,
}

impl PlanOrchestrator {
    pub fn new(
        generator: PlanGenerator,
        verifier: PlanVerifier,
        refiner: PlanRefiner,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            generator,
            verifier,
            refiner,
            settings,
        }
    }

    /// Wire an orchestrator from collaborators and planner config
    pub fn from_config(
        llm: Arc<dyn LanguageModel>,
        places: Arc<dyn PlacesService>,
        directions: Arc<dyn DirectionsService>,
        config: &PlannerConfig,
    ) -> Self {
        Self::new(
            PlanGenerator::new(Arc::clone(&llm), config.default_city.clone()),
            PlanVerifier::new(places, directions, VerifierSettings::from(config)),
            PlanRefiner::new(llm),
            OrchestratorSettings::from(config),
        )
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Refinement passes for a request, checked against the configured limit
    pub fn resolve_max_iterations(&self, requested: Option<u32>) -> Result<u32, PlanError> {
        let max = requested.unwrap_or(self.settings.default_max_iterations);
        if max > self.settings.max_iterations_limit {
            return Err(PlanError::InvalidRequest(format!(
                "max_iterations {} exceeds the limit of {}",
                max, self.settings.max_iterations_limit
            )));
        }
        Ok(max)
    }

    /// Run a plan request to a terminal state
    ///
    /// `Err` is the FAILED state: generation or refinement failed, the model
    /// output was unusable, or the budget ran out before anything was drafted.
    pub async fn run(&self, request: PlanRequest) -> Result<PlanOutcome, PlanError> {
        if request.query.trim().is_empty() {
            return Err(PlanError::InvalidRequest("query must not be empty".to_string()));
        }
        let max_iterations = self.resolve_max_iterations(request.max_iterations)?;

        let mut session = PlanSession::new(request.query.clone(), request.transport_mode, max_iterations);
        let deadline = self.settings.time_budget.map(|budget| Instant::now() + budget);

        tracing::info!(
            session_id = %session.session_id,
            query = %request.query,
            mode = %request.transport_mode,
            max_iterations,
            "Plan session started"
        );

        let generated = within(
            deadline,
            self.generator
                .generate(&request.query, request.transport_mode, &request.constraints),
        )
        .await;

        let mut itinerary = match generated {
            Some(Ok(itinerary)) => itinerary,
            Some(Err(e)) => return Err(fail(&mut session, e)),
            None => return Err(fail(&mut session, PlanError::Timeout(self.budget_secs()))),
        };
        let mut last_verified: Option<Itinerary> = None;

        loop {
            transition(&mut session, PlanState::Verifying);

            let Some(issues) = within(
                deadline,
                self.verifier.verify(&mut itinerary, &request.constraints),
            )
            .await
            else {
                let best = last_verified.unwrap_or(itinerary);
                return Ok(self.time_out(session, best));
            };

            session.record_pass(itinerary.iteration_count, &issues);
            let next = session.next_after_verification(issues.len(), itinerary.iteration_count);

            if next != PlanState::Refining {
                transition(&mut session, next);
                tracing::info!(
                    session_id = %session.session_id,
                    status = ?next,
                    iterations = itinerary.iteration_count,
                    issues = issues.len(),
                    elapsed_ms = session.elapsed_ms(),
                    "Plan session finished"
                );
                return Ok(PlanOutcome::from_session(session, itinerary));
            }

            transition(&mut session, PlanState::Refining);
            let refined = within(
                deadline,
                self.refiner.refine(
                    &itinerary,
                    &issues,
                    request.transport_mode,
                    &request.constraints,
                ),
            )
            .await;

            match refined {
                Some(Ok(next_itinerary)) => {
                    last_verified = Some(std::mem::replace(&mut itinerary, next_itinerary));
                }
                Some(Err(e)) => return Err(fail(&mut session, e)),
                None => return Ok(self.time_out(session, itinerary)),
            }
        }
    }

    fn budget_secs(&self) -> u64 {
        self.settings.time_budget.map(|b| b.as_secs()).unwrap_or(0)
    }

    fn time_out(&self, mut session: PlanSession, mut itinerary: Itinerary) -> PlanOutcome {
        itinerary.issues.push(Issue::plan_wide(
            IssueKind::TimeBudgetExhausted,
            format!(
                "Planning stopped after the {}s time budget; the itinerary may not be fully verified",
                self.budget_secs()
            ),
        ));
        transition(&mut session, PlanState::TimedOut);
        tracing::warn!(
            session_id = %session.session_id,
            iterations = itinerary.iteration_count,
            issues = itinerary.issues.len(),
            "Plan time budget exhausted"
        );
        PlanOutcome::from_session(session, itinerary)
    }
}

/// Await `fut` unless the deadline passes first
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

fn transition(session: &mut PlanSession, state: PlanState) {
    let t = session.transition_to(state);
    tracing::debug!(from = ?t.old_state, to = ?t.new_state, "Plan state transition");
}

fn fail(session: &mut PlanSession, error: PlanError) -> PlanError {
    transition(session, PlanState::Failed);
    tracing::error!(session_id = %session.session_id, error = %error, "Plan session failed");
    error
}
