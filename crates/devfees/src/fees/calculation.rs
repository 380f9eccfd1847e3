//! Caller-side controller for one jurisdiction's calculation.
//!
//! ```text
//! Idle -> Loading -> Calculating -> Ready | Failed
//! ```
//!
//! Issuing a different request from any state starts a new generation and
//! returns to `Loading`; results carrying an older ticket are dropped.

use super::aggregate::FeeBreakdown;
use super::domain::{Fee, ProjectParameters};
use super::engine::FeeEngine;
use super::relevance::ProjectType;
use super::source::{FeeRecordSource, JurisdictionSelection, SourceError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything needed to price one jurisdiction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    #[serde(flatten)]
    pub selection: JurisdictionSelection,
    #[serde(default, alias = "project")]
    pub params: ProjectParameters,
    #[serde(default, alias = "projectType", skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,
}

impl CalculationRequest {
    pub fn new(selection: JurisdictionSelection, params: ProjectParameters) -> Self {
        Self {
            selection,
            params,
            project_type: None,
        }
    }

    pub fn with_project_type(mut self, project_type: ProjectType) -> Self {
        self.project_type = Some(project_type);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalculationState {
    Idle,
    Loading,
    Calculating,
    Ready(FeeBreakdown),
    Failed(String),
}

impl CalculationState {
    pub fn label(&self) -> &'static str {
        match self {
            CalculationState::Idle => "idle",
            CalculationState::Loading => "loading",
            CalculationState::Calculating => "calculating",
            CalculationState::Ready(_) => "ready",
            CalculationState::Failed(_) => "failed",
        }
    }

    pub fn breakdown(&self) -> Option<&FeeBreakdown> {
        match self {
            CalculationState::Ready(breakdown) => Some(breakdown),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, CalculationState::Ready(_) | CalculationState::Failed(_))
    }
}

/// Identifies the request generation a fetch result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

#[derive(Debug)]
pub struct JurisdictionCalculation {
    state: CalculationState,
    request: Option<CalculationRequest>,
    generation: u64,
    pending: Option<Vec<Fee>>,
}

impl Default for JurisdictionCalculation {
    fn default() -> Self {
        Self::new()
    }
}

impl JurisdictionCalculation {
    pub fn new() -> Self {
        Self {
            state: CalculationState::Idle,
            request: None,
            generation: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> &CalculationState {
        &self.state
    }

    pub fn current_request(&self) -> Option<&CalculationRequest> {
        self.request.as_ref()
    }

    pub fn current_ticket(&self) -> Option<RequestTicket> {
        self.request.as_ref().map(|_| RequestTicket(self.generation))
    }

    /// Starts a calculation for `request`, superseding any earlier one.
    ///
    /// Re-issuing the request already loading or ready is a no-op and
    /// returns `None`. A failed request may be issued again.
    pub fn request(&mut self, request: CalculationRequest) -> Option<RequestTicket> {
        let unchanged = self.request.as_ref() == Some(&request);
        let in_flight_or_ready = matches!(
            self.state,
            CalculationState::Loading | CalculationState::Calculating | CalculationState::Ready(_)
        );
        if unchanged && in_flight_or_ready {
            return None;
        }

        self.generation += 1;
        self.request = Some(request);
        self.pending = None;
        self.state = CalculationState::Loading;
        debug!(generation = self.generation, "calculation requested");
        Some(RequestTicket(self.generation))
    }

    /// Records the fetch outcome for `ticket`. Returns `false` when the
    /// ticket is stale or nothing is loading.
    pub fn fetched(&mut self, ticket: RequestTicket, fetched: Result<Vec<Fee>, SourceError>) -> bool {
        if ticket.0 != self.generation || self.state != CalculationState::Loading {
            debug!(
                ticket = ticket.0,
                generation = self.generation,
                "ignoring stale fee fetch"
            );
            return false;
        }

        match fetched {
            Ok(fees) => {
                self.pending = Some(fees);
                self.state = CalculationState::Calculating;
            }
            Err(err) => {
                self.state = CalculationState::Failed(err.to_string());
            }
        }
        true
    }

    /// Prices fees received by [`fetched`](Self::fetched). Does nothing
    /// outside the `Calculating` state.
    pub fn calculate(&mut self, engine: &FeeEngine) -> &CalculationState {
        if self.state != CalculationState::Calculating {
            return &self.state;
        }
        if let (Some(fees), Some(request)) = (self.pending.take(), self.request.as_ref()) {
            let breakdown =
                engine.recalculate(&fees, &request.params, request.project_type.as_ref());
            self.state = CalculationState::Ready(breakdown);
        }
        &self.state
    }

    /// `fetched` followed by `calculate`.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        fetched: Result<Vec<Fee>, SourceError>,
        engine: &FeeEngine,
    ) -> bool {
        if !self.fetched(ticket, fetched) {
            return false;
        }
        self.calculate(engine);
        true
    }

    /// Synchronously requests, fetches and calculates.
    pub fn run(
        &mut self,
        request: CalculationRequest,
        source: &dyn FeeRecordSource,
        engine: &FeeEngine,
    ) -> &CalculationState {
        if let Some(ticket) = self.request(request) {
            if let Some(selection) = self.request.as_ref().map(|request| request.selection.clone())
            {
                let fetched = source.fetch_fees(&selection);
                self.complete(ticket, fetched, engine);
            }
        }
        &self.state
    }
}
