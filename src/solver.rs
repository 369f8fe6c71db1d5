//! Interface to the external finite-domain engine.
//!
//! The crate builds a [`crate::cp::CpModel`] and hands it to whatever engine
//! implements [`SolverBackend`]. The engine runs its own worker threads and
//! reports each improving solution through [`SolutionObserver`]; invocations
//! are serialized by the engine, never concurrent.

use std::fmt;
use std::time::Duration;

use crate::cp::{Assignment, CpModel};

/// Terminal engine status. Only `Optimal` and `Feasible` carry a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
    ModelInvalid,
}

impl SolverStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Feasible)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolverStatus::Optimal => "OPTIMAL",
            SolverStatus::Feasible => "FEASIBLE",
            SolverStatus::Infeasible => "INFEASIBLE",
            SolverStatus::Unknown => "UNKNOWN",
            SolverStatus::ModelInvalid => "MODEL_INVALID",
        };
        f.write_str(label)
    }
}

/// Search limits handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveParameters {
    pub max_time: Duration,
    pub num_search_workers: usize,
}

impl Default for SolveParameters {
    fn default() -> Self {
        Self {
            max_time: Duration::from_secs(120),
            num_search_workers: 8,
        }
    }
}

/// Receives each improving solution, at most once per improvement, on an
/// engine-owned thread.
pub trait SolutionObserver {
    fn on_solution(&mut self, assignment: &Assignment, objective: i64);
}

/// Observer that ignores intermediate solutions.
pub struct NullObserver;

impl SolutionObserver for NullObserver {
    fn on_solution(&mut self, _assignment: &Assignment, _objective: i64) {}
}

/// What the engine returned: a terminal status plus, for `Optimal` and
/// `Feasible`, the best assignment seen within the time budget.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolverStatus,
    pub best: Option<Assignment>,
    pub objective: Option<i64>,
}

impl SolveOutcome {
    pub fn terminal(status: SolverStatus) -> Self {
        Self {
            status,
            best: None,
            objective: None,
        }
    }
}

/// The external engine collaborator.
pub trait SolverBackend {
    fn solve(
        &mut self,
        model: &CpModel,
        params: &SolveParameters,
        observer: &mut dyn SolutionObserver,
    ) -> SolveOutcome;
}
