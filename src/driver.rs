//! Drives the engine over a built model and projects the outcome.

use tracing::info;

use crate::builder::BuiltModel;
use crate::cp::Assignment;
use crate::input_data::ModelInput;
use crate::solution::RosterSolution;
use crate::solver::{SolutionObserver, SolveParameters, SolverBackend, SolverStatus};

struct ProgressObserver {
    improvements: usize,
}

impl SolutionObserver for ProgressObserver {
    fn on_solution(&mut self, _assignment: &Assignment, objective: i64) {
        self.improvements += 1;
        info!(
            improvement = self.improvements,
            objective, "solution improved"
        );
    }
}

/// Runs the engine and, on success, projects the best assignment to the
/// visible horizon.
pub fn solve_roster(
    backend: &mut dyn SolverBackend,
    input: &ModelInput,
    built: &BuiltModel,
    params: &SolveParameters,
) -> (SolverStatus, Option<RosterSolution>) {
    let mut observer = ProgressObserver { improvements: 0 };
    let outcome = backend.solve(&built.model, params, &mut observer);
    info!(status = %outcome.status, "engine finished");
    if !outcome.status.has_solution() {
        return (outcome.status, None);
    }
    let Some(assignment) = outcome.best else {
        // An engine claiming success must deliver an assignment.
        return (SolverStatus::Unknown, None);
    };
    let objective = outcome
        .objective
        .or_else(|| built.model.objective_value(&assignment))
        .unwrap_or(0);
    let solution = RosterSolution::project(input, &built.universe, &assignment, objective);
    (outcome.status, Some(solution))
}

/// Process exit code per status: zero only when a solution was produced.
pub fn exit_code(status: SolverStatus) -> u8 {
    match status {
        SolverStatus::Optimal | SolverStatus::Feasible => 0,
        SolverStatus::Infeasible => 2,
        SolverStatus::Unknown => 3,
        SolverStatus::ModelInvalid => 4,
    }
}
