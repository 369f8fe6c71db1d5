//! Objective aggregation: rule weights, aggregation profiles, and the single
//! minimized expression handed to the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cp::{CpModel, LinearExpr};
use crate::input_data::ModelInput;
use crate::rules::{soft, CostTerm};
use crate::universe::Universe;

/// Linear weights applied to the per-employee metrics before squaring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftWeights {
    pub transitions: i64,
    pub night_transitions: i64,
    pub night_balance: i64,
    pub shift_balance: i64,
    pub long_spans: i64,
    pub headcount: i64,
    pub skill_footprint: i64,
}

impl Default for SoftWeights {
    fn default() -> Self {
        Self {
            transitions: 3,
            night_transitions: 56,
            night_balance: 10,
            shift_balance: 10,
            long_spans: 10_000,
            headcount: 100,
            skill_footprint: 1,
        }
    }
}

/// Which soft rules feed the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveProfile {
    /// Produce a roster: fragmentation, balance and long-span terms.
    Roster,
    /// Discover minimum headcount and skill catalog before pinning a roster.
    Staffing,
}

impl FromStr for ObjectiveProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "roster" => Ok(ObjectiveProfile::Roster),
            "staffing" => Ok(ObjectiveProfile::Staffing),
            _ => Err(format!("unknown profile '{s}' (expected roster|staffing)")),
        }
    }
}

impl fmt::Display for ObjectiveProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectiveProfile::Roster => "roster",
            ObjectiveProfile::Staffing => "staffing",
        })
    }
}

/// The built cost terms, in objective order.
#[derive(Debug, Clone)]
pub struct ObjectiveTerms {
    pub terms: Vec<CostTerm>,
}

impl ObjectiveTerms {
    pub fn term(&self, label: &str) -> Option<&CostTerm> {
        self.terms.iter().find(|t| t.label == label)
    }
}

/// Builds the selected soft rules and directs the engine to minimize their
/// sum (reward terms are subtracted).
#[allow(clippy::too_many_arguments)]
pub fn build_objective(
    model: &mut CpModel,
    input: &ModelInput,
    universe: &Universe,
    profile: ObjectiveProfile,
    weights: &SoftWeights,
    night_shift: &str,
    include_same_duty: bool,
) -> ObjectiveTerms {
    let mut terms = Vec::new();
    match profile {
        ObjectiveProfile::Roster => {
            terms.push(soft::add_work_block_cohesion(
                model,
                input,
                universe,
                weights.transitions,
            ));
            terms.push(soft::add_night_block_cohesion(
                model,
                input,
                universe,
                weights.night_transitions,
                night_shift,
            ));
            terms.push(soft::add_night_share_balance(
                model,
                input,
                universe,
                weights.night_balance,
                night_shift,
            ));
            terms.push(soft::add_shift_share_balance(
                model,
                input,
                universe,
                weights.shift_balance,
            ));
            terms.push(soft::add_long_span_penalty(
                model,
                input,
                universe,
                weights.long_spans,
            ));
        }
        ObjectiveProfile::Staffing => {
            terms.push(soft::add_headcount_cost(
                model,
                input,
                universe,
                weights.headcount,
            ));
            terms.push(soft::add_skill_footprint_cost(
                model,
                input,
                universe,
                weights.skill_footprint,
            ));
        }
    }
    if include_same_duty {
        terms.push(soft::add_same_duty_reward(model, input, universe));
    }

    let mut expr = LinearExpr::new();
    for term in &terms {
        if term.reward {
            expr.add_int_term(term.total, -1);
        } else {
            expr.add_int(term.total);
        }
    }
    model.minimize(expr);
    ObjectiveTerms { terms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_data::create_input;
    use crate::universe::Universe;

    #[test]
    fn roster_profile_builds_five_terms() {
        let input = create_input(1).unwrap();
        let mut model = CpModel::new();
        let universe = Universe::build(&mut model, &input);
        let terms = build_objective(
            &mut model,
            &input,
            &universe,
            ObjectiveProfile::Roster,
            &SoftWeights::default(),
            "N",
            false,
        );
        assert_eq!(terms.terms.len(), 5);
        assert!(terms.term("transitions").is_some());
        assert!(terms.term("long spans").is_some());
        assert!(terms.term("headcount").is_none());
        assert!(model.objective().is_some());
    }

    #[test]
    fn staffing_profile_builds_two_terms() {
        let input = create_input(1).unwrap();
        let mut model = CpModel::new();
        let universe = Universe::build(&mut model, &input);
        let terms = build_objective(
            &mut model,
            &input,
            &universe,
            ObjectiveProfile::Staffing,
            &SoftWeights::default(),
            "N",
            false,
        );
        assert_eq!(terms.terms.len(), 2);
        assert!(terms.term("headcount").is_some());
        assert!(terms.term("skill footprint").is_some());
    }

    #[test]
    fn profile_parses_from_str() {
        assert_eq!(
            "roster".parse::<ObjectiveProfile>(),
            Ok(ObjectiveProfile::Roster)
        );
        assert_eq!(
            "STAFFING".parse::<ObjectiveProfile>(),
            Ok(ObjectiveProfile::Staffing)
        );
        assert!("balanced".parse::<ObjectiveProfile>().is_err());
    }
}
