//! Build orchestration: variables, the hard-rule battery, pins, absence
//! bookkeeping and the objective, in a fixed order so equal inputs produce
//! equal models.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::cp::CpModel;
use crate::error::RosterError;
use crate::input_data::ModelInput;
use crate::objective::{self, ObjectiveProfile, ObjectiveTerms, SoftWeights};
use crate::rules::absence::{self, AbsencePlan};
use crate::rules::hard::{self, ManualAbsence};
use crate::seed;
use crate::universe::{DayRef, EmployeeRef, ParsedKey, Universe};

/// Everything that varies per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub night_shift: String,
    /// Shift rotation enforced between consecutive weeks, if any.
    pub shift_cycle: Option<Vec<String>>,
    pub profile: ObjectiveProfile,
    pub weights: SoftWeights,
    /// At most five assignments per calendar week.
    pub weekly_cap: bool,
    /// At most five assignments in any six-day window.
    pub six_day_window_cap: bool,
    pub absence: Option<AbsencePlan>,
    pub manual_absences: Vec<ManualAbsence>,
    /// Textual keys to pin true (from a seed workbook).
    pub seed_keys: Vec<String>,
    pub include_same_duty_reward: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            night_shift: "N".to_string(),
            shift_cycle: Some(vec!["M".to_string(), "A".to_string(), "N".to_string()]),
            profile: ObjectiveProfile::Roster,
            weights: SoftWeights::default(),
            weekly_cap: true,
            six_day_window_cap: true,
            absence: None,
            manual_absences: Vec::new(),
            seed_keys: Vec::new(),
            include_same_duty_reward: false,
        }
    }
}

/// The built model plus the handles needed to interpret a solution.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub model: CpModel,
    pub universe: Universe,
    pub objective: ObjectiveTerms,
    /// Seed keys, resolved.
    pub pinned: Vec<ParsedKey>,
}

/// Builds the complete model for the given input.
pub fn build_model(input: &ModelInput, options: &BuildOptions) -> Result<BuiltModel, RosterError> {
    input.validate()?;

    let mut model = CpModel::new();
    let universe = Universe::build(&mut model, input);
    info!(
        work_vars = universe.work_var_count(),
        absence_vars = universe.absence_var_count(),
        "decision variables created"
    );

    hard::add_full_coverage(&mut model, input, &universe);
    hard::add_one_assignment_per_day(&mut model, input, &universe);
    hard::add_skill_eligibility(&mut model, input, &universe);
    hard::add_team_exclusivity(&mut model, input, &universe);
    if options.weekly_cap {
        hard::add_weekly_workload_cap(&mut model, input, &universe);
    }
    hard::add_single_shift_kind_week(&mut model, input, &universe);
    hard::add_two_shift_rest(&mut model, input, &universe);
    if let Some(cycle) = &options.shift_cycle {
        hard::add_shift_cycle(&mut model, input, &universe, cycle);
    }
    hard::add_manager_presence(&mut model, input, &universe);
    if options.six_day_window_cap {
        hard::add_six_day_window_cap(&mut model, input, &universe);
    }
    hard::add_night_block_limit(&mut model, input, &universe, &options.night_shift);
    debug!(constraints = model.stats().constraints(), "hard rules added");

    let manually_pinned =
        hard::add_manual_absences(&mut model, input, &universe, &options.manual_absences)?;
    let pinned = seed::pin_seed_keys(&mut model, input, &universe, &options.seed_keys)?;

    // Seed pins dominate the generated absence blocks: seeded employees are
    // exempt, and seeded absence days stay free for the pin to decide.
    let mut free_days: BTreeSet<(EmployeeRef, DayRef)> = manually_pinned.into_iter().collect();
    let mut seeded_employees: BTreeSet<EmployeeRef> = BTreeSet::new();
    for key in &pinned {
        match key {
            ParsedKey::Work(k) => {
                seeded_employees.insert(k.employee);
            }
            ParsedKey::Absence(k) => {
                seeded_employees.insert(k.employee);
                free_days.insert((k.employee, k.day));
            }
        }
    }

    absence::add_vacation_illness_exclusion(&mut model, input, &universe);
    absence::add_absence_work_exclusion(&mut model, input, &universe);
    let mut managed: BTreeSet<EmployeeRef> = BTreeSet::new();
    if let Some(plan) = &options.absence {
        managed = input
            .employees()
            .filter(|e| !seeded_employees.contains(e))
            .collect();
        absence::add_absence_blocks(&mut model, input, &universe, plan, &seeded_employees);
    }
    absence::zero_unmanaged_absences(&mut model, input, &universe, &managed, &free_days);

    let objective = objective::build_objective(
        &mut model,
        input,
        &universe,
        options.profile,
        &options.weights,
        &options.night_shift,
        options.include_same_duty_reward,
    );

    model.validate()?;
    info!(
        vars = model.num_vars(),
        constraints = model.stats().constraints(),
        profile = %options.profile,
        "model built"
    );
    Ok(BuiltModel {
        model,
        universe,
        objective,
        pinned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::Constraint;
    use crate::input_data::create_input;
    use crate::rules::absence::BlockSpec;

    #[test]
    fn default_build_produces_a_model() {
        let input = create_input(1).unwrap();
        let built = build_model(&input, &BuildOptions::default()).unwrap();
        let stats = built.model.stats();

        // One coverage constraint per slot, plus everything else.
        assert_eq!(stats.exactly_one, input.slots().count());
        assert!(stats.at_most_one > 0);
        assert!(stats.at_least_one > 0);
        assert!(stats.multiplication > 0);
        assert!(built.model.objective().is_some());
        assert_eq!(built.objective.terms.len(), 5);
        assert!(built.pinned.is_empty());
    }

    #[test]
    fn toggles_remove_their_rules() {
        let input = create_input(1).unwrap();
        let mut options = BuildOptions::default();
        options.weekly_cap = false;
        options.six_day_window_cap = false;
        options.shift_cycle = None;
        let trimmed = build_model(&input, &options).unwrap();
        let full = build_model(&input, &BuildOptions::default()).unwrap();
        assert!(
            trimmed.model.stats().constraints() < full.model.stats().constraints(),
            "disabling rules must shrink the model"
        );
    }

    #[test]
    fn builds_are_reproducible() {
        let input = create_input(1).unwrap();
        let options = BuildOptions::default();
        let first = build_model(&input, &options).unwrap();
        let second = build_model(&input, &options).unwrap();
        assert_eq!(first.model.num_vars(), second.model.num_vars());
        assert_eq!(
            first.model.stats().constraints(),
            second.model.stats().constraints()
        );
        // Same names at the same positions.
        assert_eq!(
            first.model.find_bool("Week1_Mo_M_Team1_P1_MO:M1"),
            second.model.find_bool("Week1_Mo_M_Team1_P1_MO:M1")
        );
    }

    #[test]
    fn seeded_employees_are_exempt_from_absence_blocks() {
        let input = create_input(1).unwrap();
        let mut options = BuildOptions::default();
        options.absence = Some(AbsencePlan {
            vacation: BlockSpec {
                intervals: 1,
                length: 2,
            },
            illness: BlockSpec {
                intervals: 1,
                length: 1,
            },
        });
        options.seed_keys = vec!["Week1_Mo_M_Team1_P1_MO:M1".to_string()];
        let built = build_model(&input, &options).unwrap();

        // P1 is seeded, so no "is used" indicator is created for them while
        // every other employee gets one.
        assert!(built.model.find_bool("help_bool_Team1_P1_is_used").is_none());
        assert!(built.model.find_bool("help_bool_Team1_P2_is_used").is_some());
    }

    #[test]
    fn unknown_seed_key_fails_the_build() {
        let input = create_input(1).unwrap();
        let mut options = BuildOptions::default();
        options.seed_keys = vec!["Week1_Mo_M_Team9_P1_MO:M1".to_string()];
        assert!(matches!(
            build_model(&input, &options),
            Err(RosterError::UnknownKeyPart { .. })
        ));
    }

    #[test]
    fn seed_pin_is_an_equality_to_one() {
        let input = create_input(1).unwrap();
        let mut options = BuildOptions::default();
        options.seed_keys = vec!["Week1_Mo_M_Team1_P1_MO:M1".to_string()];
        let built = build_model(&input, &options).unwrap();
        let pinned_var = built
            .model
            .find_bool("Week1_Mo_M_Team1_P1_MO:M1")
            .unwrap();
        let has_pin = built.model.constraints().iter().any(|c| match c {
            Constraint::Linear {
                expr,
                op: crate::cp::CmpOp::Eq,
                rhs: 1,
                enforced_by,
            } => {
                enforced_by.is_empty()
                    && expr.iter_terms().count() == 1
                    && expr
                        .iter_terms()
                        .any(|(var, coeff)| var == pinned_var.index() && coeff == 1)
            }
            _ => false,
        });
        assert!(has_pin);
    }
}
