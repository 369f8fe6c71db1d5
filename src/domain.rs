//! Domain model for cyclic shift rostering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named qualification. Equality is by label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Skill(String);

impl Skill {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A shift within a day, with one slot per required skill instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub name: String,
    pub needed_skills: Vec<Skill>,
}

impl Shift {
    pub fn new(name: impl Into<String>, needed_skills: Vec<Skill>) -> Self {
        Self {
            name: name.into(),
            needed_skills,
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A weekday template carrying its shifts. The same template is repeated
/// across weeks when the horizon is assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub name: String,
    pub shifts: Vec<Shift>,
}

impl Day {
    pub fn new(name: impl Into<String>, shifts: Vec<Shift>) -> Self {
        Self {
            name: name.into(),
            shifts,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An employee who can fill skill slots on shifts.
///
/// `fixed_skills` controls whether the declared skill set is a hard
/// eligibility filter (true) or a subset left for the model to discover
/// (false, used for virtual headcount analysis).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub skills: Vec<Skill>,
    pub is_shift_manager: bool,
    pub fixed_skills: bool,
}

impl Employee {
    pub fn new(name: impl Into<String>, skills: Vec<Skill>) -> Self {
        Self {
            name: name.into(),
            skills,
            is_shift_manager: false,
            fixed_skills: true,
        }
    }

    pub fn shift_manager(mut self) -> Self {
        self.is_shift_manager = true;
        self
    }

    /// Marks the skill set as model-determined instead of declared.
    pub fn open_skills(mut self) -> Self {
        self.fixed_skills = false;
        self
    }

    pub fn has_skill(&self, skill: &Skill) -> bool {
        self.skills.contains(skill)
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An ordered group of employees that always works the same shift together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub employees: Vec<Employee>,
}

impl Team {
    pub fn new(name: impl Into<String>, employees: Vec<Employee>) -> Self {
        Self {
            name: name.into(),
            employees,
        }
    }

    pub fn shift_managers(&self) -> impl Iterator<Item = (usize, &Employee)> {
        self.employees
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_shift_manager)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A named week owning its day instances in Mo..Su order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    pub name: String,
    pub days: Vec<Day>,
}

impl Week {
    pub fn new(name: impl Into<String>, days: Vec<Day>) -> Self {
        Self {
            name: name.into(),
            days,
        }
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The full decision horizon: the visible weeks plus one coupling week used
/// only to close the shift-cycle constraint on the last visible week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningHorizon {
    weeks: Vec<Week>,
    visible: usize,
}

impl PlanningHorizon {
    /// Builds `visible + 1` weeks by repeating the day templates in order.
    /// Week names are 1-indexed (`Week1`, `Week2`, ...).
    pub fn from_templates(templates: &[Day], visible: usize) -> Self {
        let weeks = (1..=visible + 1)
            .map(|k| Week::new(format!("Week{k}"), templates.to_vec()))
            .collect();
        Self { weeks, visible }
    }

    /// All weeks the model decides over, including the coupling week.
    pub fn decision_weeks(&self) -> &[Week] {
        &self.weeks
    }

    /// The weeks reported to the caller.
    pub fn visible_weeks(&self) -> &[Week] {
        &self.weeks[..self.visible]
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(name: &str) -> Day {
        Day::new(name, vec![Shift::new("M", vec![Skill::new("MO:M1")])])
    }

    #[test]
    fn horizon_appends_one_coupling_week() {
        let horizon = PlanningHorizon::from_templates(&[day("Mo"), day("Tu")], 3);
        assert_eq!(horizon.decision_weeks().len(), 4);
        assert_eq!(horizon.visible_weeks().len(), 3);
        assert_eq!(horizon.decision_weeks()[0].name, "Week1");
        assert_eq!(horizon.decision_weeks()[3].name, "Week4");
        assert_eq!(horizon.decision_weeks()[3].days.len(), 2);
    }

    #[test]
    fn employee_builders() {
        let e = Employee::new("P1", vec![Skill::new("H:M2")]).shift_manager();
        assert!(e.is_shift_manager);
        assert!(e.fixed_skills);
        assert!(e.has_skill(&Skill::new("H:M2")));
        assert!(!e.has_skill(&Skill::new("MO:M1")));

        let v = Employee::new("V1", vec![]).open_skills();
        assert!(!v.fixed_skills);
    }
}
