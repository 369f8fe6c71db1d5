//! Cyclic shift rostering for a multi-team, multi-skill workforce.
//!
//! The crate encodes the rostering problem as a pure 0/1 integer program
//! with auxiliary integers: one Boolean decision per
//! `(week, day, shift, team, employee, skill)` key plus vacation/illness
//! decisions, a battery of hard legal/contractual rules, and a squared,
//! weighted soft objective. An external finite-domain engine consumes the
//! model through [`solver::SolverBackend`]; the builder itself never
//! searches.

pub mod builder;
pub mod cp;
pub mod domain;
pub mod driver;
pub mod error;
pub mod input_data;
pub mod objective;
pub mod report;
pub mod rules;
pub mod seed;
pub mod solution;
pub mod solver;
pub mod universe;
pub mod verify;
