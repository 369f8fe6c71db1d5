//! Error types surfaced by the roster builder.

use thiserror::Error;

/// Failures raised while assembling input, building the model, or doing
/// schedule I/O. Solver-side failures are reported through
/// [`crate::solver::SolverStatus`], not through this type.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("skill '{skill}' is not in the catalog (referenced by {context})")]
    UnknownSkill { skill: String, context: String },

    #[error("duplicate employee name '{name}' in team '{team}'")]
    DuplicateEmployee { team: String, name: String },

    #[error("shift '{shift}' on '{day}' requires skill '{skill}' more than once")]
    DuplicateShiftSkill {
        day: String,
        shift: String,
        skill: String,
    },

    #[error("identifier '{0}' must not contain '_'")]
    InvalidIdentifier(String),

    #[error("planning horizon is empty")]
    EmptyHorizon,

    #[error("week '{0}' has no days")]
    EmptyWeek(String),

    #[error("malformed key '{key}': {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("key '{key}' references unknown {what} '{name}'")]
    UnknownKeyPart {
        key: String,
        what: &'static str,
        name: String,
    },

    #[error("absence pin references unknown {what} '{name}'")]
    UnknownPinTarget { what: &'static str, name: String },

    #[error("invalid model: {0}")]
    ModelInvalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
