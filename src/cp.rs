//! Solver-agnostic constraint model: variables, linear and Boolean
//! constraints, reified enforcement, and a minimized integer objective.
//!
//! The model is a plain value. An external engine (see [`crate::solver`])
//! consumes it; [`CpModel::check`] evaluates a candidate assignment against
//! it without searching.

use serde::Serialize;

use crate::error::RosterError;

/// A 0/1 decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoolVar(u32);

/// A bounded integer variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct IntVar(u32);

/// A Boolean variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Literal {
    pub var: BoolVar,
    pub negated: bool,
}

impl BoolVar {
    pub fn lit(self) -> Literal {
        Literal {
            var: self,
            negated: false,
        }
    }

    pub fn not(self) -> Literal {
        Literal {
            var: self,
            negated: true,
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl IntVar {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Rebuilds a handle from a raw index; only tests that reconstruct
    /// auxiliary values need this.
    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl From<BoolVar> for Literal {
    fn from(var: BoolVar) -> Self {
        var.lit()
    }
}

impl Literal {
    pub fn negate(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
enum Domain {
    Bool,
    Int { lo: i64, hi: i64 },
}

#[derive(Debug, Clone, Serialize)]
struct VarData {
    name: String,
    domain: Domain,
}

/// An integer-weighted sum of variables plus a constant.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinearExpr {
    terms: Vec<(u32, i64)>,
    constant: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bool(var: BoolVar) -> Self {
        let mut expr = Self::new();
        expr.add_bool(var);
        expr
    }

    pub fn from_int(var: IntVar) -> Self {
        let mut expr = Self::new();
        expr.add_int(var);
        expr
    }

    pub fn sum(vars: impl IntoIterator<Item = BoolVar>) -> Self {
        let mut expr = Self::new();
        for v in vars {
            expr.add_bool(v);
        }
        expr
    }

    pub fn sum_ints(vars: impl IntoIterator<Item = IntVar>) -> Self {
        let mut expr = Self::new();
        for v in vars {
            expr.add_int(v);
        }
        expr
    }

    pub fn add_bool(&mut self, var: BoolVar) {
        self.terms.push((var.0, 1));
    }

    pub fn add_int(&mut self, var: IntVar) {
        self.terms.push((var.0, 1));
    }

    pub fn add_bool_term(&mut self, var: BoolVar, coefficient: i64) {
        self.terms.push((var.0, coefficient));
    }

    pub fn add_int_term(&mut self, var: IntVar, coefficient: i64) {
        self.terms.push((var.0, coefficient));
    }

    pub fn add_constant(&mut self, value: i64) {
        self.constant += value;
    }

    /// Multiplies every coefficient and the constant by `factor`.
    pub fn scaled(mut self, factor: i64) -> Self {
        for term in &mut self.terms {
            term.1 *= factor;
        }
        self.constant *= factor;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constant == 0
    }

    /// Term view as (variable index, coefficient) pairs.
    pub fn iter_terms(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.terms.iter().map(|&(var, coeff)| (var as usize, coeff))
    }

    fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|&(var, coeff)| values[var as usize] * coeff)
            .sum::<i64>()
            + self.constant
    }
}

/// Comparison operator of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Le,
    Lt,
    Ge,
    Gt,
}

impl CmpOp {
    fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Ge => lhs >= rhs,
            CmpOp::Gt => lhs > rhs,
        }
    }
}

/// One posted constraint. Linear, `BoolOr` and `BoolAnd` constraints may be
/// reified: they only apply when every literal in `enforced_by` is true.
#[derive(Debug, Clone, Serialize)]
pub enum Constraint {
    Linear {
        expr: LinearExpr,
        op: CmpOp,
        rhs: i64,
        enforced_by: Vec<Literal>,
    },
    ExactlyOne {
        literals: Vec<Literal>,
    },
    AtMostOne {
        literals: Vec<Literal>,
    },
    AtLeastOne {
        literals: Vec<Literal>,
    },
    BoolOr {
        literals: Vec<Literal>,
        enforced_by: Vec<Literal>,
    },
    BoolAnd {
        literals: Vec<Literal>,
        enforced_by: Vec<Literal>,
    },
    MaxEquality {
        target: IntVar,
        operands: Vec<IntVar>,
    },
    MultiplicationEquality {
        target: IntVar,
        factors: [IntVar; 2],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sense {
    Minimize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Objective {
    pub sense: Sense,
    pub expr: LinearExpr,
}

/// Per-kind constraint counts, for logging.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ModelStats {
    pub bool_vars: usize,
    pub int_vars: usize,
    pub linear: usize,
    pub exactly_one: usize,
    pub at_most_one: usize,
    pub at_least_one: usize,
    pub bool_or: usize,
    pub bool_and: usize,
    pub max_equality: usize,
    pub multiplication: usize,
}

impl ModelStats {
    pub fn constraints(&self) -> usize {
        self.linear
            + self.exactly_one
            + self.at_most_one
            + self.at_least_one
            + self.bool_or
            + self.bool_and
            + self.max_equality
            + self.multiplication
    }
}

/// A violated constraint found by [`CpModel::check`].
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    pub constraint: usize,
    pub detail: String,
}

/// The model under construction.
///
/// Misuse (an empty integer domain) is recorded rather than panicking and
/// reported by [`CpModel::validate`], mirroring an engine's MODEL_INVALID
/// status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CpModel {
    vars: Vec<VarData>,
    constraints: Vec<Constraint>,
    objective: Option<Objective>,
    invalid: Vec<String>,
}

/// Handle returned by the constraint adders so enforcement literals can be
/// attached in the fluent style: `model.add_eq(expr, 0).only_enforce_if([b.lit()])`.
pub struct Enforceable<'a> {
    constraints: &'a mut [Constraint],
    index: usize,
}

impl Enforceable<'_> {
    pub fn only_enforce_if(self, literals: impl IntoIterator<Item = Literal>) {
        match &mut self.constraints[self.index] {
            Constraint::Linear { enforced_by, .. }
            | Constraint::BoolOr { enforced_by, .. }
            | Constraint::BoolAnd { enforced_by, .. } => enforced_by.extend(literals),
            _ => {}
        }
    }
}

impl CpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        let id = self.vars.len() as u32;
        self.vars.push(VarData {
            name: name.into(),
            domain: Domain::Bool,
        });
        BoolVar(id)
    }

    pub fn new_int_var(&mut self, lo: i64, hi: i64, name: impl Into<String>) -> IntVar {
        let name = name.into();
        if lo > hi {
            self.invalid
                .push(format!("empty domain [{lo}, {hi}] for '{name}'"));
        }
        let id = self.vars.len() as u32;
        self.vars.push(VarData {
            name,
            domain: Domain::Int { lo, hi },
        });
        IntVar(id)
    }

    pub fn var_name_of_bool(&self, var: BoolVar) -> &str {
        &self.vars[var.index()].name
    }

    /// Linear scan by name; intended for diagnostics and tests.
    pub fn find_bool(&self, name: &str) -> Option<BoolVar> {
        self.vars
            .iter()
            .position(|v| v.domain == Domain::Bool && v.name == name)
            .map(|i| BoolVar(i as u32))
    }

    /// Linear scan by name over integer variables.
    pub fn find_int(&self, name: &str) -> Option<IntVar> {
        self.vars
            .iter()
            .position(|v| matches!(v.domain, Domain::Int { .. }) && v.name == name)
            .map(|i| IntVar(i as u32))
    }

    pub fn var_name_of_int(&self, var: IntVar) -> &str {
        &self.vars[var.index()].name
    }

    fn push(&mut self, constraint: Constraint) -> Enforceable<'_> {
        self.constraints.push(constraint);
        let index = self.constraints.len() - 1;
        Enforceable {
            constraints: &mut self.constraints,
            index,
        }
    }

    pub fn add(&mut self, expr: LinearExpr, op: CmpOp, rhs: i64) -> Enforceable<'_> {
        self.push(Constraint::Linear {
            expr,
            op,
            rhs,
            enforced_by: Vec::new(),
        })
    }

    pub fn add_eq(&mut self, expr: LinearExpr, rhs: i64) -> Enforceable<'_> {
        self.add(expr, CmpOp::Eq, rhs)
    }

    pub fn add_ne(&mut self, expr: LinearExpr, rhs: i64) -> Enforceable<'_> {
        self.add(expr, CmpOp::Ne, rhs)
    }

    pub fn add_le(&mut self, expr: LinearExpr, rhs: i64) -> Enforceable<'_> {
        self.add(expr, CmpOp::Le, rhs)
    }

    pub fn add_ge(&mut self, expr: LinearExpr, rhs: i64) -> Enforceable<'_> {
        self.add(expr, CmpOp::Ge, rhs)
    }

    /// Posts `target == expr`.
    pub fn add_equality(&mut self, target: IntVar, expr: LinearExpr) -> Enforceable<'_> {
        let mut linked = expr;
        linked.add_int_term(target, -1);
        self.add_eq(linked, 0)
    }

    pub fn add_exactly_one(&mut self, literals: impl IntoIterator<Item = Literal>) {
        self.constraints.push(Constraint::ExactlyOne {
            literals: literals.into_iter().collect(),
        });
    }

    pub fn add_at_most_one(&mut self, literals: impl IntoIterator<Item = Literal>) {
        self.constraints.push(Constraint::AtMostOne {
            literals: literals.into_iter().collect(),
        });
    }

    pub fn add_at_least_one(&mut self, literals: impl IntoIterator<Item = Literal>) {
        self.constraints.push(Constraint::AtLeastOne {
            literals: literals.into_iter().collect(),
        });
    }

    pub fn add_bool_or(&mut self, literals: impl IntoIterator<Item = Literal>) -> Enforceable<'_> {
        self.push(Constraint::BoolOr {
            literals: literals.into_iter().collect(),
            enforced_by: Vec::new(),
        })
    }

    pub fn add_bool_and(&mut self, literals: impl IntoIterator<Item = Literal>) -> Enforceable<'_> {
        self.push(Constraint::BoolAnd {
            literals: literals.into_iter().collect(),
            enforced_by: Vec::new(),
        })
    }

    pub fn add_max_equality(&mut self, target: IntVar, operands: impl IntoIterator<Item = IntVar>) {
        let operands: Vec<IntVar> = operands.into_iter().collect();
        if operands.is_empty() {
            let name = self.vars[target.index()].name.clone();
            self.invalid
                .push(format!("max equality over no operands for '{name}'"));
        }
        self.constraints
            .push(Constraint::MaxEquality { target, operands });
    }

    pub fn add_multiplication_equality(&mut self, target: IntVar, a: IntVar, b: IntVar) {
        self.constraints.push(Constraint::MultiplicationEquality {
            target,
            factors: [a, b],
        });
    }

    /// Creates a Boolean that is true exactly when `expr >= threshold`.
    ///
    /// The reified pair `expr >= threshold ⟺ b` is the workhorse of the rule
    /// encodings ("worked at least once", "is used", "has the skill").
    pub fn indicator_ge(
        &mut self,
        expr: LinearExpr,
        threshold: i64,
        name: impl Into<String>,
    ) -> BoolVar {
        let b = self.new_bool_var(name);
        self.add_ge(expr.clone(), threshold).only_enforce_if([b.lit()]);
        self.add_le(expr, threshold - 1).only_enforce_if([b.not()]);
        b
    }

    /// Creates a Boolean that is true exactly when the two day-state Booleans
    /// differ (a works/rests transition).
    pub fn transition(&mut self, a: BoolVar, b: BoolVar, name: impl Into<String>) -> BoolVar {
        let t = self.new_bool_var(name);
        let mut differ = LinearExpr::from_bool(a);
        differ.add_bool(b);
        self.add_eq(differ, 1).only_enforce_if([t.lit()]);
        let mut same = LinearExpr::from_bool(a);
        same.add_bool_term(b, -1);
        self.add_eq(same, 0).only_enforce_if([t.not()]);
        t
    }

    pub fn minimize(&mut self, expr: LinearExpr) {
        self.objective = Some(Objective {
            sense: Sense::Minimize,
            expr,
        });
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats::default();
        for var in &self.vars {
            match var.domain {
                Domain::Bool => stats.bool_vars += 1,
                Domain::Int { .. } => stats.int_vars += 1,
            }
        }
        for constraint in &self.constraints {
            match constraint {
                Constraint::Linear { .. } => stats.linear += 1,
                Constraint::ExactlyOne { .. } => stats.exactly_one += 1,
                Constraint::AtMostOne { .. } => stats.at_most_one += 1,
                Constraint::AtLeastOne { .. } => stats.at_least_one += 1,
                Constraint::BoolOr { .. } => stats.bool_or += 1,
                Constraint::BoolAnd { .. } => stats.bool_and += 1,
                Constraint::MaxEquality { .. } => stats.max_equality += 1,
                Constraint::MultiplicationEquality { .. } => stats.multiplication += 1,
            }
        }
        stats
    }

    /// Fails with the recorded reasons if any builder misuse was flagged.
    pub fn validate(&self) -> Result<(), RosterError> {
        if let Some(reason) = self.invalid.first() {
            return Err(RosterError::ModelInvalid(reason.clone()));
        }
        Ok(())
    }

    /// Evaluates every constraint against a complete assignment. Reified
    /// constraints whose enforcement literals are not all true are skipped.
    pub fn check(&self, assignment: &Assignment) -> Vec<ConstraintViolation> {
        let values = &assignment.values;
        let mut violations = Vec::new();
        for (index, constraint) in self.constraints.iter().enumerate() {
            let ok = match constraint {
                Constraint::Linear {
                    expr,
                    op,
                    rhs,
                    enforced_by,
                } => {
                    !assignment.all_true(enforced_by) || op.holds(expr.evaluate(values), *rhs)
                }
                Constraint::ExactlyOne { literals } => assignment.count_true(literals) == 1,
                Constraint::AtMostOne { literals } => assignment.count_true(literals) <= 1,
                Constraint::AtLeastOne { literals } => assignment.count_true(literals) >= 1,
                Constraint::BoolOr {
                    literals,
                    enforced_by,
                } => !assignment.all_true(enforced_by) || assignment.count_true(literals) >= 1,
                Constraint::BoolAnd {
                    literals,
                    enforced_by,
                } => {
                    !assignment.all_true(enforced_by)
                        || assignment.count_true(literals) == literals.len()
                }
                Constraint::MaxEquality { target, operands } => {
                    let max = operands
                        .iter()
                        .map(|v| values[v.index()])
                        .max()
                        .unwrap_or(i64::MIN);
                    values[target.index()] == max
                }
                Constraint::MultiplicationEquality { target, factors } => {
                    values[target.index()]
                        == values[factors[0].index()] * values[factors[1].index()]
                }
            };
            if !ok {
                violations.push(ConstraintViolation {
                    constraint: index,
                    detail: format!("{constraint:?}"),
                });
            }
        }
        violations
    }

    pub fn objective_value(&self, assignment: &Assignment) -> Option<i64> {
        self.objective
            .as_ref()
            .map(|o| o.expr.evaluate(&assignment.values))
    }
}

/// A complete valuation of every model variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<i64>,
}

impl Assignment {
    /// All-zero valuation sized for `model`.
    pub fn zeroed(model: &CpModel) -> Self {
        Self {
            values: vec![0; model.num_vars()],
        }
    }

    pub fn from_values(values: Vec<i64>) -> Self {
        Self { values }
    }

    pub fn set_bool(&mut self, var: BoolVar, value: bool) {
        self.values[var.index()] = i64::from(value);
    }

    pub fn set_int(&mut self, var: IntVar, value: i64) {
        self.values[var.index()] = value;
    }

    pub fn bool_value(&self, var: BoolVar) -> bool {
        self.values[var.index()] != 0
    }

    pub fn int_value(&self, var: IntVar) -> i64 {
        self.values[var.index()]
    }

    pub fn literal_value(&self, literal: Literal) -> bool {
        (self.values[literal.var.index()] != 0) != literal.negated
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn all_true(&self, literals: &[Literal]) -> bool {
        literals.iter().all(|&l| self.literal_value(l))
    }

    fn count_true(&self, literals: &[Literal]) -> usize {
        literals.iter().filter(|&&l| self.literal_value(l)).count()
    }
}
