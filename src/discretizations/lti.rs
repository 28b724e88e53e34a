//! Linear time-invariant systems and their Gramian factors.
//!
//! ```text
//! E x'(t) = A x(t) + B u(t)
//!    y(t) = C x(t) + D u(t)
//! ```
//!
//! Computing the Gramians themselves (Lyapunov or Riccati equations) is the
//! job of a [`MatrixEquationSolver`]; this module only describes the system
//! and hands back factors that were computed elsewhere.

use crate::core::traits::{MatrixEquationSolver, Operator};
use crate::error::MorError;
use crate::matrix::MatrixOperator;
use crate::vectorarray::DenseVectorArray;

/// Which pair of Gramians balanced truncation balances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GramianType {
    /// Controllability and observability Gramians (Lyapunov equations).
    Lyap,
    /// LQG Gramians (Riccati equations).
    Lqg,
    /// Bounded-real Gramians for the given `γ`.
    Br(f64),
}

/// Low-rank factors `P ≈ cf cfᵀ` and `Q ≈ of ofᵀ`, stored as vector arrays
/// of dimension `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct GramianFactors {
    pub cf: DenseVectorArray<f64>,
    pub of: DenseVectorArray<f64>,
}

/// State-space system with dense matrices; `e == None` means `E = I`.
#[derive(Debug, Clone)]
pub struct LtiSystem {
    pub a: MatrixOperator,
    pub b: MatrixOperator,
    pub c: MatrixOperator,
    pub d: MatrixOperator,
    pub e: Option<MatrixOperator>,
}

impl LtiSystem {
    pub fn new(
        a: MatrixOperator,
        b: MatrixOperator,
        c: MatrixOperator,
        d: MatrixOperator,
        e: Option<MatrixOperator>,
    ) -> Result<Self, MorError> {
        let n = a.dim_source();
        let shape = |op: &MatrixOperator| (op.dim_range(), op.dim_source());
        if a.dim_range() != n {
            return Err(MorError::DimensionMismatch(format!("A must be square, got {:?}", shape(&a))));
        }
        if b.dim_range() != n || c.dim_source() != n {
            return Err(MorError::DimensionMismatch(format!(
                "B {:?} and C {:?} do not match state dimension {}",
                shape(&b),
                shape(&c),
                n
            )));
        }
        if shape(&d) != (c.dim_range(), b.dim_source()) {
            return Err(MorError::DimensionMismatch(format!(
                "D must be {}x{}, got {:?}",
                c.dim_range(),
                b.dim_source(),
                shape(&d)
            )));
        }
        if let Some(e) = &e {
            if shape(e) != (n, n) {
                return Err(MorError::DimensionMismatch(format!("E must be {n}x{n}, got {:?}", shape(e))));
            }
        }
        Ok(Self { a, b, c, d, e })
    }

    /// State dimension.
    pub fn n(&self) -> usize {
        self.a.dim_source()
    }

    /// Number of inputs.
    pub fn m(&self) -> usize {
        self.b.dim_source()
    }

    /// Number of outputs.
    pub fn p(&self) -> usize {
        self.c.dim_range()
    }

    pub fn gramian_factors(
        &self,
        solver: &dyn MatrixEquationSolver,
        typ: GramianType,
    ) -> Result<GramianFactors, MorError> {
        let factors = solver.gramian_factors(self, typ)?;
        if factors.cf.dim() != self.n() || factors.of.dim() != self.n() {
            return Err(MorError::DimensionMismatch(format!(
                "Gramian factors of dimension {}/{} for a system of order {}",
                factors.cf.dim(),
                factors.of.dim(),
                self.n()
            )));
        }
        Ok(factors)
    }
}

/// Solver that returns factors computed ahead of time, one pair per
/// Gramian type.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedGramians {
    entries: Vec<(GramianType, GramianFactors)>,
}

impl PrecomputedGramians {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, typ: GramianType, factors: GramianFactors) -> Self {
        self.insert(typ, factors);
        self
    }

    pub fn insert(&mut self, typ: GramianType, factors: GramianFactors) {
        match self.entries.iter_mut().find(|(t, _)| *t == typ) {
            Some(entry) => entry.1 = factors,
            None => self.entries.push((typ, factors)),
        }
    }
}

impl MatrixEquationSolver for PrecomputedGramians {
    fn gramian_factors(&self, _sys: &LtiSystem, typ: GramianType) -> Result<GramianFactors, MorError> {
        self.entries
            .iter()
            .find(|(t, _)| *t == typ)
            .map(|(_, f)| f.clone())
            .ok_or_else(|| MorError::Value(format!("no Gramian factors available for {typ:?}")))
    }
}
