//! Stationary affinely decomposed linear problems `A(μ) u = b(μ)`.

use crate::core::indices::Indices;
use crate::core::parameter::Parameter;
use crate::core::traits::Operator;
use crate::error::MorError;
use crate::operators::LincombOperator;
use crate::reductors::linear::ResidualEstimator;
use crate::vectorarray::DenseVectorArray;

/// Linear problem `A(μ) u = b(μ)` with `b` given as an operator with
/// one-dimensional source.
#[derive(Debug, Clone)]
pub struct StationaryProblem {
    pub operator: LincombOperator,
    pub rhs: LincombOperator,
    pub estimator: Option<ResidualEstimator>,
}

impl StationaryProblem {
    pub fn new(operator: LincombOperator, rhs: LincombOperator) -> Result<Self, MorError> {
        if operator.dim_source() != operator.dim_range() {
            return Err(MorError::DimensionMismatch(format!(
                "operator must be square, got {}x{}",
                operator.dim_range(),
                operator.dim_source()
            )));
        }
        if rhs.dim_source() != 1 || rhs.dim_range() != operator.dim_range() {
            return Err(MorError::DimensionMismatch(format!(
                "rhs must map R^1 to R^{}, got R^{} -> R^{}",
                operator.dim_range(),
                rhs.dim_source(),
                rhs.dim_range()
            )));
        }
        Ok(Self { operator, rhs, estimator: None })
    }

    pub fn with_estimator(mut self, estimator: ResidualEstimator) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn dim_solution(&self) -> usize {
        self.operator.dim_source()
    }

    pub fn parametric(&self) -> bool {
        self.operator.parametric() || self.rhs.parametric()
    }

    /// Solve for `u(μ)` with a dense LU of the assembled operator.
    pub fn solve(&self, mu: Option<&Parameter>) -> Result<DenseVectorArray<f64>, MorError> {
        if self.dim_solution() == 0 {
            // reduced problem on an empty basis
            self.rhs.evaluate_coefficients(mu)?;
            return Ok(DenseVectorArray::zeros(0, 1));
        }
        let a = self.operator.assemble(mu)?;
        let b = self.rhs.as_vector(mu)?;
        a.apply_inverse(&b, &Indices::All)
    }

    /// `b(μ) - A(μ) u` for each vector of `u`.
    pub fn residual(&self, u: &DenseVectorArray<f64>, mu: Option<&Parameter>) -> Result<DenseVectorArray<f64>, MorError> {
        let mut r = self.operator.apply(u, &Indices::All, mu)?;
        r.scal(-1.0, &Indices::All)?;
        let b = self.rhs.as_vector(mu)?;
        r.axpy(1.0, &b, &Indices::All, &Indices::All)?;
        Ok(r)
    }

    /// A posteriori error estimate for the solution `u` at `mu`.
    pub fn estimate(&self, u: &DenseVectorArray<f64>, mu: Option<&Parameter>) -> Result<f64, MorError> {
        match &self.estimator {
            Some(est) => est.estimate(u, mu),
            None => Err(MorError::Unsupported("estimate without an error estimator")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_abs_diff_eq;
    use faer::Mat;

    use super::*;
    use crate::core::parameter::{Coefficient, ProjectionParameterFunctional};
    use crate::matrix::MatrixOperator;

    #[test]
    fn solves_parametric_diagonal_problem() {
        let a0: Arc<dyn Operator> = Arc::new(MatrixOperator::identity(2));
        let a1: Arc<dyn Operator> = Arc::new(MatrixOperator::new(Mat::from_fn(2, 2, |i, j| {
            if i == j && i == 1 { 1.0 } else { 0.0 }
        })));
        let op = LincombOperator::new(
            vec![a0, a1],
            vec![Coefficient::Constant(1.0), Coefficient::parametric(ProjectionParameterFunctional::new(0))],
        )
        .unwrap();
        let rhs = LincombOperator::single(Arc::new(MatrixOperator::from_vector(&[2.0, 4.0])));
        let problem = StationaryProblem::new(op, rhs).unwrap();

        let mu = Parameter::from(3.0);
        let u = problem.solve(Some(&mu)).unwrap();
        assert_abs_diff_eq!(u.vector(0)[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(u.vector(0)[1], 1.0, epsilon = 1e-12);

        let r = problem.residual(&u, Some(&mu)).unwrap();
        assert_abs_diff_eq!(r.l2_norm(&Indices::All).unwrap()[0], 0.0, epsilon = 1e-12);
        assert!(problem.solve(None).is_err());
        assert!(problem.estimate(&u, Some(&mu)).is_err());
    }

    #[test]
    fn rejects_mismatched_rhs() {
        let op = LincombOperator::single(Arc::new(MatrixOperator::identity(3)));
        let rhs = LincombOperator::single(Arc::new(MatrixOperator::from_vector(&[1.0, 2.0])));
        assert!(matches!(StationaryProblem::new(op, rhs), Err(MorError::DimensionMismatch(_))));
    }
}
