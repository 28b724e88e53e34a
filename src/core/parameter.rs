//! Parameters and parameter-dependent scalar coefficients.

use std::fmt;
use std::sync::Arc;

use crate::error::MorError;

/// A point in parameter space.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter(Vec<f64>);

impl Parameter {
    pub fn new(values: Vec<f64>) -> Self {
        Parameter(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, component: usize) -> Option<f64> {
        self.0.get(component).copied()
    }
}

impl From<Vec<f64>> for Parameter {
    fn from(values: Vec<f64>) -> Self {
        Parameter(values)
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter(vec![value])
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Scalar function of the parameter, used as an affine coefficient.
pub trait ParameterFunctional {
    /// Value at `mu`; fails when `mu` does not fit the functional.
    fn evaluate(&self, mu: &Parameter) -> Result<f64, MorError>;
}

impl<F> ParameterFunctional for F
where
    F: Fn(&Parameter) -> f64,
{
    fn evaluate(&self, mu: &Parameter) -> Result<f64, MorError> {
        Ok(self(mu))
    }
}

/// Picks one component of the parameter vector.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionParameterFunctional {
    pub component: usize,
}

impl ProjectionParameterFunctional {
    pub fn new(component: usize) -> Self {
        Self { component }
    }
}

impl ParameterFunctional for ProjectionParameterFunctional {
    fn evaluate(&self, mu: &Parameter) -> Result<f64, MorError> {
        mu.get(self.component).ok_or_else(|| {
            MorError::DimensionMismatch(format!(
                "component {} requested from a parameter of length {}",
                self.component,
                mu.len()
            ))
        })
    }
}

/// Coefficient of one term of an affine decomposition.
#[derive(Clone)]
pub enum Coefficient {
    Constant(f64),
    Parametric(Arc<dyn ParameterFunctional>),
}

impl Coefficient {
    pub fn parametric<F: ParameterFunctional + 'static>(f: F) -> Self {
        Coefficient::Parametric(Arc::new(f))
    }

    pub fn is_parametric(&self) -> bool {
        matches!(self, Coefficient::Parametric(_))
    }

    /// Evaluate the coefficient; parametric coefficients need `mu`.
    pub fn evaluate(&self, mu: Option<&Parameter>) -> Result<f64, MorError> {
        match (self, mu) {
            (Coefficient::Constant(c), _) => Ok(*c),
            (Coefficient::Parametric(f), Some(mu)) => f.evaluate(mu),
            (Coefficient::Parametric(_), None) => Err(MorError::Value(
                "parametric coefficient evaluated without a parameter".into(),
            )),
        }
    }
}

impl fmt::Debug for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coefficient::Constant(c) => write!(f, "Constant({c})"),
            Coefficient::Parametric(_) => write!(f, "Parametric(..)"),
        }
    }
}

/// Evaluate a list of coefficients at `mu`.
pub fn evaluate_coefficients(
    coefficients: &[Coefficient],
    mu: Option<&Parameter>,
) -> Result<Vec<f64>, MorError> {
    coefficients.iter().map(|c| c.evaluate(mu)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_and_projections_evaluate() {
        let mu = Parameter::new(vec![0.5, 2.0]);
        let square = Coefficient::parametric(|mu: &Parameter| mu.values()[1].powi(2));
        let first = Coefficient::parametric(ProjectionParameterFunctional::new(0));
        assert_eq!(square.evaluate(Some(&mu)).unwrap(), 4.0);
        assert_eq!(first.evaluate(Some(&mu)).unwrap(), 0.5);
        assert_eq!(Coefficient::Constant(3.0).evaluate(None).unwrap(), 3.0);
    }

    #[test]
    fn parametric_without_mu_fails() {
        let c = Coefficient::parametric(ProjectionParameterFunctional::new(0));
        assert!(matches!(c.evaluate(None), Err(MorError::Value(_))));
    }

    #[test]
    fn projection_outside_parameter_is_an_error() {
        let c = Coefficient::parametric(ProjectionParameterFunctional::new(1));
        assert!(matches!(c.evaluate(Some(&Parameter::from(5.0))), Err(MorError::DimensionMismatch(_))));
        let coeffs = [Coefficient::Constant(1.0), c];
        assert!(evaluate_coefficients(&coeffs, Some(&Parameter::from(5.0))).is_err());
        assert_eq!(evaluate_coefficients(&coeffs, Some(&Parameter::new(vec![5.0, 6.0]))).unwrap(), vec![1.0, 6.0]);
    }
}
