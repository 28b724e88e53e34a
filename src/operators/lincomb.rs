//! Affinely decomposed operators `A(μ) = Σ_k θ_k(μ) A_k`.

use std::sync::Arc;

use faer::Mat;

use crate::core::indices::Indices;
use crate::core::parameter::{Coefficient, Parameter, evaluate_coefficients};
use crate::core::traits::Operator;
use crate::error::MorError;
use crate::matrix::MatrixOperator;
use crate::vectorarray::DenseVectorArray;

/// Linear combination of non-parametric operators with scalar coefficients.
#[derive(Clone)]
pub struct LincombOperator {
    pub operators: Vec<Arc<dyn Operator>>,
    pub coefficients: Vec<Coefficient>,
}

impl LincombOperator {
    pub fn new(operators: Vec<Arc<dyn Operator>>, coefficients: Vec<Coefficient>) -> Result<Self, MorError> {
        if operators.is_empty() {
            return Err(MorError::Value("linear combination of zero operators".into()));
        }
        if operators.len() != coefficients.len() {
            return Err(MorError::DimensionMismatch(format!(
                "{} operators but {} coefficients",
                operators.len(),
                coefficients.len()
            )));
        }
        let (ds, dr) = (operators[0].dim_source(), operators[0].dim_range());
        if operators.iter().any(|op| op.dim_source() != ds || op.dim_range() != dr) {
            return Err(MorError::DimensionMismatch("terms of a linear combination must share source and range".into()));
        }
        Ok(Self { operators, coefficients })
    }

    /// Non-parametric operator consisting of a single term with coefficient 1.
    pub fn single(op: Arc<dyn Operator>) -> Self {
        Self { operators: vec![op], coefficients: vec![Coefficient::Constant(1.0)] }
    }

    pub fn num_terms(&self) -> usize {
        self.operators.len()
    }

    pub fn parametric(&self) -> bool {
        self.coefficients.iter().any(Coefficient::is_parametric)
    }

    pub fn dim_source(&self) -> usize {
        self.operators[0].dim_source()
    }

    pub fn dim_range(&self) -> usize {
        self.operators[0].dim_range()
    }

    pub fn evaluate_coefficients(&self, mu: Option<&Parameter>) -> Result<Vec<f64>, MorError> {
        evaluate_coefficients(&self.coefficients, mu)
    }

    /// `Σ_k θ_k(μ) A_k u`.
    pub fn apply(
        &self,
        u: &DenseVectorArray<f64>,
        ind: &Indices,
        mu: Option<&Parameter>,
    ) -> Result<DenseVectorArray<f64>, MorError> {
        let theta = self.evaluate_coefficients(mu)?;
        let mut result = DenseVectorArray::zeros(self.dim_range(), ind.len_in(u.len()));
        for (op, &c) in self.operators.iter().zip(&theta) {
            let term = op.apply(u, ind)?;
            result.axpy(c, &term, &Indices::All, &Indices::All)?;
        }
        Ok(result)
    }

    /// Dense matrix of `A(μ)`.
    pub fn assemble(&self, mu: Option<&Parameter>) -> Result<MatrixOperator, MorError> {
        let theta = self.evaluate_coefficients(mu)?;
        let mut matrix = Mat::<f64>::zeros(self.dim_range(), self.dim_source());
        for (op, &c) in self.operators.iter().zip(&theta) {
            if c == 0.0 {
                continue;
            }
            let term = op.assemble()?;
            for j in 0..matrix.ncols() {
                for i in 0..matrix.nrows() {
                    matrix[(i, j)] += c * term[(i, j)];
                }
            }
        }
        Ok(MatrixOperator::new(matrix))
    }

    /// Vector represented by `A(μ)` when the source is one-dimensional.
    pub fn as_vector(&self, mu: Option<&Parameter>) -> Result<DenseVectorArray<f64>, MorError> {
        if self.dim_source() != 1 {
            return Err(MorError::DimensionMismatch(format!(
                "as_vector needs dim_source == 1, got {}",
                self.dim_source()
            )));
        }
        self.apply(&DenseVectorArray::from_data(1, vec![1.0])?, &Indices::All, mu)
    }
}

impl std::fmt::Debug for LincombOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LincombOperator")
            .field("dim_source", &self.dim_source())
            .field("dim_range", &self.dim_range())
            .field("coefficients", &self.coefficients)
            .finish()
    }
}
