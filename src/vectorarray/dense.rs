//! Dense, growable vector array.
//!
//! `DenseVectorArray` stores `len` vectors of common dimension `dim` row by row
//! in a single `Vec<T>`. Appending grows the storage geometrically (through
//! `Vec` reservation) so repeated appends cost O(1) amortized per vector.
//!
//! Operations never alias storage between arrays: `copy` and `append` copy,
//! `append_take`/`replace_take` move vectors out of the source array.

use std::collections::HashSet;
use std::fmt;

use faer::{Mat, MatRef};
use num_traits::Float;

use crate::core::indices::Indices;
use crate::error::MorError;
use crate::utils::float_cmp::{DEFAULT_ATOL, DEFAULT_RTOL, float_cmp_all};

/// Array of equally sized real vectors.
#[derive(Clone, PartialEq)]
pub struct DenseVectorArray<T> {
    data: Vec<T>,
    dim: usize,
    len: usize,
}

fn dot_slices<T: Float>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

impl<T: Float + Send + Sync> DenseVectorArray<T> {
    /// Empty array of dimension `dim` with room for `reserve` vectors.
    pub fn empty(dim: usize, reserve: usize) -> Self {
        Self { data: Vec::with_capacity(dim * reserve), dim, len: 0 }
    }

    /// `count` zero vectors of dimension `dim`.
    pub fn zeros(dim: usize, count: usize) -> Self {
        Self { data: vec![T::zero(); dim * count], dim, len: count }
    }

    /// Build from row-major data holding `data.len() / dim` vectors.
    pub fn from_data(dim: usize, data: Vec<T>) -> Result<Self, MorError> {
        if dim == 0 {
            if !data.is_empty() {
                return Err(MorError::DimensionMismatch("non-empty data for dim 0".into()));
            }
            return Ok(Self::empty(0, 0));
        }
        if data.len() % dim != 0 {
            return Err(MorError::DimensionMismatch(format!(
                "{} values do not split into vectors of dimension {}",
                data.len(),
                dim
            )));
        }
        let len = data.len() / dim;
        Ok(Self { data, dim, len })
    }

    /// Build from a non-empty list of equally long rows.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self, MorError> {
        let dim = rows
            .first()
            .map(|r| r.as_ref().len())
            .ok_or_else(|| MorError::Value("cannot infer dimension from zero rows".into()))?;
        let mut va = Self::empty(dim, rows.len());
        for row in rows {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(MorError::DimensionMismatch(format!(
                    "row of length {} in array of dimension {}",
                    row.len(),
                    dim
                )));
            }
            va.data.extend_from_slice(row);
            va.len += 1;
        }
        Ok(va)
    }

    /// One vector per column of `m`.
    pub fn from_columns(m: MatRef<'_, T>) -> Self {
        let (dim, len) = (m.nrows(), m.ncols());
        let mut data = Vec::with_capacity(dim * len);
        for j in 0..len {
            for i in 0..dim {
                data.push(m[(i, j)]);
            }
        }
        Self { data, dim, len }
    }

    /// The canonical basis of R^dim.
    pub fn identity(dim: usize) -> Self {
        let mut va = Self::zeros(dim, dim);
        for i in 0..dim {
            va.data[i * dim + i] = T::one();
        }
        va
    }

    /// Matrix with the vectors as columns (`dim × len`).
    pub fn to_columns(&self) -> Mat<T> {
        Mat::from_fn(self.dim, self.len, |i, j| self.data[j * self.dim + i])
    }

    /// Matrix with the vectors as rows (`len × dim`).
    pub fn to_rows(&self) -> Mat<T> {
        Mat::from_fn(self.len, self.dim, |i, j| self.data[i * self.dim + j])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of vectors the array can hold without reallocating.
    pub fn capacity(&self) -> usize {
        if self.dim == 0 { usize::MAX } else { self.data.capacity() / self.dim }
    }

    /// Reserve room for at least `additional` more vectors.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional * self.dim);
    }

    /// Vector at position `i`.
    ///
    /// # Panics
    /// Panics if `i >= len`.
    pub fn vector(&self, i: usize) -> &[T] {
        assert!(i < self.len, "vector index {i} out of range for length {}", self.len);
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Vector at position `i`, if any.
    pub fn get(&self, i: usize) -> Option<&[T]> {
        (i < self.len).then(|| &self.data[i * self.dim..(i + 1) * self.dim])
    }

    fn vector_mut(&mut self, i: usize) -> &mut [T] {
        &mut self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate over the valid vectors.
    pub fn iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.len).map(move |i| self.vector(i))
    }

    /// Row-major view of the valid data.
    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len * self.dim]
    }

    fn check_dim(&self, other_dim: usize, what: &str) -> Result<(), MorError> {
        if self.dim != other_dim {
            return Err(MorError::DimensionMismatch(format!(
                "{what}: dimension {} vs {}",
                self.dim, other_dim
            )));
        }
        Ok(())
    }

    fn check_pairs(a: usize, b: usize, what: &str) -> Result<(), MorError> {
        if a != b {
            return Err(MorError::DimensionMismatch(format!(
                "{what}: selections of length {a} and {b}"
            )));
        }
        Ok(())
    }

    /// Deep copy of the selected vectors.
    pub fn copy(&self, ind: &Indices) -> Result<Self, MorError> {
        if ind.is_all() {
            return Ok(Self { data: self.as_slice().to_vec(), dim: self.dim, len: self.len });
        }
        let rows = ind.resolve(self.len)?;
        let mut out = Self::empty(self.dim, rows.len());
        for &r in &rows {
            out.data.extend_from_slice(self.vector(r));
        }
        out.len = rows.len();
        Ok(out)
    }

    /// Append copies of the selected vectors of `other`.
    pub fn append(&mut self, other: &Self, o_ind: &Indices) -> Result<(), MorError> {
        self.check_dim(other.dim, "append")?;
        let rows = o_ind.resolve(other.len)?;
        self.data.reserve(rows.len() * self.dim);
        for &r in &rows {
            self.data.extend_from_slice(other.vector(r));
        }
        self.len += rows.len();
        Ok(())
    }

    /// Append the selected vectors of `other` and remove them from `other`.
    pub fn append_take(&mut self, other: &mut Self, o_ind: &Indices) -> Result<(), MorError> {
        if o_ind.is_all() && self.is_empty() && self.dim == other.dim {
            // whole-array move: hand over the storage
            std::mem::swap(self, other);
            other.data.clear();
            other.len = 0;
            return Ok(());
        }
        self.append(other, o_ind)?;
        other.remove(o_ind)
    }

    /// Delete the selected vectors; `Indices::All` clears the array.
    pub fn remove(&mut self, ind: &Indices) -> Result<(), MorError> {
        if ind.is_all() {
            self.data.clear();
            self.len = 0;
            return Ok(());
        }
        let drop: HashSet<usize> = ind.resolve(self.len)?.into_iter().collect();
        if drop.is_empty() {
            return Ok(());
        }
        let dim = self.dim;
        let mut write = 0;
        for read in 0..self.len {
            if drop.contains(&read) {
                continue;
            }
            if write != read {
                self.data.copy_within(read * dim..(read + 1) * dim, write * dim);
            }
            write += 1;
        }
        self.len = write;
        self.data.truncate(write * dim);
        Ok(())
    }

    /// Overwrite the selected vectors with the selected vectors of `other`.
    pub fn replace(&mut self, other: &Self, ind: &Indices, o_ind: &Indices) -> Result<(), MorError> {
        self.check_dim(other.dim, "replace")?;
        let rows = ind.resolve(self.len)?;
        let o_rows = o_ind.resolve(other.len)?;
        Self::check_pairs(rows.len(), o_rows.len(), "replace")?;
        for (&r, &o) in rows.iter().zip(&o_rows) {
            self.vector_mut(r).copy_from_slice(other.vector(o));
        }
        Ok(())
    }

    /// [`replace`](Self::replace), removing the used vectors from `other`.
    pub fn replace_take(&mut self, other: &mut Self, ind: &Indices, o_ind: &Indices) -> Result<(), MorError> {
        self.replace(other, ind, o_ind)?;
        other.remove(o_ind)
    }

    /// Overwrite vectors of this array with other vectors of the same array.
    pub fn replace_from_self(&mut self, ind: &Indices, src_ind: &Indices) -> Result<(), MorError> {
        if ind == src_ind {
            return ind.resolve(self.len).map(|_| ());
        }
        let src = self.copy(src_ind)?;
        self.replace(&src, ind, &Indices::All)
    }

    /// Pairwise comparison with default tolerances.
    pub fn almost_equal_default(&self, other: &Self, ind: &Indices, o_ind: &Indices) -> Result<Vec<bool>, MorError> {
        self.almost_equal(
            other,
            ind,
            o_ind,
            T::from(DEFAULT_RTOL).unwrap_or_else(T::epsilon),
            T::from(DEFAULT_ATOL).unwrap_or_else(T::epsilon),
        )
    }

    /// For each selected pair, whether all components satisfy
    /// `|a - b| <= atol + rtol * |b|`.
    pub fn almost_equal(
        &self,
        other: &Self,
        ind: &Indices,
        o_ind: &Indices,
        rtol: T,
        atol: T,
    ) -> Result<Vec<bool>, MorError> {
        self.check_dim(other.dim, "almost_equal")?;
        let rows = ind.resolve(self.len)?;
        let o_rows = o_ind.resolve(other.len)?;
        Self::check_pairs(rows.len(), o_rows.len(), "almost_equal")?;
        Ok(rows
            .iter()
            .zip(&o_rows)
            .map(|(&r, &o)| float_cmp_all(self.vector(r), other.vector(o), rtol, atol))
            .collect())
    }

    /// In-place `self[ind] *= alpha`.
    pub fn scal(&mut self, alpha: T, ind: &Indices) -> Result<(), MorError> {
        if ind.is_all() {
            self.data[..self.len * self.dim].iter_mut().for_each(|v| *v = *v * alpha);
            return Ok(());
        }
        for r in ind.resolve(self.len)? {
            self.vector_mut(r).iter_mut().for_each(|v| *v = *v * alpha);
        }
        Ok(())
    }

    fn axpy_row(target: &mut [T], alpha: T, x: &[T]) {
        if alpha == T::one() {
            target.iter_mut().zip(x).for_each(|(t, &v)| *t = *t + v);
        } else if alpha == -T::one() {
            target.iter_mut().zip(x).for_each(|(t, &v)| *t = *t - v);
        } else {
            target.iter_mut().zip(x).for_each(|(t, &v)| *t = *t + alpha * v);
        }
    }

    fn check_broadcast(x_len: usize, n_targets: usize) -> Result<(), MorError> {
        if x_len != n_targets && x_len != 1 {
            return Err(MorError::DimensionMismatch(format!(
                "axpy: {x_len} source vectors for {n_targets} targets"
            )));
        }
        Ok(())
    }

    /// In-place `self[ind] += alpha * x[x_ind]`.
    ///
    /// A single selected `x` vector is added to every selected target.
    pub fn axpy(&mut self, alpha: T, x: &Self, ind: &Indices, x_ind: &Indices) -> Result<(), MorError> {
        self.check_dim(x.dim, "axpy")?;
        let rows = ind.resolve(self.len)?;
        let x_rows = x_ind.resolve(x.len)?;
        Self::check_broadcast(x_rows.len(), rows.len())?;
        if alpha == T::zero() {
            return Ok(());
        }
        for (k, &r) in rows.iter().enumerate() {
            let xr = if x_rows.len() == 1 { x_rows[0] } else { x_rows[k] };
            let dim = self.dim;
            Self::axpy_row(&mut self.data[r * dim..(r + 1) * dim], alpha, x.vector(xr));
        }
        Ok(())
    }

    /// [`axpy`](Self::axpy) with the source vectors taken from this array.
    pub fn axpy_self(&mut self, alpha: T, ind: &Indices, x_ind: &Indices) -> Result<(), MorError> {
        if let (Indices::One(i), Indices::One(j)) = (ind, x_ind) {
            let (i, j) = (Indices::normalize(*i, self.len)?, Indices::normalize(*j, self.len)?);
            if alpha == T::zero() {
                return Ok(());
            }
            if i != j {
                let dim = self.dim;
                let (target, source) = if i < j {
                    let (lo, hi) = self.data.split_at_mut(j * dim);
                    (&mut lo[i * dim..(i + 1) * dim], &hi[..dim])
                } else {
                    let (lo, hi) = self.data.split_at_mut(i * dim);
                    (&mut hi[..dim], &lo[j * dim..(j + 1) * dim])
                };
                Self::axpy_row(target, alpha, source);
                return Ok(());
            }
        }
        let x = self.copy(x_ind)?;
        self.axpy(alpha, &x, ind, &Indices::All)
    }

    /// Gram matrix of inner products (rows: this selection, columns: `other`'s).
    pub fn dot(&self, other: &Self, ind: &Indices, o_ind: &Indices) -> Result<Mat<T>, MorError> {
        self.check_dim(other.dim, "dot")?;
        let rows = ind.resolve(self.len)?;
        let cols = o_ind.resolve(other.len)?;
        let entries = self.gram_entries(other, &rows, &cols);
        let n = cols.len();
        Ok(Mat::from_fn(rows.len(), n, |i, j| entries[i * n + j]))
    }

    #[cfg(not(feature = "rayon"))]
    fn gram_entries(&self, other: &Self, rows: &[usize], cols: &[usize]) -> Vec<T> {
        rows.iter()
            .flat_map(|&r| cols.iter().map(move |&c| dot_slices(self.vector(r), other.vector(c))))
            .collect()
    }

    #[cfg(feature = "rayon")]
    fn gram_entries(&self, other: &Self, rows: &[usize], cols: &[usize]) -> Vec<T> {
        use rayon::prelude::*;
        rows.par_iter()
            .flat_map_iter(|&r| cols.iter().map(move |&c| dot_slices(self.vector(r), other.vector(c))))
            .collect()
    }

    /// Inner products of corresponding selected vectors.
    pub fn pairwise_dot(&self, other: &Self, ind: &Indices, o_ind: &Indices) -> Result<Vec<T>, MorError> {
        self.check_dim(other.dim, "pairwise_dot")?;
        let rows = ind.resolve(self.len)?;
        let cols = o_ind.resolve(other.len)?;
        Self::check_pairs(rows.len(), cols.len(), "pairwise_dot")?;
        Ok(rows
            .iter()
            .zip(&cols)
            .map(|(&r, &c)| dot_slices(self.vector(r), other.vector(c)))
            .collect())
    }

    /// Gram matrix of the selected vectors with themselves.
    pub fn gramian(&self, ind: &Indices) -> Result<Mat<T>, MorError> {
        self.dot(self, ind, ind)
    }

    /// New array whose `k`-th vector is `Σ_j coefficients[(k, j)] · self[ind[j]]`.
    pub fn lincomb(&self, coefficients: MatRef<'_, T>, ind: &Indices) -> Result<Self, MorError> {
        let rows = ind.resolve(self.len)?;
        if coefficients.ncols() != rows.len() {
            return Err(MorError::DimensionMismatch(format!(
                "lincomb: {} coefficients per vector for {} selected vectors",
                coefficients.ncols(),
                rows.len()
            )));
        }
        let count = coefficients.nrows();
        let mut out = Self::zeros(self.dim, count);
        for k in 0..count {
            let dim = self.dim;
            let target = &mut out.data[k * dim..(k + 1) * dim];
            for (j, &r) in rows.iter().enumerate() {
                let c = coefficients[(k, j)];
                if c != T::zero() {
                    Self::axpy_row(target, c, self.vector(r));
                }
            }
        }
        Ok(out)
    }

    /// ℓ1 norm of each selected vector.
    pub fn l1_norm(&self, ind: &Indices) -> Result<Vec<T>, MorError> {
        Ok(ind
            .resolve(self.len)?
            .into_iter()
            .map(|r| self.vector(r).iter().fold(T::zero(), |acc, v| acc + v.abs()))
            .collect())
    }

    /// ℓ2 norm of each selected vector.
    pub fn l2_norm(&self, ind: &Indices) -> Result<Vec<T>, MorError> {
        Ok(ind
            .resolve(self.len)?
            .into_iter()
            .map(|r| dot_slices(self.vector(r), self.vector(r)).sqrt())
            .collect())
    }

    /// Selected coordinates of the selected vectors (rows: vectors).
    pub fn components(&self, component_indices: &[usize], ind: &Indices) -> Result<Mat<T>, MorError> {
        if let Some(&bad) = component_indices.iter().find(|&&c| c >= self.dim) {
            return Err(MorError::Index { index: bad as isize, len: self.dim });
        }
        let rows = ind.resolve(self.len)?;
        Ok(Mat::from_fn(rows.len(), component_indices.len(), |i, j| {
            self.data[rows[i] * self.dim + component_indices[j]]
        }))
    }

    /// Position and value of the largest absolute entry of each selected vector.
    pub fn amax(&self, ind: &Indices) -> Result<(Vec<usize>, Vec<T>), MorError> {
        if self.dim == 0 {
            return Err(MorError::Value("amax of zero-dimensional vectors".into()));
        }
        let rows = ind.resolve(self.len)?;
        let mut positions = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        for r in rows {
            let (pos, val) = self
                .vector(r)
                .iter()
                .map(|v| v.abs())
                .enumerate()
                .fold((0, T::neg_infinity()), |best, (k, v)| if v > best.1 { (k, v) } else { best });
            positions.push(pos);
            values.push(val);
        }
        Ok((positions, values))
    }
}

impl<T: fmt::Debug> fmt::Debug for DenseVectorArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DenseVectorArray(dim={}, len={}) [", self.dim, self.len)?;
        let dim = self.dim.max(1);
        for (k, row) in self.data[..self.len * self.dim].chunks(dim).enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{row:?}")?;
        }
        write!(f, "]")
    }
}
