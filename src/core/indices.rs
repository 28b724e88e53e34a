//! Index selectors for bulk vector-array operations.
//!
//! Every array operation takes an [`Indices`] selector. `All` picks every valid
//! vector, `One` a single vector and `List` an ordered (possibly repeating)
//! selection. Negative indices count from the end, so the valid range for an
//! array of length `len` is `[-len, len)`.

use crate::error::MorError;

/// Selection of vectors inside a vector array.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Indices {
    /// Every valid vector.
    #[default]
    All,
    /// A single vector.
    One(isize),
    /// An explicit list of vectors, in order.
    List(Vec<isize>),
}

impl Indices {
    /// Selection of the half-open range `start..end`.
    pub fn range(start: usize, end: usize) -> Self {
        Indices::List((start..end).map(|i| i as isize).collect())
    }

    /// Normalise a single index against `len`.
    pub fn normalize(index: isize, len: usize) -> Result<usize, MorError> {
        let n = len as isize;
        if index < -n || index >= n {
            return Err(MorError::Index { index, len });
        }
        Ok(if index < 0 { (index + n) as usize } else { index as usize })
    }

    /// Check every index against `len` and return them as positions.
    pub fn resolve(&self, len: usize) -> Result<Vec<usize>, MorError> {
        match self {
            Indices::All => Ok((0..len).collect()),
            Indices::One(i) => Ok(vec![Self::normalize(*i, len)?]),
            Indices::List(list) => list.iter().map(|&i| Self::normalize(i, len)).collect(),
        }
    }

    /// Number of selected vectors (without bounds checking).
    pub fn len_in(&self, len: usize) -> usize {
        match self {
            Indices::All => len,
            Indices::One(_) => 1,
            Indices::List(list) => list.len(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Indices::All)
    }
}

impl From<usize> for Indices {
    fn from(i: usize) -> Self {
        Indices::One(i as isize)
    }
}

impl From<isize> for Indices {
    fn from(i: isize) -> Self {
        Indices::One(i)
    }
}

impl From<Vec<usize>> for Indices {
    fn from(list: Vec<usize>) -> Self {
        Indices::List(list.into_iter().map(|i| i as isize).collect())
    }
}

impl From<std::ops::Range<usize>> for Indices {
    fn from(r: std::ops::Range<usize>) -> Self {
        Indices::range(r.start, r.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_wrap() {
        let ind = Indices::List(vec![-1, 0, -3]);
        assert_eq!(ind.resolve(3).unwrap(), vec![2, 0, 0]);
    }

    #[test]
    fn out_of_range_is_index_error() {
        assert_eq!(
            Indices::One(3).resolve(3),
            Err(MorError::Index { index: 3, len: 3 })
        );
        assert_eq!(
            Indices::One(-4).resolve(3),
            Err(MorError::Index { index: -4, len: 3 })
        );
    }

    #[test]
    fn all_on_empty_array_is_empty() {
        assert!(Indices::All.resolve(0).unwrap().is_empty());
        assert!(Indices::One(0).resolve(0).is_err());
    }
}
