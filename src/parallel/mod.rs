//! Local and remote vector arrays.
//!
//! Algorithms in this crate work on [`DenseVectorArray`]s held in local
//! memory. An array living elsewhere (another process, a device) is wrapped
//! as [`ArrayHandle::Remote`] and must be synchronized into a local snapshot
//! before its data can be touched.

use std::fmt;

use tracing::debug;

use crate::error::MorError;
use crate::vectorarray::DenseVectorArray;

/// Backend holding vector data outside of local memory.
pub trait RemoteArray<T> {
    /// Dimension of the vectors.
    fn dim(&self) -> usize;

    /// Number of vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gather all vectors into local memory.
    fn fetch(&self) -> Result<DenseVectorArray<T>, MorError>;
}

/// A vector array that is either available locally or must be fetched first.
pub enum ArrayHandle<T> {
    Local(DenseVectorArray<T>),
    Remote(Box<dyn RemoteArray<T>>),
}

impl<T: num_traits::Float + Send + Sync> ArrayHandle<T> {
    pub fn dim(&self) -> usize {
        match self {
            ArrayHandle::Local(a) => a.dim(),
            ArrayHandle::Remote(r) => r.dim(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayHandle::Local(a) => a.len(),
            ArrayHandle::Remote(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ArrayHandle::Local(_))
    }

    /// Direct access to the data; fails for remote arrays.
    pub fn local(&self) -> Result<&DenseVectorArray<T>, MorError> {
        match self {
            ArrayHandle::Local(a) => Ok(a),
            ArrayHandle::Remote(_) => Err(MorError::Communication(
                "array is remote; call synchronize() first".into(),
            )),
        }
    }

    /// Mutable access to the data; fails for remote arrays.
    pub fn local_mut(&mut self) -> Result<&mut DenseVectorArray<T>, MorError> {
        match self {
            ArrayHandle::Local(a) => Ok(a),
            ArrayHandle::Remote(_) => Err(MorError::Communication(
                "array is remote; call synchronize() first".into(),
            )),
        }
    }

    /// Replace a remote array by a local snapshot of its data.
    pub fn synchronize(&mut self) -> Result<&mut DenseVectorArray<T>, MorError> {
        if let ArrayHandle::Remote(remote) = self {
            let local = remote.fetch()?;
            if local.dim() != remote.dim() || local.len() != remote.len() {
                return Err(MorError::Communication(format!(
                    "fetched {} vectors of dimension {}, expected {} of dimension {}",
                    local.len(),
                    local.dim(),
                    remote.len(),
                    remote.dim()
                )));
            }
            debug!("synchronized remote array ({} x {})", local.len(), local.dim());
            *self = ArrayHandle::Local(local);
        }
        self.local_mut()
    }

    /// Local array, synchronizing first if necessary.
    pub fn into_local(mut self) -> Result<DenseVectorArray<T>, MorError> {
        self.synchronize()?;
        match self {
            ArrayHandle::Local(a) => Ok(a),
            ArrayHandle::Remote(_) => Err(MorError::Communication("synchronization left the array remote".into())),
        }
    }
}

impl<T> From<DenseVectorArray<T>> for ArrayHandle<T> {
    fn from(a: DenseVectorArray<T>) -> Self {
        ArrayHandle::Local(a)
    }
}

impl<T: fmt::Debug> fmt::Debug for ArrayHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayHandle::Local(a) => f.debug_tuple("Local").field(a).finish(),
            ArrayHandle::Remote(_) => f.write_str("Remote(..)"),
        }
    }
}
