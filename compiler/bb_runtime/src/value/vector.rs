//! N-dimensional numeric vectors.
//!
//! Storage is a flat row-major buffer shared by every view. Indexing the
//! first dimension of an n-dimensional vector yields a view of one row:
//! same storage, shape without its leading extent, and an offset.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::list::checked_index;
use super::Value;
use crate::errors::{shape_mismatch, EvalError, EvalResult};

/// Elements shown before a vector's string form is elided.
const DISPLAY_LIMIT: usize = 10;

#[derive(Clone)]
pub struct NumVector {
    storage: Arc<RwLock<Vec<f64>>>,
    shape: SmallVec<[usize; 2]>,
    offset: usize,
}

impl NumVector {
    /// One-dimensional vector over `data`.
    pub fn from_vec(data: Vec<f64>) -> Self {
        let len = data.len();
        NumVector {
            storage: Arc::new(RwLock::new(data)),
            shape: SmallVec::from_slice(&[len]),
            offset: 0,
        }
    }

    /// Zero-filled vector of the given shape.
    ///
    /// Fails rather than aborting when the element count overflows or the
    /// buffer cannot be allocated.
    pub fn zeros(shape: &[usize]) -> EvalResult<Self> {
        if shape.is_empty() {
            return Err(EvalError::new("A vector needs at least one dimension"));
        }
        let too_large = || EvalError::new(format!("Vector of shape {shape:?} is too large"));
        let size = shape
            .iter()
            .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
            .ok_or_else(too_large)?;
        let mut data = Vec::new();
        data.try_reserve_exact(size).map_err(|_| too_large())?;
        data.resize(size, 0.0);
        Ok(NumVector {
            storage: Arc::new(RwLock::new(data)),
            shape: SmallVec::from_slice(shape),
            offset: 0,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Extent of the first dimension.
    pub fn len(&self) -> usize {
        self.shape[0]
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Total number of elements in this view. Shapes are checked on
    /// construction, so the product fits.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// Elements of this view in row-major order.
    pub fn to_vec(&self) -> Vec<f64> {
        let storage = self.storage.read();
        storage[self.offset..self.offset + self.size()].to_vec()
    }

    /// Element (1-d) or row view (n-d) at `index`.
    pub fn at(&self, index: i64) -> EvalResult<Value> {
        let i = checked_index(index, self.len())?;
        if self.shape.len() == 1 {
            return Ok(Value::Float(self.storage.read()[self.offset + i]));
        }
        let inner: SmallVec<[usize; 2]> = SmallVec::from_slice(&self.shape[1..]);
        let stride: usize = inner.iter().product();
        Ok(Value::Vector(NumVector {
            storage: Arc::clone(&self.storage),
            offset: self.offset + i * stride,
            shape: inner,
        }))
    }

    /// Overwrite one element of a one-dimensional view.
    pub fn put(&self, index: i64, value: f64) -> EvalResult<()> {
        if self.shape.len() != 1 {
            return Err(EvalError::new(
                "Can only set elements of one-dimensional vectors",
            ));
        }
        let i = checked_index(index, self.len())?;
        self.storage.write()[self.offset + i] = value;
        Ok(())
    }

    /// Apply `f` to every element, producing a new contiguous vector.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> NumVector {
        self.rebuild(self.to_vec().into_iter().map(f).collect())
    }

    /// Combine two same-shape vectors elementwise.
    pub fn zip_with(&self, other: &NumVector, f: impl Fn(f64, f64) -> f64) -> EvalResult<NumVector> {
        if self.shape != other.shape {
            return Err(shape_mismatch(&self.shape, &other.shape));
        }
        let right = other.to_vec();
        let data = self
            .to_vec()
            .into_iter()
            .zip(right)
            .map(|(a, b)| f(a, b))
            .collect();
        Ok(self.rebuild(data))
    }

    pub fn sum(&self) -> f64 {
        self.to_vec().iter().sum()
    }

    pub fn max(&self) -> Option<f64> {
        self.to_vec().into_iter().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.to_vec().into_iter().reduce(f64::min)
    }

    /// Contiguous copy with its own storage.
    pub fn copy(&self) -> NumVector {
        self.rebuild(self.to_vec())
    }

    fn rebuild(&self, data: Vec<f64>) -> NumVector {
        NumVector {
            storage: Arc::new(RwLock::new(data)),
            shape: self.shape.clone(),
            offset: 0,
        }
    }

    /// Same storage, same view.
    pub fn ptr_eq(&self, other: &NumVector) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
            && self.offset == other.offset
            && self.shape == other.shape
    }
}

impl fmt::Display for NumVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.to_vec();
        f.write_str("[")?;
        for (i, x) in data.iter().take(DISPLAY_LIMIT).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{x:.6}")?;
        }
        if data.len() > DISPLAY_LIMIT {
            f.write_str(", ...")?;
        }
        f.write_str("]")
    }
}
