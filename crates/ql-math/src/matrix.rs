//! `Matrix`: a two-dimensional matrix of reals.
//!
//! A thin newtype around `nalgebra::DMatrix<f64>`.  Pseudo-roots are stored
//! as `rates × factors` matrices and the simulation loops only need a few
//! row-wise kernels, which are exposed here so that callers never touch
//! nalgebra's column-major layout directly.

use nalgebra::DMatrix;
use ql_core::{
    errors::{Error, Result},
    Real,
};
use std::ops::{Index, IndexMut, Mul};

/// A dynamically-sized 2D matrix of `Real` values (row-major access).
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix(DMatrix<Real>);

impl Matrix {
    /// Create a zero-filled `rows × cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self(DMatrix::zeros(rows, cols))
    }

    /// Create a matrix filled with `value`.
    pub fn from_element(rows: usize, cols: usize, value: Real) -> Self {
        Self(DMatrix::from_element(rows, cols, value))
    }

    /// Create an identity matrix of size `n × n`.
    pub fn identity(n: usize) -> Self {
        Self(DMatrix::identity(n, n))
    }

    /// Create a square matrix with `diagonal` on its diagonal.
    pub fn from_diagonal(diagonal: &[Real]) -> Self {
        let n = diagonal.len();
        Self(DMatrix::from_fn(n, n, |i, j| if i == j { diagonal[i] } else { 0.0 }))
    }

    /// Create from a row-major data slice.
    pub fn from_row_slice(rows: usize, cols: usize, data: &[Real]) -> Self {
        Self(DMatrix::from_row_slice(rows, cols, data))
    }

    /// Create from a list of rows; all rows must have the same length.
    pub fn from_rows(rows: &[Vec<Real>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(Error::InvalidArgument(format!(
                "row {i} has {} columns, expected {cols}",
                r.len()
            )));
        }
        Ok(Self(DMatrix::from_fn(rows.len(), cols, |i, j| rows[i][j])))
    }

    /// Create from a function of `(row, column)`.
    pub fn from_fn<F: FnMut(usize, usize) -> Real>(rows: usize, cols: usize, f: F) -> Self {
        Self(DMatrix::from_fn(rows, cols, f))
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.0.nrows()
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.0.ncols()
    }

    /// Return `true` if the matrix is square.
    pub fn is_square(&self) -> bool {
        self.0.nrows() == self.0.ncols()
    }

    /// Return `true` if all elements are zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&x| x == 0.0)
    }

    /// Return `true` if no element is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }

    /// Borrow the inner `DMatrix`.
    pub fn inner(&self) -> &DMatrix<Real> {
        &self.0
    }

    /// Transpose.
    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    /// `M·Mᵗ`, the covariance generated by a pseudo-root.
    pub fn outer_product(&self) -> Self {
        Self(&self.0 * self.0.transpose())
    }

    /// Diagonal elements.
    pub fn diagonal(&self) -> Vec<Real> {
        let n = self.0.nrows().min(self.0.ncols());
        (0..n).map(|i| self.0[(i, i)]).collect()
    }

    /// Copy of row `i`.
    pub fn row(&self, i: usize) -> Vec<Real> {
        self.0.row(i).iter().copied().collect()
    }

    /// Dot product of row `i` with `v` (`v.len()` must equal `cols()`).
    #[inline]
    pub fn row_dot(&self, i: usize, v: &[Real]) -> Real {
        debug_assert_eq!(v.len(), self.0.ncols());
        v.iter()
            .enumerate()
            .map(|(j, x)| self.0[(i, j)] * x)
            .sum()
    }

    /// Dot product of row `i` with row `j`.
    #[inline]
    pub fn row_row_dot(&self, i: usize, j: usize) -> Real {
        (0..self.0.ncols())
            .map(|k| self.0[(i, k)] * self.0[(j, k)])
            .sum()
    }

    /// Multiply row `i` by `factors[i]` for every row.
    pub fn scale_rows(&self, factors: &[Real]) -> Self {
        debug_assert_eq!(factors.len(), self.0.nrows());
        Self(DMatrix::from_fn(self.0.nrows(), self.0.ncols(), |i, j| {
            self.0[(i, j)] * factors[i]
        }))
    }

    /// Multiply every element by `scalar`.
    pub fn scale(&self, scalar: Real) -> Self {
        Self(&self.0 * scalar)
    }
}

// ── From / Into ───────────────────────────────────────────────────────────────

impl From<DMatrix<Real>> for Matrix {
    fn from(m: DMatrix<Real>) -> Self {
        Self(m)
    }
}

impl From<Matrix> for DMatrix<Real> {
    fn from(m: Matrix) -> Self {
        m.0
    }
}

// ── Indexing ──────────────────────────────────────────────────────────────────

impl Index<(usize, usize)> for Matrix {
    type Output = Real;
    fn index(&self, (i, j): (usize, usize)) -> &Real {
        &self.0[(i, j)]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Real {
        &mut self.0[(i, j)]
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

impl Mul for &Matrix {
    type Output = Matrix;
    fn mul(self, rhs: &Matrix) -> Matrix {
        Matrix(&self.0 * &rhs.0)
    }
}

impl std::ops::Add for &Matrix {
    type Output = Matrix;
    fn add(self, rhs: &Matrix) -> Matrix {
        Matrix(&self.0 + &rhs.0)
    }
}
