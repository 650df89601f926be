/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Dense square evaluation matrix and row normalization.
//!
//! Given a non-negative square matrix of raw evaluation weights, clamps stray
//! negatives to zero and divides every row by its sum so that each row is a
//! probability distribution over the community. The result is row-stochastic:
//! every member's outgoing evaluations (self-budget included) sum to 1.0.
//!
//! # Invariants
//! - Storage is always `n × n`, row-major, with finite entries.
//! - After a successful [`Matrix::normalize_rows`], every entry is in `[0, 1]`
//!   and every row sums to 1.0 within `1e-12`.
//! - A failed normalization leaves the matrix untouched.
//! - Zero unsafe code.

use core::ops::{Index, IndexMut};

use crate::error::{PicsyError, Result};

/// Tolerance used by [`Matrix::is_row_stochastic`] callers that do not pick their own.
pub const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Dense `n × n` matrix of `f64`, row-major.
///
/// `Clone` is the deep copy: every mutation path works on a clone of the
/// committed matrix until the result is explicitly committed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")
)]
pub struct Matrix {
    n: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// All-zero `n × n` matrix.
    pub fn zeros(n: usize) -> Self {
        Self { n, data: vec![0.0; n * n] }
    }

    /// `n × n` identity.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Build from a fixed-size array. Entries are taken as given.
    pub(crate) fn from_array<const N: usize>(rows: &[[f64; N]; N]) -> Self {
        Self { n: N, data: rows.iter().flatten().copied().collect() }
    }

    /// Build from nested rows.
    ///
    /// Fails with [`PicsyError::SizeMismatch`] if any row length differs from
    /// the number of rows, and with [`PicsyError::NonFinite`] on NaN/inf entries.
    /// No normalization is applied.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(PicsyError::SizeMismatch { expected: n, found: row.len() });
            }
            if let Some(j) = row.iter().position(|x| !x.is_finite()) {
                return Err(PicsyError::NonFinite { row: i, col: j });
            }
            data.extend(row);
        }
        Ok(Self { n, data })
    }

    /// Nested-row copy of the matrix.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }

    /// Number of rows (= number of columns).
    pub fn dim(&self) -> usize {
        self.n
    }

    /// `true` for the 0 × 0 matrix.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Entry `[i][j]`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self[(i, j)]
    }

    /// Row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// Row `i` as a mutable slice.
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let n = self.n;
        &mut self.data[i * n..(i + 1) * n]
    }

    /// Iterate rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics, and a 0×0 matrix has no rows anyway.
        self.data.chunks_exact(self.n.max(1))
    }

    /// Diagonal entries `E[i][i]` (self-budgets).
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.n).map(|i| self[(i, i)]).collect()
    }

    /// Compensated sum of every row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.rows().map(|r| kahan_sum(r.iter().copied())).collect()
    }

    /// `true` if every entry is non-negative and every row sums to 1 within `tolerance`.
    pub fn is_row_stochastic(&self, tolerance: f64) -> bool {
        self.check_row_stochastic(tolerance).is_ok()
    }

    /// Like [`Matrix::is_row_stochastic`], but names the first offending row.
    ///
    /// Fails with [`PicsyError::NotStochastic`].
    pub fn check_row_stochastic(&self, tolerance: f64) -> Result<()> {
        for (row, r) in self.rows().enumerate() {
            let sum = kahan_sum(r.iter().copied());
            if r.iter().any(|&x| x < 0.0) || (sum - 1.0).abs() > tolerance {
                return Err(PicsyError::NotStochastic { row, sum });
            }
        }
        Ok(())
    }

    /// Normalize every row in place: clamp negatives to 0, divide by the row sum.
    ///
    /// Row sums are Kahan-compensated and the residual `1 − Σrow` left after
    /// division is folded into the row's largest entry.
    ///
    /// Fails with [`PicsyError::DegenerateRow`] if any clamped row sum is ≤ 0.
    /// All rows are checked before any entry is written, so a failure leaves
    /// the matrix unchanged.
    pub fn normalize_rows(&mut self) -> Result<()> {
        let sums: Vec<f64> = self
            .rows()
            .map(|r| kahan_sum(r.iter().map(|&x| x.max(0.0))))
            .collect();
        if let Some((row, &sum)) = sums
            .iter()
            .enumerate()
            .find(|(_, s)| **s <= 0.0 || !s.is_finite())
        {
            return Err(PicsyError::DegenerateRow { row, sum });
        }

        for (i, sum) in sums.into_iter().enumerate() {
            let row = self.row_mut(i);
            let inv = 1.0 / sum;
            for x in row.iter_mut() {
                *x = x.max(0.0) * inv;
            }
            let residual = 1.0 - kahan_sum(row.iter().copied());
            if residual != 0.0 {
                let k = argmax(row);
                row[k] = (row[k] + residual).max(0.0);
            }
        }
        Ok(())
    }

    /// Normalized deep copy; `self` is untouched.
    pub fn normalized(&self) -> Result<Self> {
        let mut m = self.clone();
        m.normalize_rows()?;
        Ok(m)
    }

    /// `Eᵗ · v`: the left-multiplication `vᵗ E` returned as a column.
    pub fn transpose_mul(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(v.len(), self.n);
        let mut out = vec![0.0; self.n];
        for (row, &vi) in self.rows().zip(v) {
            if vi == 0.0 {
                continue;
            }
            for (o, &e) in out.iter_mut().zip(row) {
                *o += e * vi;
            }
        }
        out
    }

    /// Copy into the top-left corner of a zero `(n+1) × (n+1)` matrix.
    pub fn grown(&self) -> Self {
        let mut m = Self::zeros(self.n + 1);
        for (i, row) in self.rows().enumerate() {
            m.row_mut(i)[..self.n].copy_from_slice(row);
        }
        m
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.n + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.n + j]
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = PicsyError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(m: Matrix) -> Self {
        m.to_rows()
    }
}

/// Kahan-compensated sum.
pub(crate) fn kahan_sum(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for x in values {
        let y = x - c;
        let t = sum + y;
        c = (t - sum) - y;
        sum = t;
    }
    sum
}

fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (j, &x) in row.iter().enumerate() {
        if x > row[best] {
            best = j;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    fn assert_row_stochastic(m: &Matrix, tol: f64) {
        for (i, s) in m.row_sums().iter().enumerate() {
            assert!((s - 1.0).abs() < tol, "row {} sum = {}", i, s);
        }
        for row in m.rows() {
            for &v in row {
                assert!((0.0..=1.0 + tol).contains(&v), "entry {} out of [0,1]", v);
            }
        }
    }

    #[test]
    fn test_check_row_stochastic_names_first_bad_row() {
        assert!(m(&[&[0.5, 0.5], &[0.2, 0.8]]).check_row_stochastic(1e-12).is_ok());
        assert_eq!(
            m(&[&[0.5, 0.5], &[3.0, 2.0]]).check_row_stochastic(1e-9),
            Err(PicsyError::NotStochastic { row: 1, sum: 5.0 })
        );
        // Sums to 1 but carries a negative entry.
        assert!(matches!(
            m(&[&[1.5, -0.5], &[0.5, 0.5]]).check_row_stochastic(1e-9),
            Err(PicsyError::NotStochastic { row: 0, .. })
        ));
    }

    #[test]
    fn test_from_array_matches_from_rows() {
        let a = Matrix::from_array(&[[0.25, 0.75], [1.0, 0.0]]);
        assert_eq!(a, m(&[&[0.25, 0.75], &[1.0, 0.0]]));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Matrix::from_rows(vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert_eq!(err, PicsyError::SizeMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn test_from_rows_rejects_non_finite() {
        let err = Matrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, f64::NAN]]).unwrap_err();
        assert_eq!(err, PicsyError::NonFinite { row: 1, col: 1 });
    }

    #[test]
    fn test_normalize_rows_divides_by_sum() {
        let mut a = m(&[&[2.0, 1.0, 1.0], &[0.0, 3.0, 1.0], &[5.0, 5.0, 0.0]]);
        a.normalize_rows().unwrap();
        assert_row_stochastic(&a, 1e-12);
        assert!((a[(0, 0)] - 0.5).abs() < 1e-12);
        assert!((a[(1, 1)] - 0.75).abs() < 1e-12);
        assert!((a[(2, 1)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_rows_clamps_negatives() {
        let mut a = m(&[&[-1.0, 1.0], &[0.5, 0.5]]);
        a.normalize_rows().unwrap();
        assert_eq!(a[(0, 0)], 0.0);
        assert!((a[(0, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_rows_rejects_zero_row_without_mutation() {
        let mut a = m(&[&[2.0, 2.0], &[-1.0, 0.0]]);
        let before = a.clone();
        let err = a.normalize_rows().unwrap_err();
        assert_eq!(err, PicsyError::DegenerateRow { row: 1, sum: 0.0 });
        assert_eq!(a, before, "failed normalization must not touch the matrix");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let a = m(&[&[0.4, 0.3, 0.3], &[0.2, 0.3, 0.5], &[0.25, 0.45, 0.30]]);
        let once = a.normalized().unwrap();
        let twice = once.normalized().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert!((once[(i, j)] - a[(i, j)]).abs() < 1e-12);
                assert!((twice[(i, j)] - once[(i, j)]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_normalize_thirds_sums_exactly() {
        let mut a = m(&[&[1.0, 1.0, 1.0], &[3.0, 3.0, 3.0], &[0.1, 0.1, 0.1]]);
        a.normalize_rows().unwrap();
        for s in a.row_sums() {
            assert!((s - 1.0).abs() <= 1e-15, "sum = {}", s);
        }
    }

    #[test]
    fn test_normalized_leaves_source_untouched() {
        let a = m(&[&[2.0, 2.0], &[1.0, 3.0]]);
        let b = a.normalized().unwrap();
        assert_eq!(a[(0, 0)], 2.0);
        assert!((b[(0, 0)] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_transpose_mul() {
        let a = m(&[&[0.0, 1.0], &[0.5, 0.5]]);
        // Eᵗ · [1, 2] = [0*1 + 0.5*2, 1*1 + 0.5*2]
        let out = a.transpose_mul(&[1.0, 2.0]);
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn test_grown_pads_with_zeros() {
        let a = m(&[&[0.5, 0.5], &[0.1, 0.9]]);
        let g = a.grown();
        assert_eq!(g.dim(), 3);
        assert_eq!(g.row(0), &[0.5, 0.5, 0.0]);
        assert_eq!(g.row(1), &[0.1, 0.9, 0.0]);
        assert_eq!(g.row(2), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_identity_and_diagonal() {
        let i = Matrix::identity(3);
        assert!(i.is_row_stochastic(ROW_SUM_TOLERANCE));
        assert_eq!(i.diagonal(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_empty_matrix() {
        let e = Matrix::from_rows(Vec::new()).unwrap();
        assert!(e.is_empty());
        assert_eq!(e.rows().count(), 0);
        assert!(e.clone().normalize_rows().is_ok());
    }

    #[test]
    fn test_round_trip_rows() {
        let rows = vec![vec![0.25, 0.75], vec![1.0, 0.0]];
        let a = Matrix::from_rows(rows.clone()).unwrap();
        assert_eq!(a.to_rows(), rows);
    }
}
