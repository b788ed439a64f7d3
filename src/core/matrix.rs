use crate::prelude::*;
use rayon::prelude::*;
use std::ops::{Index, IndexMut};

/// Products with at least this many multiply-adds are tiled over the rayon pool.
const PAR_THRESHOLD: usize = 1 << 15;

/// Dense row-major matrix backed by a single contiguous buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

fn allocate(rows: usize, cols: usize, value: f64) -> Result<Vec<f64>> {
    let len = rows
        .checked_mul(cols)
        .ok_or(NNError::ResourceExhausted { rows, cols })?;
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| NNError::ResourceExhausted { rows, cols })?;
    data.resize(len, value);
    Ok(data)
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        Self::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Result<Self> {
        Ok(Self {
            rows,
            cols,
            data: allocate(rows, cols, value)?,
        })
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(NNError::ShapeMismatch(format!(
                "buffer of length {} cannot hold a {}x{} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from equally long rows.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut m = Self::zeros(rows.len(), cols)?;
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(NNError::ShapeMismatch(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            m.row_mut(i).copy_from_slice(row);
        }
        Ok(m)
    }

    /// Copies the matrix into a freshly allocated buffer, reporting allocation failure.
    pub fn try_clone(&self) -> Result<Self> {
        let mut data = allocate(self.rows, self.cols, 0.0)?;
        data.copy_from_slice(&self.data);
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn transpose(&self) -> Result<Matrix> {
        let mut t = Matrix::zeros(self.cols, self.rows)?;
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Ok(t)
    }

    /// Computes `self · other` with a plain triple loop.
    ///
    /// Large products are split by output row across threads. Every row is still
    /// accumulated in the same order, so the result does not depend on the split.
    pub fn product(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(NNError::ShapeMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let (m, k, n) = (self.rows, self.cols, other.cols);
        let mut out = Matrix::zeros(m, n)?;
        if n == 0 {
            return Ok(out);
        }

        let row_kernel = |(i, out_row): (usize, &mut [f64])| {
            let a_row = &self.data[i * k..(i + 1) * k];
            for (j, cell) in out_row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (l, a) in a_row.iter().enumerate() {
                    acc += a * other.data[l * n + j];
                }
                *cell = acc;
            }
        };

        if m.saturating_mul(n).saturating_mul(k) >= PAR_THRESHOLD {
            out.data.par_chunks_mut(n).enumerate().for_each(row_kernel);
        } else {
            out.data.chunks_mut(n).enumerate().for_each(row_kernel);
        }
        Ok(out)
    }

    /// Computes `self · other` and adds `bias` to every output row.
    pub fn product_plus_bias(&self, other: &Matrix, bias: &[f64]) -> Result<Matrix> {
        if bias.len() != other.cols {
            return Err(NNError::ShapeMismatch(format!(
                "bias of length {} cannot broadcast over {} columns",
                bias.len(),
                other.cols
            )));
        }
        let mut out = self.product(other)?;
        for r in 0..out.rows {
            for (cell, b) in out.row_mut(r).iter_mut().zip(bias) {
                *cell += b;
            }
        }
        Ok(out)
    }

    fn zip_with<F: Fn(f64, f64) -> f64>(&self, other: &Matrix, what: &str, f: F) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(NNError::ShapeMismatch(format!(
                "{} of {}x{} and {}x{}",
                what, self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Matrix::zeros(self.rows, self.cols)?;
        for ((o, a), b) in out.data.iter_mut().zip(&self.data).zip(&other.data) {
            *o = f(*a, *b);
        }
        Ok(out)
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "hadamard product", |a, b| a * b)
    }

    /// Elementwise difference `self - other`.
    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        self.zip_with(other, "difference", |a, b| a - b)
    }

    pub fn column_sum(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for row in self.rows_iter() {
            for (s, x) in sums.iter_mut().zip(row) {
                *s += x;
            }
        }
        sums
    }

    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Result<Matrix> {
        let mut out = Matrix::zeros(self.rows, self.cols)?;
        for (o, x) in out.data.iter_mut().zip(&self.data) {
            *o = f(*x);
        }
        Ok(out)
    }

    pub fn map_inplace<F: Fn(f64) -> f64>(&mut self, f: F) {
        for x in self.data.iter_mut() {
            *x = f(*x);
        }
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Copies rows `start..end` into a new matrix.
    pub fn select_rows(&self, start: usize, end: usize) -> Result<Matrix> {
        if start > end || end > self.rows {
            return Err(NNError::ShapeMismatch(format!(
                "row range {}..{} out of bounds for {} rows",
                start, end, self.rows
            )));
        }
        let mut out = Matrix::zeros(end - start, self.cols)?;
        out.data
            .copy_from_slice(&self.data[start * self.cols..end * self.cols]);
        Ok(out)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        &mut self.data[row * self.cols + col]
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(a: Array2<f64>) -> Self {
        let (rows, cols) = a.dim();
        Self {
            rows,
            cols,
            data: a.iter().copied().collect(),
        }
    }
}

impl From<&Matrix> for Array2<f64> {
    fn from(m: &Matrix) -> Self {
        Array2::from_shape_fn((m.rows, m.cols), |(r, c)| m.data[r * m.cols + c])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;
    use approx::assert_abs_diff_eq;

    #[test]
    fn product_matches_hand_computed_cells() {
        let a = matrix![[1., 2., 3.], [4., 5., 6.]].unwrap();
        let b = matrix![[7., 8.], [9., 10.], [11., 12.]].unwrap();
        let c = a.product(&b).unwrap();
        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c, matrix![[58., 64.], [139., 154.]].unwrap());
    }

    #[test]
    fn product_agrees_with_ndarray_dot_on_large_input() {
        // big enough to take the threaded path
        let a = Matrix::from(Array2::from_shape_fn((64, 48), |(i, j)| ((i * 7 + j * 3) % 11) as f64 - 5.0));
        let b = Matrix::from(Array2::from_shape_fn((48, 40), |(i, j)| ((i * 5 + j) % 13) as f64 * 0.25));
        let expected = Array2::from(&a).dot(&Array2::from(&b));
        let got = Array2::from(&a.product(&b).unwrap());
        for (x, y) in got.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn product_rejects_inner_dimension_mismatch() {
        let a = Matrix::zeros(2, 3).unwrap();
        let b = Matrix::zeros(2, 3).unwrap();
        assert!(matches!(a.product(&b), Err(NNError::ShapeMismatch(_))));
    }

    #[test]
    fn bias_is_broadcast_over_rows() {
        let a = matrix![[1., 0.], [0., 1.], [1., 1.]].unwrap();
        let b = matrix![[1., 2.], [3., 4.]].unwrap();
        let c = a.product_plus_bias(&b, &[10., 20.]).unwrap();
        assert_eq!(c, matrix![[11., 22.], [13., 24.], [14., 26.]].unwrap());
        assert!(matches!(
            a.product_plus_bias(&b, &[1.]),
            Err(NNError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn transpose_twice_is_identity() {
        let m = matrix![[1., 2., 3.], [4., 5., 6.]].unwrap();
        let t = m.transpose().unwrap();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t[(2, 1)], 6.);
        assert_eq!(t.transpose().unwrap(), m);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(Matrix::from_rows(&rows), Err(NNError::ShapeMismatch(_))));
    }

    #[test]
    fn oversized_allocation_is_reported() {
        let err = Matrix::zeros(usize::MAX / 2, 4).unwrap_err();
        assert!(matches!(err, NNError::ResourceExhausted { .. }));
    }

    #[test]
    fn column_sum_and_row_selection() {
        let m = matrix![[1., 2.], [3., 4.], [5., 6.]].unwrap();
        assert_eq!(m.column_sum(), vec![9., 12.]);
        let tail = m.select_rows(1, 3).unwrap();
        assert_eq!(tail, matrix![[3., 4.], [5., 6.]].unwrap());
        assert!(m.select_rows(2, 4).is_err());
    }
}
