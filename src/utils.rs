/// Builds a [`Matrix`](crate::core::Matrix) from row literals, returning a `Result`
/// so ragged rows surface as [`NNError::ShapeMismatch`](crate::error::NNError).
///
/// ```
/// let m = rmlp::matrix![[1, 2], [3, 4]].unwrap();
/// assert_eq!(m.shape(), (2, 2));
/// assert_eq!(m[(1, 0)], 3.0);
/// ```
#[macro_export]
macro_rules! matrix {
    ($([$($x:expr),* $(,)?]),+ $(,)?) => {
        $crate::core::Matrix::from_rows(&[$(vec![$($x as f64),*]),+])
    };
}
