use crate::core::Matrix;

pub trait Normalization {
    fn to_unity(&mut self, lb: f64, ub: f64);
}

impl Normalization for Matrix {
    fn to_unity(&mut self, lb: f64, ub: f64) {
        let range = ub - lb;

        // If the range is zero or nearly zero, all values become 0.0
        if range.abs() < f64::EPSILON {
            for val in self.as_mut_slice().iter_mut() {
                *val = 0.0;
            }
        } else {
            for val in self.as_mut_slice().iter_mut() {
                *val = (*val - lb) / range;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;

    #[test]
    fn pixel_values_map_into_unit_range() {
        let mut m = matrix![[0., 51., 255.]].unwrap();
        m.to_unity(0.0, 255.0);
        assert_eq!(m, matrix![[0.0, 0.2, 1.0]].unwrap());
    }

    #[test]
    fn degenerate_range_zeroes_everything() {
        let mut m = matrix![[3., 4.]].unwrap();
        m.to_unity(1.0, 1.0);
        assert_eq!(m, matrix![[0., 0.]].unwrap());
    }
}
