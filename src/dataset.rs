use crate::prelude::*;
use std::io;
use std::path::Path;

/// Feature rows paired with one-hot (or regression) target rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Matrix,
    targets: Matrix,
}

impl Dataset {
    pub fn new(features: Matrix, targets: Matrix) -> Result<Self> {
        if features.rows() != targets.rows() {
            return Err(NNError::Dataset(format!(
                "{} feature rows but {} target rows",
                features.rows(),
                targets.rows()
            )));
        }
        Ok(Self { features, targets })
    }

    /// The four-row XOR truth table.
    pub fn xor() -> Result<Self> {
        Self::new(
            Matrix::from_rows(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]])?,
            Matrix::from_rows(&[[0.0], [1.0], [1.0], [0.0]])?,
        )
    }

    pub fn len(&self) -> usize {
        self.features.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn input_size(&self) -> usize {
        self.features.cols()
    }

    pub fn output_size(&self) -> usize {
        self.targets.cols()
    }

    pub fn features(&self) -> &Matrix {
        &self.features
    }

    pub fn targets(&self) -> &Matrix {
        &self.targets
    }

    /// Full batches of `batch_size` rows in order; trailing samples are dropped.
    pub fn batches(&self, batch_size: usize) -> Batches<'_> {
        let count = if batch_size == 0 {
            0
        } else {
            self.len() / batch_size
        };
        Batches {
            dataset: self,
            batch_size,
            next: 0,
            count,
        }
    }

    /// Splits off the first `n` rows, e.g. as a validation hold-out.
    pub fn split_at(&self, n: usize) -> Result<(Dataset, Dataset)> {
        if n > self.len() {
            return Err(NNError::Dataset(format!(
                "cannot split {} rows at {}",
                self.len(),
                n
            )));
        }
        let head = Dataset::new(
            self.features.select_rows(0, n)?,
            self.targets.select_rows(0, n)?,
        )?;
        let tail = Dataset::new(
            self.features.select_rows(n, self.len())?,
            self.targets.select_rows(n, self.len())?,
        )?;
        Ok((head, tail))
    }

    /// Reads a label-first CSV file (`label,f1,f2,...`), one-hot encoding the
    /// label and dividing features by `scale`.
    pub fn from_labeled_csv<P: AsRef<Path>>(
        path: P,
        num_classes: usize,
        scale: f64,
        has_headers: bool,
    ) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_labeled_reader(io::BufReader::new(file), num_classes, scale, has_headers)
    }

    pub fn from_labeled_reader<R: io::Read>(
        reader: R,
        num_classes: usize,
        scale: f64,
        has_headers: bool,
    ) -> Result<Self> {
        if num_classes == 0 {
            return Err(NNError::Dataset("num_classes must be greater than 0".to_string()));
        }
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut features: Vec<f64> = Vec::new();
        let mut targets: Vec<f64> = Vec::new();
        let mut width = None;
        let mut rows = 0;
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let label_field = record
                .get(0)
                .ok_or_else(|| NNError::Dataset(format!("record {} is empty", line)))?;
            let label: usize = label_field.parse().map_err(|_| {
                NNError::Dataset(format!("record {}: bad label '{}'", line, label_field))
            })?;
            if label >= num_classes {
                return Err(NNError::Dataset(format!(
                    "record {}: label {} outside 0..{}",
                    line, label, num_classes
                )));
            }

            let n = record.len() - 1;
            match width {
                None => width = Some(n),
                Some(w) if w != n => {
                    return Err(NNError::Dataset(format!(
                        "record {} has {} features, expected {}",
                        line, n, w
                    )))
                }
                Some(_) => {}
            }
            for field in record.iter().skip(1) {
                let value: f64 = field.parse().map_err(|_| {
                    NNError::Dataset(format!("record {}: bad feature '{}'", line, field))
                })?;
                features.push(value);
            }
            targets.extend((0..num_classes).map(|c| if c == label { 1.0 } else { 0.0 }));
            rows += 1;
        }

        let mut features = Matrix::from_vec(rows, width.unwrap_or(0), features)?;
        features.to_unity(0.0, scale);
        Self::new(features, Matrix::from_vec(rows, num_classes, targets)?)
    }
}

/// Iterator over the full mini-batches of a [`Dataset`].
pub struct Batches<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
    next: usize,
    count: usize,
}

impl Iterator for Batches<'_> {
    type Item = Result<(Matrix, Matrix)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let start = self.next * self.batch_size;
        let end = start + self.batch_size;
        self.next += 1;
        Some(
            self.dataset
                .features
                .select_rows(start, end)
                .and_then(|x| Ok((x, self.dataset.targets.select_rows(start, end)?))),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Batches<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix;

    #[test]
    fn remainder_samples_are_dropped() {
        let features = Matrix::from_vec(7, 1, (0..7).map(|x| x as f64).collect()).unwrap();
        let targets = Matrix::zeros(7, 1).unwrap();
        let data = Dataset::new(features, targets).unwrap();
        let batches: Vec<_> = data.batches(3).map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].0, matrix![[3.], [4.], [5.]].unwrap());
        assert_eq!(data.batches(8).count(), 0);
        assert_eq!(data.batches(0).count(), 0);
    }

    #[test]
    fn labeled_csv_is_one_hot_and_scaled() {
        let csv = "label,p0,p1\n2,0,255\n0,51,102\n";
        let data = Dataset::from_labeled_reader(csv.as_bytes(), 3, 255.0, true).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.targets(), &matrix![[0., 0., 1.], [1., 0., 0.]].unwrap());
        assert_eq!(data.features(), &matrix![[0.0, 1.0], [0.2, 0.4]].unwrap());
    }

    #[test]
    fn bad_records_are_reported() {
        let out_of_range = "5,1,2\n";
        assert!(matches!(
            Dataset::from_labeled_reader(out_of_range.as_bytes(), 3, 1.0, false),
            Err(NNError::Dataset(_))
        ));
        let garbage = "1,x,2\n";
        assert!(matches!(
            Dataset::from_labeled_reader(garbage.as_bytes(), 3, 1.0, false),
            Err(NNError::Dataset(_))
        ));
    }

    #[test]
    fn split_keeps_row_order() {
        let data = Dataset::xor().unwrap();
        let (head, tail) = data.split_at(1).unwrap();
        assert_eq!(head.len(), 1);
        assert_eq!(tail.features(), &matrix![[0., 1.], [1., 0.], [1., 1.]].unwrap());
        assert!(data.split_at(5).is_err());
    }
}
