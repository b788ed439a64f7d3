use crate::prelude::*;

/// Loss and accuracy of a network over a set of samples.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub avg_loss: f64,
    pub accuracy: f64,
}

/// Index of the largest entry; the first one wins ties.
pub fn argmax(row: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in row.iter().enumerate() {
        match best {
            Some((_, max)) if x <= max => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

/// Argmax-encodes a row: `1` at the largest entry, `0` elsewhere.
pub fn one_hot(row: &[f64]) -> Vec<f64> {
    let hot = argmax(row);
    (0..row.len())
        .map(|i| if Some(i) == hot { 1.0 } else { 0.0 })
        .collect()
}

fn is_correct(output: &[f64], target: &[f64]) -> bool {
    if output.len() == 1 && target.len() == 1 {
        // single unit: threshold at 0.5
        return (output[0] >= 0.5) == (target[0] >= 0.5);
    }
    argmax(output) == argmax(target)
}

/// Number of rows whose prediction matches the target.
pub fn count_correct(outputs: &Matrix, targets: &Matrix) -> Result<usize> {
    if outputs.shape() != targets.shape() {
        return Err(NNError::ShapeMismatch(format!(
            "outputs {:?} vs targets {:?}",
            outputs.shape(),
            targets.shape()
        )));
    }
    Ok(outputs
        .rows_iter()
        .zip(targets.rows_iter())
        .filter(|(o, t)| is_correct(o, t))
        .count())
}

/// Fraction of rows where `argmax(output) == argmax(target)`.
pub fn accuracy(outputs: &Matrix, targets: &Matrix) -> Result<f64> {
    let correct = count_correct(outputs, targets)?;
    Ok(if outputs.rows() == 0 {
        0.0
    } else {
        correct as f64 / outputs.rows() as f64
    })
}
