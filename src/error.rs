use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum NNError {
    // Matrix related errors
    ShapeMismatch(String),
    ResourceExhausted { rows: usize, cols: usize },

    // Construction errors
    ConfigInvalid(String),

    // Training related errors
    DivergedTraining { layer: usize },
    TrainingAborted {
        epoch: usize,
        batch: usize,
        source: Box<NNError>,
    },

    // Dataset related errors
    Dataset(String),
    IoError(std::io::Error),
    Csv(csv::Error),
}

impl fmt::Display for NNError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NNError::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            NNError::ResourceExhausted { rows, cols } => {
                write!(f, "Could not allocate a {}x{} matrix", rows, cols)
            }
            NNError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            NNError::DivergedTraining { layer } => {
                write!(f, "Training diverged: non-finite parameters in layer {}", layer)
            }
            NNError::TrainingAborted { epoch, batch, source } => write!(
                f,
                "Training aborted at epoch {} batch {}: {}",
                epoch, batch, source
            ),
            NNError::Dataset(msg) => write!(f, "Dataset error: {}", msg),
            NNError::IoError(err) => write!(f, "I/O error: {}", err),
            NNError::Csv(err) => write!(f, "CSV error: {}", err),
        }
    }
}

impl From<std::io::Error> for NNError {
    fn from(err: std::io::Error) -> NNError {
        NNError::IoError(err)
    }
}

impl From<csv::Error> for NNError {
    fn from(err: csv::Error) -> NNError {
        NNError::Csv(err)
    }
}

impl From<serde_json::Error> for NNError {
    fn from(err: serde_json::Error) -> NNError {
        NNError::ConfigInvalid(err.to_string())
    }
}

impl Error for NNError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NNError::TrainingAborted { source, .. } => Some(source.as_ref()),
            NNError::IoError(err) => Some(err),
            NNError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NNError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_run_exposes_its_cause() {
        let err = NNError::TrainingAborted {
            epoch: 3,
            batch: 7,
            source: Box::new(NNError::DivergedTraining { layer: 1 }),
        };
        let msg = err.to_string();
        assert!(msg.contains("epoch 3 batch 7"));
        assert!(msg.contains("layer 1"));
        assert!(err.source().is_some());
    }

    #[test]
    fn json_errors_become_config_errors() {
        let err: NNError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, NNError::ConfigInvalid(_)));
    }
}
