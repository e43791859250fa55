use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised by classifier construction, training, scoring and I/O.
///
/// Every failing call leaves the model exactly as it was before the call.
#[derive(Debug)]
pub enum ClassifierError {
    /// Method identifier is not one of `P AP PA PA1 PA2 PAK CW AL`.
    InvalidMethod(String),
    /// Training label outside {-1, +1}.
    InvalidLabel(i64),
    /// Feature key that cannot be used as a non-negative integer index.
    UnsupportedFeature(String),
    /// Number of labels does not match the number of rows.
    LengthMismatch { rows: usize, labels: usize },
    InvalidHyperparameter { name: &'static str, value: f64 },
    /// Malformed line in an SVM-light style data file (1-based line number).
    Parse { line: usize, message: String },
    Io(io::Error),
    /// Model file that cannot be decoded.
    Format(String),
    Csv(csv::Error),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassifierError::InvalidMethod(name) => write!(
                f,
                "Unknown method: {}. Expected one of P, AP, PA, PA1, PA2, PAK, CW, AL",
                name
            ),
            ClassifierError::InvalidLabel(label) => {
                write!(f, "Label must be +1 or -1, got {}", label)
            }
            ClassifierError::UnsupportedFeature(key) => write!(
                f,
                "Feature index must be a non-negative integer, got {}",
                key
            ),
            ClassifierError::LengthMismatch { rows, labels } => write!(
                f,
                "Number of labels ({}) does not match number of rows ({})",
                labels, rows
            ),
            ClassifierError::InvalidHyperparameter { name, value } => {
                write!(f, "Invalid value for {}: {}", name, value)
            }
            ClassifierError::Parse { line, message } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            ClassifierError::Io(err) => write!(f, "I/O error: {}", err),
            ClassifierError::Format(message) => write!(f, "Invalid model file: {}", message),
            ClassifierError::Csv(err) => write!(f, "Delimited file error: {}", err),
        }
    }
}

impl Error for ClassifierError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClassifierError::Io(err) => Some(err),
            ClassifierError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ClassifierError {
    fn from(err: io::Error) -> Self {
        ClassifierError::Io(err)
    }
}

impl From<csv::Error> for ClassifierError {
    fn from(err: csv::Error) -> Self {
        ClassifierError::Csv(err)
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
