use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::Result;
use crate::io::SvmLightReader;
use crate::models::{Classifier, Label};

/// Counts of predicted vs. actual labels; positive means `+1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positive: u64,
    pub false_positive: u64,
    pub true_negative: u64,
    pub false_negative: u64,
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual: Label, predicted: Label) {
        match (actual, predicted) {
            (Label::Positive, Label::Positive) => self.true_positive += 1,
            (Label::Negative, Label::Positive) => self.false_positive += 1,
            (Label::Negative, Label::Negative) => self.true_negative += 1,
            (Label::Positive, Label::Negative) => self.false_negative += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn correct(&self) -> u64 {
        self.true_positive + self.true_negative
    }

    /// Percentage of correct predictions, `None` when nothing was counted.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(100.0 * self.correct() as f64 / total as f64),
        }
    }

    pub fn precision(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

/// How a test file is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestOptions {
    /// Leading token of each line is the true label. When false every token
    /// is a feature, scores are recorded and the confusion matrix stays empty.
    pub labeled: bool,
    /// Keep the `classify` score of every line in [`Evaluation::scores`].
    pub record_scores: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            labeled: true,
            record_scores: false,
        }
    }
}

/// Result of scoring a test set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix,
    pub scores: Vec<f32>,
}

impl Evaluation {
    pub fn accuracy(&self) -> Option<f64> {
        self.confusion.accuracy()
    }

    /// `accuracy` (percentage, 0 for an empty set) and the four counters
    /// under their hyphenated names.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        let c = &self.confusion;
        let mut map = BTreeMap::new();
        map.insert("accuracy", self.accuracy().unwrap_or(0.0));
        map.insert("true-positive", c.true_positive as f64);
        map.insert("false-positive", c.false_positive as f64);
        map.insert("true-negative", c.true_negative as f64);
        map.insert("false-negative", c.false_negative as f64);
        map
    }
}

impl Serialize for Evaluation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let c = &self.confusion;
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("accuracy", &self.accuracy())?;
        map.serialize_entry("true-positive", &c.true_positive)?;
        map.serialize_entry("false-positive", &c.false_positive)?;
        map.serialize_entry("true-negative", &c.true_negative)?;
        map.serialize_entry("false-negative", &c.false_negative)?;
        map.end()
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.confusion;
        match self.accuracy() {
            Some(accuracy) => write!(f, "Accuracy {:.3}% ({}/{})", accuracy, c.correct(), c.total()),
            None => write!(f, "Accuracy n/a (0/0)"),
        }
    }
}

fn predicted_label(score: f32) -> Label {
    if score >= 0.5 {
        Label::Positive
    } else {
        Label::Negative
    }
}

/// Score every line of an SVM-light file. Stops at the first malformed line.
pub fn evaluate_file<P: AsRef<Path>>(
    classifier: &Classifier,
    path: P,
    options: &TestOptions,
) -> Result<Evaluation> {
    let mut evaluation = Evaluation::default();
    for record in SvmLightReader::from_path(&path, options.labeled)? {
        let record = record?;
        let score = classifier.classify(&record.features);
        if let Some(label) = record.label {
            evaluation.confusion.record(label, predicted_label(score));
        }
        if options.record_scores || !options.labeled {
            evaluation.scores.push(score);
        }
    }
    log::info!(
        "[{}] {}: {}",
        classifier.method(),
        path.as_ref().display(),
        evaluation
    );
    Ok(evaluation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confusion(tp: u64, fp: u64, tn: u64, fn_: u64) -> ConfusionMatrix {
        ConfusionMatrix {
            true_positive: tp,
            false_positive: fp,
            true_negative: tn,
            false_negative: fn_,
        }
    }

    #[test]
    fn test_record_each_cell() {
        let mut matrix = ConfusionMatrix::default();
        matrix.record(Label::Positive, Label::Positive);
        matrix.record(Label::Negative, Label::Positive);
        matrix.record(Label::Negative, Label::Negative);
        matrix.record(Label::Positive, Label::Negative);
        matrix.record(Label::Positive, Label::Negative);
        assert_eq!(matrix, confusion(1, 1, 1, 2));
        assert_eq!(matrix.accuracy(), Some(40.0));
        assert_eq!(matrix.precision(), Some(0.5));
        assert!((matrix.recall().unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_set_has_no_accuracy() {
        let evaluation = Evaluation::default();
        assert_eq!(evaluation.accuracy(), None);
        assert_eq!(evaluation.to_map()["accuracy"], 0.0);
        assert_eq!(evaluation.to_string(), "Accuracy n/a (0/0)");
    }

    #[test]
    fn test_map_display_and_json_keys() {
        let evaluation = Evaluation {
            confusion: confusion(3, 1, 4, 0),
            scores: Vec::new(),
        };
        let map = evaluation.to_map();
        assert_eq!(map["accuracy"], 87.5);
        assert_eq!(map["true-positive"], 3.0);
        assert_eq!(map["false-positive"], 1.0);
        assert_eq!(map["true-negative"], 4.0);
        assert_eq!(map["false-negative"], 0.0);
        assert_eq!(evaluation.to_string(), "Accuracy 87.500% (7/8)");

        let json = serde_json::to_value(&evaluation).unwrap();
        assert_eq!(json["accuracy"], 87.5);
        assert_eq!(json["false-negative"], 0);
    }
}
