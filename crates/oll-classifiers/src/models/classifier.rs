use std::path::Path;

use rayon::prelude::*;

use crate::config::{ClassifierConfig, Method};
use crate::error::{ClassifierError, Result};
use crate::evaluation::{self, Evaluation, TestOptions};
use crate::math::{FeatureKey, RowSource, SparseVector};
use crate::models::model::logistic;
use crate::models::{Label, Model};
use crate::persistence;
use crate::training::{self, TrainOptions, TrainSummary};

/// Online binary classifier.
///
/// Wraps a [`Model`] and exposes the public surface: incremental training
/// with [`Classifier::add`], scoring with [`Classifier::classify`], batch
/// `fit`/`predict` over matrices, hyperparameter setters and file I/O.
/// Every fallible call validates its input before touching the model, so an
/// `Err` always leaves the classifier unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Classifier {
    model: Model,
}

impl Classifier {
    /// Build an untrained classifier with default hyperparameters
    /// (`C = 1`, bias gain `0`).
    pub fn new(method: Method) -> Self {
        Self {
            model: Model::with_defaults(method),
        }
    }

    /// Build from a method identifier such as `"PA1"`.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse::<Method>()?))
    }

    pub fn with_config(config: ClassifierConfig) -> Result<Self> {
        Ok(Self {
            model: Model::new(&config)?,
        })
    }

    pub fn from_model(model: Model) -> Self {
        Self { model }
    }

    /// Read a classifier previously written with [`Classifier::save`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            model: persistence::load_model(path)?,
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    pub fn method(&self) -> Method {
        self.model.method()
    }

    /// Learn from one labeled example. `label` must be `+1` or `-1`.
    pub fn add(&mut self, x: &SparseVector, label: i32) -> Result<()> {
        let label = Label::try_from(label)?;
        self.model.train(x, label);
        Ok(())
    }

    /// [`Classifier::add`] for an example given as `(feature, value)` pairs.
    pub fn add_pairs<K, I>(&mut self, pairs: I, label: i32) -> Result<()>
    where
        K: FeatureKey,
        I: IntoIterator<Item = (K, f32)>,
    {
        let label = Label::try_from(label)?;
        let x = SparseVector::try_from_pairs(pairs)?;
        self.model.train(&x, label);
        Ok(())
    }

    /// Raw decision value, positive on the `+1` side.
    pub fn margin(&self, x: &SparseVector) -> f32 {
        self.model.margin(x)
    }

    /// Confidence in (0, 1) that `x` is positive: the logistic of
    /// [`Classifier::margin`], so exactly 0.5 for an untrained model and
    /// `>= 0.5` whenever the raw margin is non-negative. Use `margin` for the
    /// unsquashed decision value.
    pub fn classify(&self, x: &SparseVector) -> f32 {
        logistic(self.margin(x))
    }

    pub fn classify_pairs<K, I>(&self, pairs: I) -> Result<f32>
    where
        K: FeatureKey,
        I: IntoIterator<Item = (K, f32)>,
    {
        let x = SparseVector::try_from_pairs(pairs)?;
        Ok(self.classify(&x))
    }

    /// `+1` when [`Classifier::classify`] is at least 0.5, `-1` otherwise.
    pub fn predict_label(&self, x: &SparseVector) -> i32 {
        if self.classify(x) >= 0.5 {
            1
        } else {
            -1
        }
    }

    /// Predict one label per row. Rows are scored in parallel.
    pub fn predict<R>(&self, rows: &R) -> Result<Vec<i32>>
    where
        R: RowSource + Sync + ?Sized,
    {
        (0..rows.n_rows())
            .into_par_iter()
            .map(|row| rows.sparse_row(row).map(|x| self.predict_label(&x)))
            .collect()
    }

    /// [`Classifier::classify`] for every row.
    pub fn predict_proba<R>(&self, rows: &R) -> Result<Vec<f32>>
    where
        R: RowSource + Sync + ?Sized,
    {
        (0..rows.n_rows())
            .into_par_iter()
            .map(|row| rows.sparse_row(row).map(|x| self.classify(&x)))
            .collect()
    }

    /// One online pass over `rows` in order, equivalent to calling
    /// [`Classifier::add`] on each row. All labels are checked first.
    pub fn fit<R>(&mut self, rows: &R, labels: &[i32]) -> Result<()>
    where
        R: RowSource + ?Sized,
    {
        let n_rows = rows.n_rows();
        if n_rows != labels.len() {
            return Err(ClassifierError::LengthMismatch {
                rows: n_rows,
                labels: labels.len(),
            });
        }
        let labels = labels
            .iter()
            .map(|&y| Label::try_from(y))
            .collect::<Result<Vec<_>>>()?;
        let examples = (0..n_rows)
            .map(|row| rows.sparse_row(row))
            .collect::<Result<Vec<_>>>()?;

        let updates_before = self.model.updates();
        for (x, y) in examples.iter().zip(labels) {
            self.model.train(x, y);
        }
        log::debug!(
            "[{}] fit {} rows, {} updates",
            self.method(),
            n_rows,
            self.model.updates() - updates_before
        );
        Ok(())
    }

    pub fn c(&self) -> f32 {
        self.model.hyperparameters().c
    }

    /// Set the aggressiveness / confidence parameter; must be finite and > 0.
    /// Affects subsequent updates only.
    pub fn set_c(&mut self, c: f32) -> Result<()> {
        self.model.set_c(c)
    }

    pub fn bias(&self) -> f32 {
        self.model.hyperparameters().bias
    }

    /// Set the bias feature gain; must be finite. Affects subsequent updates only.
    pub fn set_bias(&mut self, bias: f32) -> Result<()> {
        self.model.set_bias(bias)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_model(&self.model, path)
    }

    /// Replace this classifier's model with the one stored at `path`,
    /// including its method and hyperparameters.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.model = persistence::load_model(path)?;
        Ok(())
    }

    /// Score every example of an SVM-light style file.
    pub fn test_file<P: AsRef<Path>>(&self, path: P, options: &TestOptions) -> Result<Evaluation> {
        evaluation::evaluate_file(self, path, options)
    }

    /// Train on an SVM-light style file. The model is only replaced once the
    /// whole file has been read and learned without error.
    pub fn train_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &TrainOptions,
    ) -> Result<TrainSummary> {
        training::train_file(self, path, options)
    }
}

impl From<Method> for Classifier {
    fn from(method: Method) -> Self {
        Classifier::new(method)
    }
}
