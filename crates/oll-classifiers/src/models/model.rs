use serde::{Deserialize, Serialize};

use crate::config::{validate_bias, validate_c, ClassifierConfig, Method};
use crate::error::{ClassifierError, Result};
use crate::math::SparseVector;
use crate::models::Label;
use crate::rules::{ModelState, UpdateRule};

/// Hyperparameters shared by every update rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub c: f32,
    /// Value of the implicit bias feature when the bias weight is updated.
    pub bias: f32,
    pub use_bias: bool,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            c: 1.0,
            bias: 0.0,
            use_bias: true,
        }
    }
}

impl Hyperparameters {
    /// Multiplier applied to the step when it is added to the bias weight.
    pub fn bias_gain(&self) -> f32 {
        if self.use_bias {
            self.bias
        } else {
            0.0
        }
    }

    /// `|x|^2` plus one for the implicit bias feature.
    pub fn squared_norm(&self, x: &SparseVector) -> f32 {
        x.squared_norm() + if self.use_bias { 1.0 } else { 0.0 }
    }
}

impl From<&ClassifierConfig> for Hyperparameters {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            c: config.c,
            bias: config.bias,
            use_bias: config.use_bias,
        }
    }
}

/// Maps a raw margin to a confidence in (0, 1); 0.5 on the boundary.
pub fn logistic(margin: f32) -> f32 {
    1.0 / (1.0 + (-margin).exp())
}

/// Everything a trained classifier consists of: hyperparameters, counters and
/// the algorithm state. This is the unit that gets persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    hyper: Hyperparameters,
    examples_seen: u64,
    updates: u64,
    state: ModelState,
}

impl Model {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            hyper: Hyperparameters::from(config),
            examples_seen: 0,
            updates: 0,
            state: ModelState::new(config),
        })
    }

    /// Untrained model with the default hyperparameters for `method`.
    pub fn with_defaults(method: Method) -> Self {
        let config = ClassifierConfig::new(method);
        Self {
            hyper: Hyperparameters::from(&config),
            examples_seen: 0,
            updates: 0,
            state: ModelState::new(&config),
        }
    }

    pub fn method(&self) -> Method {
        self.state.method()
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyper
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Number of labeled examples presented so far.
    pub fn examples_seen(&self) -> u64 {
        self.examples_seen
    }

    /// Number of examples that actually changed the model.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Raw decision value for `x`.
    pub fn margin(&self, x: &SparseVector) -> f32 {
        self.state.decision_value(x)
    }

    /// One online step. Returns whether the model changed.
    pub fn train(&mut self, x: &SparseVector, y: Label) -> bool {
        let margin = self.state.margin(x);
        let updated = self.state.update(x, y, margin, &self.hyper);
        self.examples_seen += 1;
        if updated {
            self.updates += 1;
        }
        updated
    }

    /// Check a model that did not come from [`Model::new`], e.g. one read
    /// from disk. Any inconsistency is reported as [`ClassifierError::Format`].
    pub fn validate(&self) -> Result<()> {
        validate_c(self.hyper.c)
            .and_then(|_| validate_bias(self.hyper.bias))
            .map_err(|err| ClassifierError::Format(err.to_string()))?;
        self.state.validate()
    }

    pub(crate) fn set_c(&mut self, c: f32) -> Result<()> {
        validate_c(c)?;
        self.hyper.c = c;
        Ok(())
    }

    pub(crate) fn set_bias(&mut self, bias: f32) -> Result<()> {
        validate_bias(bias)?;
        self.hyper.bias = bias;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_midpoint_and_symmetry() {
        assert_eq!(logistic(0.0), 0.5);
        assert!((logistic(2.0) + logistic(-2.0) - 1.0).abs() < 1e-6);
        assert!(logistic(50.0) <= 1.0);
        assert!(logistic(-50.0) >= 0.0);
    }

    #[test]
    fn test_counters_track_examples_and_updates() {
        let mut model = Model::new(&ClassifierConfig::new(Method::Perceptron)).unwrap();
        let x = SparseVector::from(vec![(0, 1.0)]);
        assert!(model.train(&x, Label::Positive));
        assert!(!model.train(&x, Label::Positive));
        assert_eq!(model.examples_seen(), 2);
        assert_eq!(model.updates(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ClassifierConfig::default().with_c(-1.0);
        assert!(Model::new(&config).is_err());
    }

    #[test]
    fn test_setters_validate() {
        let mut model = Model::new(&ClassifierConfig::default()).unwrap();
        assert!(model.set_c(0.0).is_err());
        assert!(model.set_bias(f32::NAN).is_err());
        assert_eq!(model.hyperparameters().c, 1.0);
        model.set_c(0.25).unwrap();
        model.set_bias(1.0).unwrap();
        assert_eq!(model.hyperparameters().c, 0.25);
        assert_eq!(model.hyperparameters().bias, 1.0);
    }
}
