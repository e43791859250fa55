//! Margin-based update rules, one per algorithm family.
//!
//! Each rule owns exactly the state its algorithm needs. [`ModelState`] is the
//! tagged union over all of them; it is chosen once when the model is built
//! and every call dispatches with a plain `match`.
//!
//! References:
//! - F. Rosenblatt, "The Perceptron", Psychological Review, 1958.
//! - M. Collins, "Discriminative Training Methods for Hidden Markov Models", EMNLP 2002.
//! - K. Crammer et al., "Online Passive-Aggressive Algorithms", JMLR 2006.
//! - M. Dredze, K. Crammer, F. Pereira, "Confidence-Weighted Linear Classification", ICML 2008.
//! - C. Gentile, "A New Approximate Maximal Margin Classification Algorithm", JMLR 2001.
pub mod alma;
pub mod averaged;
pub mod confidence_weighted;
pub mod kernel;
pub mod passive_aggressive;
pub mod perceptron;

use serde::{Deserialize, Serialize};

use crate::config::{ClassifierConfig, Method};
use crate::error::Result;
use crate::math::{SparseVector, WeightVector};
use crate::models::{Hyperparameters, Label};

pub use alma::Alma;
pub use averaged::AveragedPerceptron;
pub use confidence_weighted::ConfidenceWeighted;
pub use kernel::KernelPassiveAggressive;
pub use passive_aggressive::{PaVariant, PassiveAggressive};
pub use perceptron::Perceptron;

/// One online learning algorithm: how to score an example and how to move
/// the model after seeing its label.
pub trait UpdateRule {
    /// Raw margin used to decide whether, and how far, to update.
    fn margin(&self, x: &SparseVector) -> f32;

    /// Decision value used for scoring. Equal to the training margin except
    /// for algorithms that predict with different weights than they train.
    fn decision_value(&self, x: &SparseVector) -> f32 {
        self.margin(x)
    }

    /// Apply the update for one labeled example, given the margin computed by
    /// [`UpdateRule::margin`]. Returns `true` when the model changed.
    fn update(&mut self, x: &SparseVector, y: Label, margin: f32, hyper: &Hyperparameters)
        -> bool;

    /// Check the internal consistency of state restored from storage.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// `w += step * x` and `b += step * gain`, the shared linear update.
pub(crate) fn apply_step(
    weights: &mut WeightVector,
    b: &mut f32,
    step: f32,
    x: &SparseVector,
    hyper: &Hyperparameters,
) {
    weights.scaled_add(step, x);
    *b += step * hyper.bias_gain();
}

/// Algorithm state, one variant per family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ModelState {
    Perceptron(Perceptron),
    AveragedPerceptron(AveragedPerceptron),
    PassiveAggressive(PassiveAggressive),
    KernelPassiveAggressive(KernelPassiveAggressive),
    ConfidenceWeighted(ConfidenceWeighted),
    Alma(Alma),
}

macro_rules! dispatch {
    ($state:expr, $rule:ident => $body:expr) => {
        match $state {
            ModelState::Perceptron($rule) => $body,
            ModelState::AveragedPerceptron($rule) => $body,
            ModelState::PassiveAggressive($rule) => $body,
            ModelState::KernelPassiveAggressive($rule) => $body,
            ModelState::ConfidenceWeighted($rule) => $body,
            ModelState::Alma($rule) => $body,
        }
    };
}

impl ModelState {
    /// Fresh, untrained state for the configured method.
    pub fn new(config: &ClassifierConfig) -> Self {
        match config.method {
            Method::Perceptron => ModelState::Perceptron(Perceptron::default()),
            Method::AveragedPerceptron => {
                ModelState::AveragedPerceptron(AveragedPerceptron::default())
            }
            Method::PassiveAggressive => {
                ModelState::PassiveAggressive(PassiveAggressive::new(PaVariant::Pa))
            }
            Method::PassiveAggressive1 => {
                ModelState::PassiveAggressive(PassiveAggressive::new(PaVariant::Pa1))
            }
            Method::PassiveAggressive2 => {
                ModelState::PassiveAggressive(PassiveAggressive::new(PaVariant::Pa2))
            }
            Method::KernelPassiveAggressive => {
                ModelState::KernelPassiveAggressive(KernelPassiveAggressive::default())
            }
            Method::ConfidenceWeighted => {
                ModelState::ConfidenceWeighted(ConfidenceWeighted::default())
            }
            Method::Alma => ModelState::Alma(Alma::new(config.alma)),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            ModelState::Perceptron(_) => Method::Perceptron,
            ModelState::AveragedPerceptron(_) => Method::AveragedPerceptron,
            ModelState::PassiveAggressive(pa) => match pa.variant() {
                PaVariant::Pa => Method::PassiveAggressive,
                PaVariant::Pa1 => Method::PassiveAggressive1,
                PaVariant::Pa2 => Method::PassiveAggressive2,
            },
            ModelState::KernelPassiveAggressive(_) => Method::KernelPassiveAggressive,
            ModelState::ConfidenceWeighted(_) => Method::ConfidenceWeighted,
            ModelState::Alma(_) => Method::Alma,
        }
    }
}

impl UpdateRule for ModelState {
    fn margin(&self, x: &SparseVector) -> f32 {
        dispatch!(self, rule => rule.margin(x))
    }

    fn decision_value(&self, x: &SparseVector) -> f32 {
        dispatch!(self, rule => rule.decision_value(x))
    }

    fn update(
        &mut self,
        x: &SparseVector,
        y: Label,
        margin: f32,
        hyper: &Hyperparameters,
    ) -> bool {
        dispatch!(self, rule => rule.update(x, y, margin, hyper))
    }

    fn validate(&self) -> Result<()> {
        dispatch!(self, rule => rule.validate())
    }
}
