use serde::{Deserialize, Serialize};

use crate::math::{SparseVector, WeightVector};
use crate::models::{Hyperparameters, Label};
use crate::rules::{apply_step, UpdateRule};

/// Averaged perceptron.
///
/// Trains exactly like [`Perceptron`](crate::rules::Perceptron) but scores
/// with the mean of the weight vectors held after each example. The mean is
/// kept lazily: every update made at step `t` is also added to `accumulated`
/// scaled by `t - 1`, so that after `T` steps
/// `mean(w_1..w_T) = w - accumulated / T`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AveragedPerceptron {
    weights: WeightVector,
    b: f32,
    accumulated: WeightVector,
    accumulated_b: f32,
    steps: u64,
}

impl AveragedPerceptron {
    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn bias_weight(&self) -> f32 {
        self.b
    }

    /// Number of examples folded into the average.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Averaged weight of a single feature.
    pub fn averaged_weight(&self, index: u32) -> f32 {
        if self.steps == 0 {
            return self.weights.get(index);
        }
        self.weights.get(index) - self.accumulated.get(index) / self.steps as f32
    }
}

impl UpdateRule for AveragedPerceptron {
    fn margin(&self, x: &SparseVector) -> f32 {
        self.weights.dot(x) + self.b
    }

    fn decision_value(&self, x: &SparseVector) -> f32 {
        let current = self.margin(x);
        if self.steps == 0 {
            return current;
        }
        current - (self.accumulated.dot(x) + self.accumulated_b) / self.steps as f32
    }

    fn update(
        &mut self,
        x: &SparseVector,
        y: Label,
        margin: f32,
        hyper: &Hyperparameters,
    ) -> bool {
        let earlier_steps = self.steps as f32;
        self.steps += 1;
        if y.sign() * margin > 0.0 {
            return false;
        }
        let step = y.sign();
        apply_step(&mut self.weights, &mut self.b, step, x, hyper);
        apply_step(
            &mut self.accumulated,
            &mut self.accumulated_b,
            step * earlier_steps,
            x,
            hyper,
        );
        true
    }
}
