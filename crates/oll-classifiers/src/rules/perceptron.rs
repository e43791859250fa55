use serde::{Deserialize, Serialize};

use crate::math::{SparseVector, WeightVector};
use crate::models::{Hyperparameters, Label};
use crate::rules::{apply_step, UpdateRule};

/// Classic perceptron: on a mistake (`y * margin <= 0`) add `y * x`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Perceptron {
    weights: WeightVector,
    b: f32,
}

impl Perceptron {
    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn bias_weight(&self) -> f32 {
        self.b
    }
}

impl UpdateRule for Perceptron {
    fn margin(&self, x: &SparseVector) -> f32 {
        self.weights.dot(x) + self.b
    }

    fn update(
        &mut self,
        x: &SparseVector,
        y: Label,
        margin: f32,
        hyper: &Hyperparameters,
    ) -> bool {
        if y.sign() * margin > 0.0 {
            return false;
        }
        apply_step(&mut self.weights, &mut self.b, y.sign(), x, hyper);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_only_on_mistakes() {
        let hyper = Hyperparameters::default();
        let mut rule = Perceptron::default();
        let x = SparseVector::from(vec![(1, 2.0), (4, -1.0)]);

        let m = rule.margin(&x);
        assert!(rule.update(&x, Label::Positive, m, &hyper));
        assert_eq!(rule.weights().get(1), 2.0);
        assert_eq!(rule.weights().get(4), -1.0);

        // now correctly classified with a positive margin
        let m = rule.margin(&x);
        assert_eq!(m, 5.0);
        assert!(!rule.update(&x, Label::Positive, m, &hyper));
        assert_eq!(rule.weights().get(1), 2.0);
    }

    #[test]
    fn test_bias_moves_with_gain() {
        let hyper = Hyperparameters {
            bias: 0.5,
            ..Hyperparameters::default()
        };
        let mut rule = Perceptron::default();
        let x = SparseVector::from(vec![(0, 1.0)]);
        rule.update(&x, Label::Negative, 0.0, &hyper);
        assert_eq!(rule.bias_weight(), -0.5);
    }
}
