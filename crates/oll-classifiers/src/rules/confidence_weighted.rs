use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};
use crate::math::{SparseVector, WeightVector};
use crate::models::{Hyperparameters, Label};
use crate::rules::UpdateRule;

/// Smallest variance a feature can shrink to.
pub const MIN_VARIANCE: f32 = 1e-8;

/// Confidence-Weighted linear classifier with a diagonal covariance, using
/// the closed-form variance update of Dredze, Crammer and Pereira (2008).
///
/// Features never seen before have variance 1. `C` plays the role of the
/// confidence parameter `phi`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeighted {
    weights: WeightVector,
    b: f32,
    variance: BTreeMap<u32, f32>,
    bias_variance: f32,
}

impl Default for ConfidenceWeighted {
    fn default() -> Self {
        Self {
            weights: WeightVector::new(),
            b: 0.0,
            variance: BTreeMap::new(),
            bias_variance: 1.0,
        }
    }
}

impl ConfidenceWeighted {
    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn bias_weight(&self) -> f32 {
        self.b
    }

    pub fn variance(&self, index: u32) -> f32 {
        self.variance.get(&index).copied().unwrap_or(1.0)
    }

    pub fn bias_variance(&self) -> f32 {
        self.bias_variance
    }

    /// Margin variance `sum_i var_i * x_i^2`, bias feature included.
    fn margin_variance(&self, x: &SparseVector, gain: f32) -> f32 {
        let features: f32 = x
            .iter()
            .map(|(index, value)| self.variance(index) * value * value)
            .sum();
        features + self.bias_variance * gain * gain
    }
}

fn shrink(variance: f32, gamma: f32, phi: f32, value: f32) -> f32 {
    (1.0 / (1.0 / variance + 2.0 * gamma * phi * value * value)).max(MIN_VARIANCE)
}

impl UpdateRule for ConfidenceWeighted {
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
        let phi = hyper.c;
        let gain = hyper.bias_gain();
        let m = y.sign() * margin;
        let v = self.margin_variance(x, gain);
        if v <= 0.0 || v.is_nan() {
            log::trace!("zero margin variance, skipping confidence-weighted update");
            return false;
        }

        let beta = 1.0 + 2.0 * phi * m;
        let discriminant = beta * beta - 8.0 * phi * (m - phi * v);
        if discriminant < 0.0 {
            log::trace!("negative discriminant {}, skipping update", discriminant);
            return false;
        }
        let gamma = (-beta + discriminant.sqrt()) / (4.0 * phi * v);
        if gamma <= 0.0 || gamma.is_nan() {
            return false;
        }

        let step = gamma * y.sign();
        for (index, value) in x.iter() {
            let variance = self.variance(index);
            self.weights.add_at(index, step * variance * value);
            self.variance.insert(index, shrink(variance, gamma, phi, value));
        }
        if gain != 0.0 {
            self.b += step * self.bias_variance * gain;
            self.bias_variance = shrink(self.bias_variance, gamma, phi, gain);
        }
        true
    }

    fn validate(&self) -> Result<()> {
        let valid = |variance: f32| variance.is_finite() && variance > 0.0;
        if let Some((index, variance)) = self.variance.iter().find(|(_, v)| !valid(**v)) {
            return Err(ClassifierError::Format(format!(
                "feature {} has variance {}",
                index, variance
            )));
        }
        if !valid(self.bias_variance) {
            return Err(ClassifierError::Format(format!(
                "bias variance {}",
                self.bias_variance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hyper() -> Hyperparameters {
        Hyperparameters {
            use_bias: false,
            ..Hyperparameters::default()
        }
    }

    #[test]
    fn test_first_update_closed_form() {
        // phi = 1, m = 0, v = 1: beta = 1, disc = 1 + 8 = 9, gamma = 0.5
        let mut rule = ConfidenceWeighted::default();
        let x = SparseVector::from(vec![(3, 1.0)]);
        assert!(rule.update(&x, Label::Positive, 0.0, &hyper()));
        assert!((rule.weights().get(3) - 0.5).abs() < 1e-6);
        // 1 / (1 + 2 * 0.5 * 1) = 0.5
        assert!((rule.variance(3) - 0.5).abs() < 1e-6);
        assert_eq!(rule.variance(4), 1.0);
    }

    #[test]
    fn test_variance_never_grows() {
        let mut rule = ConfidenceWeighted::default();
        let examples = [
            (SparseVector::from(vec![(0, 1.0), (1, -2.0)]), Label::Positive),
            (SparseVector::from(vec![(0, 0.5), (2, 1.0)]), Label::Negative),
            (SparseVector::from(vec![(1, 1.0), (2, 1.0)]), Label::Positive),
        ];
        for _ in 0..50 {
            for (x, y) in &examples {
                let before: Vec<f32> = (0..3).map(|i| rule.variance(i)).collect();
                let m = rule.margin(x);
                rule.update(x, *y, m, &hyper());
                for i in 0..3 {
                    assert!(rule.variance(i) <= before[i as usize] * (1.0 + 1e-6));
                    assert!(rule.variance(i) >= MIN_VARIANCE);
                }
            }
        }
    }

    #[test]
    fn test_confident_example_is_skipped() {
        let mut rule = ConfidenceWeighted::default();
        let x = SparseVector::from(vec![(0, 1.0)]);
        // m = 5 is far beyond phi * sqrt(v) = 1
        assert!(!rule.update(&x, Label::Positive, 5.0, &hyper()));
        assert!(rule.weights().is_empty());
    }

    #[test]
    fn test_bias_feature_has_its_own_variance() {
        let hyper = Hyperparameters {
            bias: 1.0,
            ..Hyperparameters::default()
        };
        let mut rule = ConfidenceWeighted::default();
        assert!(rule.update(&SparseVector::new(), Label::Negative, 0.0, &hyper));
        assert!(rule.bias_weight() < 0.0);
        assert!(rule.bias_variance() < 1.0);
    }

    #[test]
    fn test_empty_example_without_bias_is_a_no_op() {
        let mut rule = ConfidenceWeighted::default();
        assert!(!rule.update(&SparseVector::new(), Label::Positive, 0.0, &hyper()));
        assert_eq!(rule, ConfidenceWeighted::default());
    }

    #[test]
    fn test_shrink_is_floored_at_min_variance() {
        // 1 / (1e8 + 2e6) falls below the floor
        assert_eq!(shrink(MIN_VARIANCE, 1.0e6, 1.0, 1.0), MIN_VARIANCE);
        assert_eq!(shrink(1.0, 1.0e12, 1.0, 1.0), MIN_VARIANCE);
        assert!(shrink(1.0, 0.5, 1.0, 1.0) > MIN_VARIANCE);
    }

    #[test]
    fn test_large_phi_drives_variance_to_the_floor() {
        let hyper = Hyperparameters {
            c: 1.0e6,
            use_bias: false,
            ..Hyperparameters::default()
        };
        let mut rule = ConfidenceWeighted::default();
        let x = SparseVector::from(vec![(0, 1.0)]);
        for _ in 0..20 {
            let m = rule.margin(&x);
            rule.update(&x, Label::Positive, m, &hyper);
            let m = rule.margin(&x);
            rule.update(&x, Label::Negative, m, &hyper);
        }
        assert_eq!(rule.variance(0), MIN_VARIANCE);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_variance() {
        let mut rule = ConfidenceWeighted::default();
        assert!(rule.validate().is_ok());
        rule.variance.insert(3, 0.0);
        assert!(matches!(rule.validate(), Err(ClassifierError::Format(_))));
        rule.variance.insert(3, 0.5);
        rule.bias_variance = f32::INFINITY;
        assert!(rule.validate().is_err());
    }
}
