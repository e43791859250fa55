use serde::{Deserialize, Serialize};

use crate::math::{SparseVector, WeightVector};
use crate::models::{Hyperparameters, Label};
use crate::rules::{apply_step, UpdateRule};

/// How the passive-aggressive step size is bounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaVariant {
    /// `tau = loss / |x|^2`
    Pa,
    /// `tau = min(C, loss / |x|^2)`
    Pa1,
    /// `tau = loss / (|x|^2 + 1 / 2C)`
    Pa2,
}

/// Passive-Aggressive classifier (Crammer et al. 2006).
///
/// Stays passive while the hinge loss `max(0, 1 - y * margin)` is zero and
/// otherwise moves just far enough to satisfy the margin, subject to the
/// variant's bound on the step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassiveAggressive {
    variant: PaVariant,
    weights: WeightVector,
    b: f32,
}

impl PassiveAggressive {
    pub fn new(variant: PaVariant) -> Self {
        Self {
            variant,
            weights: WeightVector::new(),
            b: 0.0,
        }
    }

    pub fn variant(&self) -> PaVariant {
        self.variant
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn bias_weight(&self) -> f32 {
        self.b
    }

    fn step_size(&self, loss: f32, squared_norm: f32, c: f32) -> f32 {
        match self.variant {
            PaVariant::Pa => loss / squared_norm,
            PaVariant::Pa1 => c.min(loss / squared_norm),
            PaVariant::Pa2 => loss / (squared_norm + 1.0 / (2.0 * c)),
        }
    }
}

impl UpdateRule for PassiveAggressive {
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
        let loss = 1.0 - y.sign() * margin;
        if loss <= 0.0 || loss.is_nan() {
            return false;
        }
        let squared_norm = hyper.squared_norm(x);
        if squared_norm == 0.0 {
            log::trace!("zero-norm example, skipping passive-aggressive update");
            return false;
        }
        let tau = self.step_size(loss, squared_norm, hyper.c);
        apply_step(&mut self.weights, &mut self.b, y.sign() * tau, x, hyper);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> SparseVector {
        SparseVector::from(vec![(0, 1.0), (1, 2.0), (2, -1.0)])
    }

    #[test]
    fn test_step_sizes_per_variant() {
        // |x|^2 = 6, plus 1 for the bias feature
        let hyper = Hyperparameters {
            c: 0.1,
            ..Hyperparameters::default()
        };
        let cases = [
            (PaVariant::Pa, 1.0 / 7.0),
            (PaVariant::Pa1, 0.1),
            (PaVariant::Pa2, 1.0 / (7.0 + 5.0)),
        ];
        for (variant, tau) in cases {
            let mut rule = PassiveAggressive::new(variant);
            assert!(rule.update(&x(), Label::Positive, 0.0, &hyper));
            assert!((rule.weights().get(1) - 2.0 * tau).abs() < 1e-6, "{:?}", variant);
        }
    }

    #[test]
    fn test_pa_reaches_unit_margin() {
        let hyper = Hyperparameters {
            use_bias: false,
            ..Hyperparameters::default()
        };
        let mut rule = PassiveAggressive::new(PaVariant::Pa);
        let m = rule.margin(&x());
        rule.update(&x(), Label::Negative, m, &hyper);
        assert!((rule.margin(&x()) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_passive_when_margin_satisfied() {
        let hyper = Hyperparameters::default();
        let mut rule = PassiveAggressive::new(PaVariant::Pa1);
        assert!(!rule.update(&x(), Label::Positive, 1.0, &hyper));
        assert!(!rule.update(&x(), Label::Negative, -3.0, &hyper));
        assert!(rule.weights().is_empty());
    }

    #[test]
    fn test_zero_norm_is_a_no_op() {
        let hyper = Hyperparameters {
            use_bias: false,
            ..Hyperparameters::default()
        };
        let mut rule = PassiveAggressive::new(PaVariant::Pa);
        assert!(!rule.update(&SparseVector::new(), Label::Positive, 0.0, &hyper));
        assert_eq!(rule.bias_weight(), 0.0);
    }

    #[test]
    fn test_nan_margin_is_left_alone() {
        let hyper = Hyperparameters::default();
        for variant in [PaVariant::Pa, PaVariant::Pa1, PaVariant::Pa2] {
            let mut rule = PassiveAggressive::new(variant);
            assert!(!rule.update(&x(), Label::Positive, f32::NAN, &hyper));
            assert!(rule.weights().is_empty());
        }
    }
}
