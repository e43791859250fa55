use serde::{Deserialize, Serialize};

use crate::config::AlmaParams;
use crate::error::{ClassifierError, Result};
use crate::math::{SparseVector, WeightVector};
use crate::models::{Hyperparameters, Label};
use crate::rules::{apply_step, UpdateRule};

/// ALMA with p = 2 (Gentile 2001).
///
/// Updates whenever the normalized margin falls below the shrinking target
/// `(1 - alpha) * B / sqrt(k)`, steps by `C / sqrt(alpha * k)` along the
/// normalized example and projects the weights back into the ball of radius
/// `B / sqrt(alpha)`. `k` counts updates and starts at 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alma {
    weights: WeightVector,
    b: f32,
    k: u64,
    params: AlmaParams,
}

impl Alma {
    pub fn new(params: AlmaParams) -> Self {
        Self {
            weights: WeightVector::new(),
            b: 0.0,
            k: 1,
            params,
        }
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn bias_weight(&self) -> f32 {
        self.b
    }

    pub fn params(&self) -> AlmaParams {
        self.params
    }

    /// Current schedule position (number of updates + 1).
    pub fn k(&self) -> u64 {
        self.k
    }

    fn project(&mut self) {
        let radius = self.params.b / self.params.alpha.sqrt();
        let norm = (self.weights.squared_norm() + self.b * self.b).sqrt();
        if norm > radius {
            let factor = radius / norm;
            self.weights.scale(factor);
            self.b *= factor;
        }
    }
}

impl UpdateRule for Alma {
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
        let norm = hyper.squared_norm(x).sqrt();
        if norm == 0.0 {
            log::trace!("zero-norm example, skipping ALMA update");
            return false;
        }
        let k = self.k as f32;
        let AlmaParams { alpha, b, c } = self.params;
        let target = (1.0 - alpha) * b / k.sqrt();
        if y.sign() * margin / norm > target {
            return false;
        }
        let eta = c / (alpha * k).sqrt();
        apply_step(&mut self.weights, &mut self.b, y.sign() * eta / norm, x, hyper);
        self.project();
        self.k += 1;
        true
    }

    fn validate(&self) -> Result<()> {
        self.params
            .validate()
            .map_err(|err| ClassifierError::Format(err.to_string()))?;
        if self.k == 0 {
            return Err(ClassifierError::Format(
                "ALMA update counter must start at 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step_is_projected_to_unit_ball() {
        let hyper = Hyperparameters {
            use_bias: false,
            ..Hyperparameters::default()
        };
        let mut rule = Alma::new(AlmaParams::default());
        let x = SparseVector::from(vec![(0, 3.0), (1, 4.0)]);
        assert!(rule.update(&x, Label::Positive, 0.0, &hyper));
        // step sqrt(2) along x / 5, then scaled back to norm 1
        assert!((rule.weights().get(0) - 0.6).abs() < 1e-6);
        assert!((rule.weights().get(1) - 0.8).abs() < 1e-6);
        assert_eq!(rule.k(), 2);
    }

    #[test]
    fn test_norm_stays_within_radius() {
        let params = AlmaParams::with_alpha(0.5);
        let radius = params.b / params.alpha.sqrt();
        let hyper = Hyperparameters {
            bias: 1.0,
            ..Hyperparameters::default()
        };
        let mut rule = Alma::new(params);
        let examples = [
            (SparseVector::from(vec![(0, 1.0), (1, 1.0)]), Label::Positive),
            (SparseVector::from(vec![(0, -1.0), (2, 2.0)]), Label::Negative),
            (SparseVector::from(vec![(1, 0.5), (2, -1.0)]), Label::Positive),
        ];
        for _ in 0..20 {
            for (x, y) in &examples {
                let m = rule.margin(x);
                rule.update(x, *y, m, &hyper);
                let norm = (rule.weights().squared_norm() + rule.bias_weight().powi(2)).sqrt();
                assert!(norm <= radius * (1.0 + 1e-5));
            }
        }
    }

    #[test]
    fn test_margin_above_target_is_left_alone() {
        let hyper = Hyperparameters::default();
        let mut rule = Alma::new(AlmaParams::with_alpha(0.5));
        let x = SparseVector::from(vec![(0, 1.0)]);
        // |x| = sqrt(2) with the bias feature; target = 0.5 * 2 / 1 = 1
        assert!(!rule.update(&x, Label::Positive, 2.0, &hyper));
        assert!(rule.update(&x, Label::Positive, 1.0, &hyper));
        assert_eq!(rule.k(), 2);
    }

    #[test]
    fn test_validate_checks_params_and_counter() {
        let mut rule = Alma::new(AlmaParams::default());
        assert!(rule.validate().is_ok());
        rule.k = 0;
        assert!(matches!(rule.validate(), Err(ClassifierError::Format(_))));
        let rule = Alma::new(AlmaParams::with_alpha(0.0));
        assert!(matches!(rule.validate(), Err(ClassifierError::Format(_))));
    }
}
