use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};
use crate::math::SparseVector;
use crate::models::{Hyperparameters, Label};
use crate::rules::UpdateRule;

/// Passive-Aggressive I in dual form with the degree-2 polynomial kernel
/// `K(a, b) = (a . b)^2`.
///
/// Every update stores the example as a support vector with coefficient
/// `y * tau`. Support vectors are kept in an inverted index from feature to
/// `(support vector id, value)` postings so that scoring only touches the
/// vectors sharing a feature with the input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KernelPassiveAggressive {
    alphas: Vec<f32>,
    postings: BTreeMap<u32, Vec<(u32, f32)>>,
    b: f32,
}

impl KernelPassiveAggressive {
    pub fn support_vectors(&self) -> usize {
        self.alphas.len()
    }

    pub fn alphas(&self) -> &[f32] {
        &self.alphas
    }

    pub fn bias_weight(&self) -> f32 {
        self.b
    }

    /// Linear products `sv_i . x` for every stored support vector.
    fn linear_products(&self, x: &SparseVector) -> Vec<f32> {
        let mut products = vec![0.0f32; self.alphas.len()];
        for (index, value) in x.iter() {
            if let Some(postings) = self.postings.get(&index) {
                for &(sv, sv_value) in postings {
                    products[sv as usize] += sv_value * value;
                }
            }
        }
        products
    }
}

impl UpdateRule for KernelPassiveAggressive {
    fn margin(&self, x: &SparseVector) -> f32 {
        if self.alphas.is_empty() {
            return self.b;
        }
        let products = self.linear_products(x);
        self.alphas
            .iter()
            .zip(&products)
            .map(|(alpha, p)| alpha * p * p)
            .sum::<f32>()
            + self.b
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
        let linear = x.squared_norm();
        let self_kernel = linear * linear + if hyper.use_bias { 1.0 } else { 0.0 };
        if self_kernel == 0.0 {
            log::trace!("zero-norm example, skipping kernel update");
            return false;
        }
        let coefficient = y.sign() * hyper.c.min(loss / self_kernel);
        let id = self.alphas.len() as u32;
        for (index, value) in x.iter() {
            self.postings.entry(index).or_default().push((id, value));
        }
        self.alphas.push(coefficient);
        self.b += coefficient * hyper.bias_gain();
        true
    }

    fn validate(&self) -> Result<()> {
        let count = self.alphas.len();
        for (index, postings) in &self.postings {
            if let Some(&(sv, _)) = postings.iter().find(|&&(sv, _)| sv as usize >= count) {
                return Err(ClassifierError::Format(format!(
                    "feature {} refers to support vector {} of {}",
                    index, sv, count
                )));
            }
        }
        if self.alphas.iter().any(|alpha| !alpha.is_finite()) || !self.b.is_finite() {
            return Err(ClassifierError::Format(
                "non-finite kernel coefficient".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_is_quadratic_in_products() {
        let hyper = Hyperparameters {
            use_bias: false,
            ..Hyperparameters::default()
        };
        let mut rule = KernelPassiveAggressive::default();
        let x = SparseVector::from(vec![(0, 1.0), (2, 1.0)]);
        // K(x, x) = 4, loss = 1 -> alpha = 1/4
        assert!(rule.update(&x, Label::Positive, 0.0, &hyper));
        assert_eq!(rule.support_vectors(), 1);
        assert!((rule.alphas()[0] - 0.25).abs() < 1e-7);
        assert!((rule.margin(&x) - 1.0).abs() < 1e-6);

        // the sign of the input does not matter for an even kernel
        let flipped = SparseVector::from(vec![(0, -1.0)]);
        assert!((rule.margin(&flipped) - 0.25).abs() < 1e-7);

        let disjoint = SparseVector::from(vec![(7, 3.0)]);
        assert_eq!(rule.margin(&disjoint), 0.0);
    }

    #[test]
    fn test_step_capped_by_c() {
        let hyper = Hyperparameters {
            c: 0.01,
            ..Hyperparameters::default()
        };
        let mut rule = KernelPassiveAggressive::default();
        let x = SparseVector::from(vec![(1, 0.5)]);
        rule.update(&x, Label::Negative, 0.0, &hyper);
        assert_eq!(rule.alphas(), &[-0.01]);
    }

    #[test]
    fn test_correct_examples_are_not_stored() {
        let hyper = Hyperparameters::default();
        let mut rule = KernelPassiveAggressive::default();
        let x = SparseVector::from(vec![(1, 1.0)]);
        assert!(!rule.update(&x, Label::Positive, 2.0, &hyper));
        assert_eq!(rule.support_vectors(), 0);
    }

    #[test]
    fn test_validate_rejects_dangling_postings() {
        let mut rule = KernelPassiveAggressive::default();
        let x = SparseVector::from(vec![(2, 1.0)]);
        assert!(rule.update(&x, Label::Positive, 0.0, &Hyperparameters::default()));
        assert!(rule.validate().is_ok());
        rule.postings.entry(4).or_default().push((1, 1.0));
        assert!(matches!(rule.validate(), Err(ClassifierError::Format(_))));
    }

    #[test]
    fn test_nan_margin_is_left_alone() {
        let mut rule = KernelPassiveAggressive::default();
        let x = SparseVector::from(vec![(1, 1.0)]);
        assert!(!rule.update(&x, Label::Positive, f32::NAN, &Hyperparameters::default()));
        assert_eq!(rule.support_vectors(), 0);
    }
}
