//! oll-classifiers: online learning of sparse binary linear classifiers.
//!
//! A [`Classifier`] learns one example at a time with one of eight
//! margin-based update rules (Perceptron, Averaged Perceptron,
//! Passive-Aggressive and its I/II/kernel variants, Confidence-Weighted and
//! ALMA) and never stores the training stream. Models score sparse
//! vectors, predict over dense or CSR matrices, persist to a compact binary
//! format and can be trained on or evaluated against SVM-light style files.
//!
//! ```no_run
//! use oll_classifiers::{Classifier, Method, SparseVector, TestOptions};
//!
//! let mut classifier = Classifier::new(Method::PassiveAggressive1);
//! classifier.add(&SparseVector::from(vec![(0, 1.0), (1, 1.0)]), 1)?;
//! classifier.add(&SparseVector::from(vec![(2, -1.0), (3, -1.0)]), -1)?;
//! let score = classifier.classify(&SparseVector::from(vec![(0, 1.0)]));
//! assert!(score > 0.5);
//!
//! classifier.save("model.oll")?;
//! let evaluation = classifier.test_file("test.svm", &TestOptions::default())?;
//! println!("{}", evaluation);
//! # Ok::<(), oll_classifiers::ClassifierError>(())
//! ```
pub mod config;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod math;
pub mod models;
pub mod persistence;
pub mod rules;
pub mod training;

pub use config::{load_config, AlmaParams, ClassifierConfig, Method};
pub use error::{ClassifierError, Result};
pub use evaluation::{ConfusionMatrix, Evaluation, TestOptions};
pub use math::{CsrMatrix, FeatureKey, RowSource, SparseVector, WeightVector};
pub use models::{Classifier, Hyperparameters, Label, Model};
pub use training::{TrainOptions, TrainSummary};
