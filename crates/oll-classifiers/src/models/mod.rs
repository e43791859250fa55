pub mod classifier;
pub mod label;
pub mod model;

pub use classifier::Classifier;
pub use label::Label;
pub use model::{logistic, Hyperparameters, Model};
