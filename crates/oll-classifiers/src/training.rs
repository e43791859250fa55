use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::{SvmLightReader, SvmLightRecord};
use crate::math::SparseVector;
use crate::models::{Classifier, Label};

/// Options for [`Classifier::train_file`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    /// Passes over the file. `0` streams the file once without loading it
    /// into memory.
    pub iterations: usize,
    /// Shuffle the examples once before the first pass.
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            shuffle: true,
            seed: 0,
        }
    }
}

impl TrainOptions {
    pub fn streaming() -> Self {
        Self {
            iterations: 0,
            shuffle: false,
            seed: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TrainSummary {
    /// Distinct examples read from the file.
    pub examples: usize,
    pub epochs: usize,
    /// Updates applied during this call.
    pub updates: u64,
}

fn labeled(record: SvmLightRecord) -> Option<(SparseVector, Label)> {
    record.label.map(|label| (record.features, label))
}

/// Train a classifier from an SVM-light file. Learning happens on a copy of
/// the model that replaces the original only when the whole file succeeded.
pub(crate) fn train_file<P: AsRef<Path>>(
    classifier: &mut Classifier,
    path: P,
    options: &TrainOptions,
) -> Result<TrainSummary> {
    let mut staged = classifier.model().clone();
    let updates_before = staged.updates();
    let mut summary = TrainSummary::default();

    if options.iterations == 0 {
        for record in SvmLightReader::from_path(&path, true)? {
            if let Some((x, y)) = labeled(record?) {
                staged.train(&x, y);
                summary.examples += 1;
            }
        }
        summary.epochs = 1;
    } else {
        let mut examples = SvmLightReader::from_path(&path, true)?
            .filter_map(|record| record.map(labeled).transpose())
            .collect::<Result<Vec<_>>>()?;
        if options.shuffle {
            let mut rng = StdRng::seed_from_u64(options.seed);
            examples.shuffle(&mut rng);
        }
        for epoch in 1..=options.iterations {
            let before = staged.updates();
            for (x, y) in &examples {
                staged.train(x, *y);
            }
            log::debug!(
                "[{}] epoch {}/{}: {} updates",
                staged.method(),
                epoch,
                options.iterations,
                staged.updates() - before
            );
        }
        summary.examples = examples.len();
        summary.epochs = options.iterations;
    }

    summary.updates = staged.updates() - updates_before;
    log::info!(
        "[{}] trained on {} ({} examples, {} epochs, {} updates)",
        staged.method(),
        path.as_ref().display(),
        summary.examples,
        summary.epochs,
        summary.updates
    );
    *classifier = Classifier::from_model(staged);
    Ok(summary)
}
