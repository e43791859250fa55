use std::path::PathBuf;

use anyhow::{Context, Result};
use oll_classifiers::io::write_predictions;
use oll_classifiers::{load_config, Classifier, ClassifierConfig, TestOptions, TrainOptions};

/// Train on an SVM-light file, evaluate on another and save the model.
///
/// Usage: train_and_evaluate <train.svm> <test.svm> [config.json]
///
/// Logging is controlled with `OLL_LOG`, e.g. `OLL_LOG=debug`.
fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("OLL_LOG", "error,oll_classifiers=info"),
    )
    .init();

    let mut args = std::env::args().skip(1);
    let train_path = PathBuf::from(args.next().context("missing training file")?);
    let test_path = PathBuf::from(args.next().context("missing test file")?);
    let config = match args.next() {
        Some(path) => load_config(path)?,
        None => ClassifierConfig::default(),
    };

    let mut classifier = Classifier::with_config(config.clone())
        .with_context(|| format!("Invalid configuration: {:?}", config))?;
    let summary = classifier
        .train_file(&train_path, &TrainOptions::default())
        .with_context(|| format!("Failed to train on {}", train_path.display()))?;
    println!(
        "{}: {} examples, {} epochs, {} updates",
        classifier.method(),
        summary.examples,
        summary.epochs,
        summary.updates
    );

    let options = TestOptions {
        labeled: true,
        record_scores: true,
    };
    let evaluation = classifier
        .test_file(&test_path, &options)
        .with_context(|| format!("Failed to evaluate {}", test_path.display()))?;
    println!("{}", evaluation);
    let confusion = &evaluation.confusion;
    if let (Some(precision), Some(recall)) = (confusion.precision(), confusion.recall()) {
        println!("Precision {:.3}, recall {:.3}", precision, recall);
    }
    println!("{}", serde_json::to_string_pretty(&evaluation)?);

    let scores_path = test_path.with_extension("scores.tsv");
    write_predictions(&scores_path, &evaluation.scores, 0.5)?;
    let model_path = train_path.with_extension("oll");
    classifier.save(&model_path)?;
    println!(
        "Wrote {} and {}",
        scores_path.display(),
        model_path.display()
    );
    Ok(())
}
