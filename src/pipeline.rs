//! Load, encode, split, fit, predict and report in one call.

use crate::{
    bayes::BernoulliNb,
    config::Config,
    dataset::{encode, load_passengers},
    report::ClassificationReport,
    split::train_test_split,
};
use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub model: BernoulliNb<u8>,
    pub train_report: ClassificationReport<u8>,
    pub test_report: ClassificationReport<u8>,
    pub age_threshold: f64,
    pub fare_threshold: f64,
}

pub fn run(config: &Config) -> Result<Outcome> {
    let passengers = load_passengers(&config.data)?;
    let data = encode(&passengers, &config.binning()).context("failed to encode passengers")?;
    if data.is_empty() {
        bail!("{} contains no passengers", config.data.display());
    }
    debug!(features = ?data.feature_names(), "encoded passengers");

    let split = train_test_split(data.len(), config.test_size, config.seed)?;
    let (x_train, x_test) = split.select(&data.features);
    let (y_train, y_test) = split.select(&data.labels);
    info!(train = x_train.len(), test = x_test.len(), seed = config.seed, "split dataset");

    let mut model = BernoulliNb::new().with_alpha(config.alpha);
    if let Some(priors) = config.class_priors()? {
        model = model.with_class_priors(priors);
    }
    model
        .fit(&x_train, &y_train)
        .context("failed to fit classifier")?;

    let train_pred = model.predict(&x_train)?;
    let test_pred = model.predict(&x_test)?;
    let train_report = ClassificationReport::new(&y_train, &train_pred)?;
    let test_report = ClassificationReport::new(&y_test, &test_pred)?;
    info!(
        train_accuracy = train_report.accuracy,
        test_accuracy = test_report.accuracy,
        "evaluated classifier"
    );

    if let Some(path) = &config.predictions {
        let (_, test_ids) = split.select(&data.ids);
        write_predictions(path, &test_ids, &test_pred)?;
    }

    Ok(Outcome {
        model,
        train_report,
        test_report,
        age_threshold: data.age_threshold,
        fare_threshold: data.fare_threshold,
    })
}

/// Writes `PassengerId,Survived` rows, one per prediction.
pub fn write_predictions<P: AsRef<Path>>(path: P, ids: &[u32], predictions: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(["PassengerId", "Survived"])?;
    for (id, prediction) in ids.iter().zip(predictions) {
        writer.write_record([id.to_string(), prediction.to_string()])?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = predictions.len(), "wrote predictions");
    Ok(())
}
