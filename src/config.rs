use crate::dataset::Binning;
use anyhow::{bail, Result};
use clap::Parser;
use std::{collections::HashMap, path::PathBuf};

/// Fit a Bernoulli naive Bayes classifier on Titanic passenger records and
/// report precision/recall/F1 on the training and test splits.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "titanic-bayes", version)]
pub struct Config {
    /// Titanic training CSV (Kaggle layout)
    pub data: PathBuf,

    /// Additive smoothing; 0 disables smoothing
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Fixed class prior as LABEL=PROBABILITY, repeat for each class
    #[arg(long = "prior", value_name = "LABEL=P", value_parser = parse_prior)]
    pub priors: Vec<(u8, f64)>,

    /// Fraction of rows held out for testing
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Seed for the train/test shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Age cut for the age_above feature [default: median age]
    #[arg(long)]
    pub age_threshold: Option<f64>,

    /// Fare cut for the fare_above feature [default: median fare]
    #[arg(long)]
    pub fare_threshold: Option<f64>,

    /// Write test-split predictions as PassengerId,Survived CSV
    #[arg(long)]
    pub predictions: Option<PathBuf>,
}

impl Config {
    /// Configuration with every option at its default.
    pub fn new<P: Into<PathBuf>>(data: P) -> Self {
        Self {
            data: data.into(),
            alpha: 1.0,
            priors: Vec::new(),
            test_size: 0.2,
            seed: 42,
            age_threshold: None,
            fare_threshold: None,
            predictions: None,
        }
    }

    pub fn binning(&self) -> Binning {
        Binning {
            age_threshold: self.age_threshold,
            fare_threshold: self.fare_threshold,
        }
    }

    /// `None` when priors should be estimated from the training labels.
    ///
    /// # Errors
    ///
    /// Fails if the same label is given more than one prior.
    pub fn class_priors(&self) -> Result<Option<HashMap<u8, f64>>> {
        if self.priors.is_empty() {
            return Ok(None);
        }

        let mut priors = HashMap::with_capacity(self.priors.len());
        for &(label, prior) in &self.priors {
            if let Some(previous) = priors.insert(label, prior) {
                bail!("class {label} given more than one prior ({previous} and {prior})");
            }
        }
        Ok(Some(priors))
    }
}

fn parse_prior(s: &str) -> std::result::Result<(u8, f64), String> {
    let (label, prior) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PROBABILITY, got `{s}`"))?;
    let label = label
        .trim()
        .parse::<u8>()
        .map_err(|e| format!("invalid label `{label}`: {e}"))?;
    let prior = prior
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid probability `{prior}`: {e}"))?;
    Ok((label, prior))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Config::command().debug_assert();
    }

    #[test]
    fn defaults_match_new() {
        let config = Config::parse_from(["titanic-bayes", "train.csv"]);
        assert_eq!(config, Config::new("train.csv"));
        assert_eq!(config.class_priors().unwrap(), None);
        assert_eq!(config.binning(), Binning::default());
    }

    #[test]
    fn parses_all_options() {
        let config = Config::parse_from([
            "titanic-bayes",
            "train.csv",
            "--alpha",
            "0",
            "--prior",
            "0=0.6",
            "--prior",
            "1=0.4",
            "--test-size",
            "0.3",
            "--seed",
            "7",
            "--age-threshold",
            "18",
            "--fare-threshold",
            "30.5",
            "--predictions",
            "out.csv",
        ]);

        assert_eq!(config.alpha, 0.0);
        assert_eq!(
            config.class_priors().unwrap(),
            Some(HashMap::from([(0, 0.6), (1, 0.4)]))
        );
        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.seed, 7);
        assert_eq!(
            config.binning(),
            Binning {
                age_threshold: Some(18.0),
                fare_threshold: Some(30.5),
            }
        );
        assert_eq!(config.predictions, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn rejects_repeated_prior_label() {
        let config = Config::parse_from([
            "titanic-bayes",
            "train.csv",
            "--prior",
            "0=0.9",
            "--prior",
            "0=0.4",
            "--prior",
            "1=0.6",
        ]);
        let err = config.class_priors().unwrap_err();
        assert!(err.to_string().contains("class 0"));
    }

    #[test]
    fn rejects_malformed_prior() {
        assert!(parse_prior("0.6").is_err());
        assert!(parse_prior("x=0.6").is_err());
        assert!(parse_prior("1=lots").is_err());
        assert_eq!(parse_prior(" 1 = 0.25"), Ok((1, 0.25)));
        assert!(Config::try_parse_from(["titanic-bayes", "train.csv", "--prior", "1"]).is_err());
    }
}
