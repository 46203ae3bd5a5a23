pub mod bayes;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod split;

pub use bayes::BernoulliNb;
pub use config::Config;
pub use error::{BayesError, Result};
pub use report::ClassificationReport;
