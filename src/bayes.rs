//! Bernoulli naive Bayes over 0/1 feature matrices.

use crate::error::{BayesError, Result};
use std::{
    collections::{hash_map::Entry, HashMap},
    fmt::Debug,
    hash::Hash,
};
use tracing::{debug, warn};

/// Allowed distance from 1.0 for the sum of caller-supplied priors.
const PRIOR_SUM_TOLERANCE: f64 = 1e-6;

/// Bernoulli naive Bayes classifier.
///
/// Every feature is treated as a two-valued outcome, conditionally
/// independent of the others given the class. Classes keep the order in
/// which they were first seen during `fit`; that order breaks ties when
/// two classes score the same for a row.
///
/// ```
/// use titanic_bayes::bayes::BernoulliNb;
///
/// let rows = vec![vec![0u8, 0], vec![0u8, 1], vec![1u8, 1], vec![1u8, 0]];
/// let labels = vec![0u8, 0, 1, 1];
///
/// let mut model = BernoulliNb::new().with_alpha(1.0);
/// model.fit(&rows, &labels).unwrap();
/// assert_eq!(model.predict(&[vec![1u8, 1]]).unwrap(), vec![1u8]);
/// ```
#[derive(Debug, Clone)]
pub struct BernoulliNb<L> {
    alpha: f64,
    class_priors: Option<HashMap<L, f64>>,
    fitted: Option<FittedModel<L>>,
}

/// Parameters learned by a single `fit` call. Never mutated afterwards.
#[derive(Debug, Clone)]
struct FittedModel<L> {
    classes: Vec<L>,
    class_index: HashMap<L, usize>,
    class_prior: Vec<f64>,
    class_log_prior: Vec<f64>,
    // All indexed [class][feature].
    feature_prob: Vec<Vec<f64>>,
    feature_log_prob: Vec<Vec<f64>>,
    neg_feature_log_prob: Vec<Vec<f64>>,
    n_features: usize,
}

impl<L> Default for BernoulliNb<L> {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            class_priors: None,
            fitted: None,
        }
    }
}

impl<L> BernoulliNb<L> {
    /// Creates an unfitted classifier with `alpha = 1.0` and priors
    /// estimated from the training labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the additive smoothing parameter. Validated at `fit` time.
    ///
    /// With `alpha = 0` a feature that never fires within a class gets a
    /// probability of exactly 0, which makes that class unreachable for any
    /// row where the feature is 1.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Fixes the class priors instead of estimating them from label
    /// frequencies. The map must cover exactly the classes seen at fit time
    /// and sum to 1.
    pub fn with_class_priors(mut self, priors: HashMap<L, f64>) -> Self {
        self.class_priors = Some(priors);
        self
    }

    /// Smoothing parameter used by the next `fit`.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Whether a successful `fit` has populated the model.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Number of columns seen at fit time.
    pub fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|model| model.n_features)
    }

    /// Classes in first-seen order.
    pub fn classes(&self) -> Option<&[L]> {
        self.fitted.as_ref().map(|model| model.classes.as_slice())
    }
}

impl<L> BernoulliNb<L>
where
    L: Clone + Eq + Hash + Debug,
{
    /// Estimates class priors and per-class feature probabilities.
    ///
    /// P(X_k=1 | Y=y) = (count_{k,y} + alpha) / (N_y + 2 alpha).
    ///
    /// # Errors
    ///
    /// Returns [`BayesError::InvalidInput`] if the dataset is empty, row and
    /// label counts differ, rows are ragged, a value is not 0/1, `alpha` is
    /// negative or not finite, or the fixed priors don't match the observed
    /// classes. On error the previous model (if any) is kept.
    pub fn fit<R: AsRef<[u8]>>(&mut self, features: &[R], labels: &[L]) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(BayesError::InvalidInput(format!(
                "alpha must be a finite value >= 0, got {}",
                self.alpha
            )));
        }
        if features.is_empty() {
            return Err(BayesError::InvalidInput(
                "cannot fit on an empty dataset".to_string(),
            ));
        }
        if features.len() != labels.len() {
            return Err(BayesError::InvalidInput(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }

        let n_features = features[0].as_ref().len();
        for (i, row) in features.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n_features {
                return Err(BayesError::InvalidInput(format!(
                    "row {i} has {} features, expected {n_features}",
                    row.len()
                )));
            }
            check_binary(i, row)?;
        }

        // Count rows and active features per class, in first-seen order:
        let mut classes = Vec::new();
        let mut class_index = HashMap::new();
        let mut class_counts: Vec<usize> = Vec::new();
        let mut feature_counts: Vec<Vec<usize>> = Vec::new();
        for (row, label) in features.iter().zip(labels) {
            let idx = match class_index.entry(label.clone()) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    classes.push(label.clone());
                    class_counts.push(0);
                    feature_counts.push(vec![0; n_features]);
                    *entry.insert(classes.len() - 1)
                }
            };

            class_counts[idx] += 1;
            for (count, &value) in feature_counts[idx].iter_mut().zip(row.as_ref()) {
                *count += usize::from(value);
            }
        }

        let class_prior = match &self.class_priors {
            Some(priors) => resolve_priors(priors, &classes, &class_index)?,
            None => {
                let n_samples = features.len() as f64;
                class_counts
                    .iter()
                    .map(|&count| count as f64 / n_samples)
                    .collect()
            }
        };

        let alpha = self.alpha;
        // Any positive alpha keeps probabilities strictly inside (0, 1), even
        // when alpha / N_y is below f64 resolution.
        let (floor, ceiling) = if alpha > 0.0 {
            (f64::EPSILON, 1.0 - f64::EPSILON)
        } else {
            warn!("fitting without smoothing; unseen features will zero out class scores");
            (0.0, 1.0)
        };

        let feature_prob: Vec<Vec<f64>> = feature_counts
            .iter()
            .zip(&class_counts)
            .map(|(counts, &n_class)| {
                counts
                    .iter()
                    .map(|&count| {
                        let p = (count as f64 + alpha) / (n_class as f64 + 2.0 * alpha);
                        p.clamp(floor, ceiling)
                    })
                    .collect()
            })
            .collect();
        let feature_log_prob = feature_prob
            .iter()
            .map(|probs| probs.iter().map(|p| p.ln()).collect())
            .collect();
        let neg_feature_log_prob = feature_prob
            .iter()
            .map(|probs| probs.iter().map(|p| (1.0 - p).ln()).collect())
            .collect();
        let class_log_prior = class_prior.iter().map(|p: &f64| p.ln()).collect();

        debug!(
            n_samples = features.len(),
            n_features,
            n_classes = classes.len(),
            alpha,
            "fitted bernoulli naive bayes"
        );

        self.fitted = Some(FittedModel {
            classes,
            class_index,
            class_prior,
            class_log_prior,
            feature_prob,
            feature_log_prob,
            neg_feature_log_prob,
            n_features,
        });

        Ok(())
    }

    /// Predicts one label per row, in row order.
    ///
    /// # Errors
    ///
    /// [`BayesError::Untrained`] before `fit`,
    /// [`BayesError::DimensionMismatch`] if a row's width differs from the
    /// training width, [`BayesError::InvalidInput`] for non 0/1 values.
    pub fn predict<R: AsRef<[u8]>>(&self, features: &[R]) -> Result<Vec<L>> {
        let model = self.fitted.as_ref().ok_or(BayesError::Untrained)?;

        let predictions = features
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let scores = model.row_log_scores(i, row.as_ref())?;
                Ok(model.classes[argmax(&scores)].clone())
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(n_rows = predictions.len(), "predicted");
        Ok(predictions)
    }

    /// Joint log-likelihood ln P(y) + ln P(x | y) per row and class.
    ///
    /// Entries may be `-inf` when the model holds probabilities of exactly
    /// 0 or 1 (only possible with `alpha = 0` or a zero prior).
    pub fn log_scores<R: AsRef<[u8]>>(&self, features: &[R]) -> Result<Vec<Vec<f64>>> {
        let model = self.fitted.as_ref().ok_or(BayesError::Untrained)?;
        features
            .iter()
            .enumerate()
            .map(|(i, row)| model.row_log_scores(i, row.as_ref()))
            .collect()
    }

    /// Posterior probability per class (first-seen order) for every row.
    ///
    /// A row that no class can explain gets a uniform distribution.
    pub fn predict_proba<R: AsRef<[u8]>>(&self, features: &[R]) -> Result<Vec<Vec<f64>>> {
        let scores = self.log_scores(features)?;
        Ok(scores.iter().map(|row| normalize_log_scores(row)).collect())
    }

    /// Prior used for `label`, or `None` if unfitted or the label is unknown.
    pub fn class_prior(&self, label: &L) -> Option<f64> {
        let model = self.fitted.as_ref()?;
        model
            .class_index
            .get(label)
            .map(|&idx| model.class_prior[idx])
    }

    /// Estimated P(X_feature = 1 | Y = label).
    pub fn feature_probability(&self, label: &L, feature: usize) -> Option<f64> {
        let model = self.fitted.as_ref()?;
        let &idx = model.class_index.get(label)?;
        model.feature_prob[idx].get(feature).copied()
    }
}

impl<L> FittedModel<L> {
    fn row_log_scores(&self, row_idx: usize, row: &[u8]) -> Result<Vec<f64>> {
        if row.len() != self.n_features {
            return Err(BayesError::DimensionMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        check_binary(row_idx, row)?;

        // Branch on the value rather than computing x*ln(p) so that a
        // -inf log term is never multiplied by zero.
        let scores = self
            .class_log_prior
            .iter()
            .zip(self.feature_log_prob.iter().zip(&self.neg_feature_log_prob))
            .map(|(&log_prior, (log_p, log_not_p))| {
                row.iter()
                    .zip(log_p.iter().zip(log_not_p))
                    .fold(log_prior, |acc, (&value, (&on, &off))| {
                        if value == 1 {
                            acc + on
                        } else {
                            acc + off
                        }
                    })
            })
            .collect();

        Ok(scores)
    }
}

fn check_binary(row_idx: usize, row: &[u8]) -> Result<()> {
    match row.iter().position(|&value| value > 1) {
        Some(col) => Err(BayesError::InvalidInput(format!(
            "row {row_idx}, column {col}: expected 0 or 1, got {}",
            row[col]
        ))),
        None => Ok(()),
    }
}

fn resolve_priors<L>(
    priors: &HashMap<L, f64>,
    classes: &[L],
    class_index: &HashMap<L, usize>,
) -> Result<Vec<f64>>
where
    L: Eq + Hash + Debug,
{
    if let Some(unknown) = priors.keys().find(|label| !class_index.contains_key(*label)) {
        return Err(BayesError::InvalidInput(format!(
            "class prior given for {unknown:?}, which does not appear in the training labels"
        )));
    }

    let mut resolved = Vec::with_capacity(classes.len());
    for class in classes {
        let &prior = priors.get(class).ok_or_else(|| {
            BayesError::InvalidInput(format!("no class prior given for {class:?}"))
        })?;
        if !prior.is_finite() || prior < 0.0 {
            return Err(BayesError::InvalidInput(format!(
                "class prior for {class:?} must be a finite value >= 0, got {prior}"
            )));
        }
        resolved.push(prior);
    }

    let total: f64 = resolved.iter().sum();
    if (total - 1.0).abs() > PRIOR_SUM_TOLERANCE {
        return Err(BayesError::InvalidInput(format!(
            "class priors must sum to 1, got {total}"
        )));
    }

    Ok(resolved)
}

/// Index of the highest score; the earliest index wins ties.
fn argmax(scores: &[f64]) -> usize {
    let (best, _) = scores.iter().enumerate().fold(
        (0, f64::NEG_INFINITY),
        |(best, best_score), (idx, &score)| {
            if score > best_score {
                (idx, score)
            } else {
                (best, best_score)
            }
        },
    );
    best
}

fn normalize_log_scores(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return vec![1.0 / scores.len() as f64; scores.len()];
    }

    let exps: Vec<f64> = scores.iter().map(|score| (score - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}
