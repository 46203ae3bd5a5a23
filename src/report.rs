//! Per-class precision, recall and F1 for a set of predictions.

use std::{collections::BTreeMap, fmt};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("{y_true} true labels but {y_pred} predictions")]
    LengthMismatch { y_true: usize, y_pred: usize },

    #[error("cannot report on zero predictions")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics<L> {
    pub label: L,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true instances of `label`.
    pub support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Classification summary over the union of true and predicted labels,
/// sorted by label. Undefined ratios (zero denominators) are reported as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport<L> {
    pub classes: Vec<ClassMetrics<L>>,
    pub accuracy: f64,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
    pub total: usize,
}

#[derive(Default)]
struct Counts {
    true_positive: usize,
    false_positive: usize,
    false_negative: usize,
}

impl<L: Ord + Clone> ClassificationReport<L> {
    pub fn new(y_true: &[L], y_pred: &[L]) -> Result<Self, ReportError> {
        if y_true.len() != y_pred.len() {
            return Err(ReportError::LengthMismatch {
                y_true: y_true.len(),
                y_pred: y_pred.len(),
            });
        }
        if y_true.is_empty() {
            return Err(ReportError::Empty);
        }

        let mut counts: BTreeMap<&L, Counts> = BTreeMap::new();
        let mut correct = 0;
        for (truth, pred) in y_true.iter().zip(y_pred) {
            if truth == pred {
                correct += 1;
                counts.entry(truth).or_default().true_positive += 1;
            } else {
                counts.entry(truth).or_default().false_negative += 1;
                counts.entry(pred).or_default().false_positive += 1;
            }
        }

        let classes: Vec<ClassMetrics<L>> = counts
            .into_iter()
            .map(|(label, c)| {
                let precision = ratio(c.true_positive, c.true_positive + c.false_positive);
                let recall = ratio(c.true_positive, c.true_positive + c.false_negative);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1,
                    support: c.true_positive + c.false_negative,
                }
            })
            .collect();

        let total = y_true.len();
        let n_classes = classes.len() as f64;
        let macro_avg = Averages {
            precision: classes.iter().map(|m| m.precision).sum::<f64>() / n_classes,
            recall: classes.iter().map(|m| m.recall).sum::<f64>() / n_classes,
            f1: classes.iter().map(|m| m.f1).sum::<f64>() / n_classes,
        };
        let weighted = |metric: fn(&ClassMetrics<L>) -> f64| {
            classes
                .iter()
                .map(|m| metric(m) * m.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = Averages {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1: weighted(|m| m.f1),
        };

        Ok(Self {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
            total,
        })
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl<L: fmt::Display> fmt::Display for ClassificationReport<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12}{:>10}{:>10}{:>10}{:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.classes {
            writeln!(
                f,
                "{:>12}{:>10.2}{:>10.2}{:>10.2}{:>10}",
                m.label.to_string(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12}{:>10}{:>10}{:>10.2}{:>10}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12}{:>10.2}{:>10.2}{:>10.2}{:>10}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}
