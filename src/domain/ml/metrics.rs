use serde::Serialize;
use std::fmt;

/// Binary classification scores for one data split
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub samples: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when the split holds a single class
    pub roc_auc: Option<f64>,
}

impl ClassificationReport {
    /// Score probabilities against 0/1 labels. Precision, recall and F1 use
    /// `threshold`; a zero denominator yields 0.0.
    pub fn compute(labels: &[u8], probabilities: &[f64], threshold: f64) -> Self {
        let n = labels.len().min(probabilities.len());
        let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);

        for (&label, &p) in labels.iter().zip(probabilities) {
            match (p >= threshold, label == 1) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, false) => tn += 1,
                (false, true) => fn_ += 1,
            }
        }

        let ratio = |num: usize, den: usize| {
            if den == 0 { 0.0 } else { num as f64 / den as f64 }
        };
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            samples: n,
            accuracy: ratio(tp + tn, n),
            precision,
            recall,
            f1,
            roc_auc: roc_auc(&labels[..n], &probabilities[..n]),
        }
    }
}

/// Area under the ROC curve from the rank-sum statistic, averaging ranks
/// over tied scores.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Option<f64> {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; tied block shares the mean rank
        let mean_rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            if labels[idx] == 1 {
                positive_rank_sum += mean_rank;
            }
        }
        start = end + 1;
    }

    let pos = positives as f64;
    Some((positive_rank_sum - pos * (pos + 1.0) / 2.0) / (pos * negatives as f64))
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Samples   - {}", self.samples)?;
        writeln!(f, "  Accuracy  - {:.6}", self.accuracy)?;
        writeln!(f, "  Precision - {:.6}", self.precision)?;
        writeln!(f, "  Recall    - {:.6}", self.recall)?;
        writeln!(f, "  F1-score  - {:.6}", self.f1)?;
        match self.roc_auc {
            Some(auc) => write!(f, "  ROC-AUC   - {:.6}", auc),
            None => write!(f, "  ROC-AUC   - n/a (single class)"),
        }
    }
}
