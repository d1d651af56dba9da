use crate::data::TargetSummary;
use crate::types::{LabelId, TargetName};

/// Aggregate skew metrics for a consolidated label distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelSkew {
    pub labels: usize,
    pub min_frequency: f64,
    pub max_frequency: f64,
    pub mean_frequency: f64,
    pub ratio: f64,
    pub per_label: Vec<LabelShare>,
}

/// Per-label share of the corpus for skew inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelShare {
    pub id: LabelId,
    pub name: TargetName,
    pub frequency: f64,
}

/// Compute skew metrics from a target table.
///
/// Useful for judging whether a `keep_top_k` choice leaves the training
/// distribution dominated by a handful of places.
pub fn label_skew(targets: &[TargetSummary]) -> Option<LabelSkew> {
    if targets.is_empty() {
        return None;
    }
    let labels = targets.len();
    let min_frequency = targets
        .iter()
        .map(|summary| summary.frequency)
        .fold(f64::INFINITY, f64::min);
    let max_frequency = targets
        .iter()
        .map(|summary| summary.frequency)
        .fold(f64::NEG_INFINITY, f64::max);
    let mean_frequency =
        targets.iter().map(|summary| summary.frequency).sum::<f64>() / labels as f64;
    let ratio = if min_frequency == 0.0 {
        f64::INFINITY
    } else {
        max_frequency / min_frequency
    };
    let mut per_label: Vec<LabelShare> = targets
        .iter()
        .map(|summary| LabelShare {
            id: summary.id,
            name: summary.name.clone(),
            frequency: summary.frequency,
        })
        .collect();
    per_label.sort_by(|a, b| {
        b.frequency
            .total_cmp(&a.frequency)
            .then_with(|| a.name.cmp(&b.name))
    });
    Some(LabelSkew {
        labels,
        min_frequency,
        max_frequency,
        mean_frequency,
        ratio,
        per_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, PlaceRecord};

    fn record(key: &str, target: &str) -> PlaceRecord {
        PlaceRecord {
            key: key.to_string(),
            lng: 0.0,
            lat: 0.0,
            target: target.to_string(),
            image: None,
        }
    }

    #[test]
    fn empty_table_has_no_skew() {
        assert_eq!(label_skew(&[]), None);
    }

    #[test]
    fn skew_reports_balance() {
        let dataset = Dataset::from_records(vec![record("a", "X"), record("b", "Y")]);
        let skew = label_skew(dataset.targets()).expect("skew");
        assert_eq!(skew.labels, 2);
        assert!((skew.min_frequency - 0.5).abs() < 1e-6);
        assert!((skew.max_frequency - 0.5).abs() < 1e-6);
        assert!((skew.ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn skew_reports_imbalance_with_dominant_label_first() {
        let dataset = Dataset::from_records(vec![
            record("a", "X"),
            record("b", "X"),
            record("c", "X"),
            record("d", "Y"),
        ]);
        let skew = label_skew(dataset.targets()).expect("skew");
        assert_eq!(skew.per_label[0].name, "X");
        assert!((skew.per_label[0].frequency - 0.75).abs() < 1e-6);
        assert!((skew.ratio - 3.0).abs() < 1e-6);
    }
}
