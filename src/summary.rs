//! Category distribution per split.

use crate::error::Result;
use crate::pipeline::FgNet;
use crate::types::{ManifestEntry, Split};
use serde::Serialize;
use std::fmt;

/// Row counts per category for one manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitSummary {
    pub split: Split,
    pub total: usize,
    /// Index = category, value = row count.
    pub per_category: Vec<usize>,
}

impl SplitSummary {
    pub fn from_entries(split: Split, entries: &[ManifestEntry], num_classes: usize) -> Self {
        let mut per_category = vec![0; num_classes];
        for entry in entries {
            let idx = entry.category.index();
            if idx >= per_category.len() {
                per_category.resize(idx + 1, 0);
            }
            per_category[idx] += 1;
        }
        Self {
            split,
            total: entries.len(),
            per_category,
        }
    }

    /// Share of rows in each category; all zeros for an empty manifest.
    pub fn proportions(&self) -> Vec<f64> {
        let total = self.total.max(1) as f64;
        self.per_category.iter().map(|&c| c as f64 / total).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub num_classes: usize,
    pub splits: Vec<SplitSummary>,
}

impl DatasetSummary {
    /// Summarizes every manifest the pipeline has written so far.
    pub fn from_dataset(dataset: &FgNet) -> Result<Self> {
        let num_classes = dataset.num_classes();
        let mut splits = Vec::new();
        for split in Split::all() {
            let path = dataset.config().manifest_path(split);
            if !path.exists() {
                continue;
            }
            let entries = dataset.manifest(split)?;
            splits.push(SplitSummary::from_entries(split, &entries, num_classes));
        }
        Ok(Self { num_classes, splits })
    }

    pub fn get(&self, split: Split) -> Option<&SplitSummary> {
        self.splits.iter().find(|s| s.split == split)
    }

    /// Largest absolute gap between a split's category proportions and the
    /// full manifest's.
    pub fn max_proportion_gap(&self, split: Split) -> Option<f64> {
        let full = self.get(Split::Full)?.proportions();
        let other = self.get(split)?.proportions();
        full.iter()
            .zip(other.iter())
            .map(|(a, b)| (a - b).abs())
            .reduce(f64::max)
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12}{:>7}", "split", "total")?;
        for c in 0..self.num_classes {
            write!(f, "{:>7}", format!("c{c}"))?;
        }
        writeln!(f)?;
        for s in &self.splits {
            write!(f, "{:<12}{:>7}", s.split.to_string(), s.total)?;
            for count in &s.per_category {
                write!(f, "{count:>7}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn test_counts_and_proportions() {
        let entries = vec![
            ManifestEntry::new("a", Category(0)),
            ManifestEntry::new("b", Category(2)),
            ManifestEntry::new("c", Category(2)),
            ManifestEntry::new("d", Category(5)),
        ];
        let summary = SplitSummary::from_entries(Split::Test, &entries, 6);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.per_category, vec![1, 0, 2, 0, 0, 1]);
        assert_eq!(summary.proportions()[2], 0.5);
    }

    #[test]
    fn test_empty_summary() {
        let summary = SplitSummary::from_entries(Split::Validation, &[], 3);
        assert_eq!(summary.per_category, vec![0, 0, 0]);
        assert_eq!(summary.proportions(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_display_and_gap() {
        let full = SplitSummary::from_entries(
            Split::Full,
            &[ManifestEntry::new("a", Category(0)), ManifestEntry::new("b", Category(1))],
            2,
        );
        let test = SplitSummary::from_entries(Split::Test, &[ManifestEntry::new("a", Category(0))], 2);
        let summary = DatasetSummary { num_classes: 2, splits: vec![full, test] };

        assert_eq!(summary.max_proportion_gap(Split::Test), Some(0.5));
        assert_eq!(summary.max_proportion_gap(Split::TrainVal), None);
        let table = summary.to_string();
        assert!(table.lines().count() == 3);
        assert!(table.contains("test"));
    }
}
