use crate::constants;
use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal category index. Larger values are older age buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(pub u32);

impl Category {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Cumulative binary codeword for ordinal ECOC heads: category `k` of
    /// `num_classes` maps to `k` ones followed by zeros, `num_classes - 1` bits.
    pub fn ordinal_code(self, num_classes: usize) -> Vec<u8> {
        let bits = num_classes.saturating_sub(1);
        (0..bits).map(|i| u8::from(i < self.index())).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ascending age boundaries that define the ordinal buckets.
///
/// Always non-empty and strictly increasing; construction rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct Cutoffs(Vec<u32>);

impl Cutoffs {
    pub fn new(values: Vec<u32>) -> Result<Self, DatasetError> {
        if values.is_empty() {
            return Err(DatasetError::Config("category cutoffs must not be empty".into()));
        }
        if let Some(w) = values.windows(2).find(|w| w[0] >= w[1]) {
            return Err(DatasetError::Config(format!(
                "category cutoffs must be strictly increasing, found {} followed by {}",
                w[0], w[1]
            )));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Number of buckets, including the overflow bucket past the last cutoff.
    pub fn num_classes(&self) -> usize {
        self.0.len() + 1
    }

    /// Index of the first cutoff strictly greater than `age`, or the overflow
    /// bucket `len(cutoffs)` when no cutoff exceeds it.
    pub fn find_category(&self, age: u32) -> Category {
        let idx = self
            .0
            .iter()
            .position(|&cutoff| age < cutoff)
            .unwrap_or(self.0.len());
        Category(idx as u32)
    }
}

impl Default for Cutoffs {
    fn default() -> Self {
        Self(constants::DEFAULT_CUTOFFS.to_vec())
    }
}

impl TryFrom<Vec<u32>> for Cutoffs {
    type Error = DatasetError;

    fn try_from(values: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Cutoffs> for Vec<u32> {
    fn from(cutoffs: Cutoffs) -> Self {
        cutoffs.0
    }
}

impl FromStr for Cutoffs {
    type Err = DatasetError;

    /// Parses a comma-separated list such as `3,11,16,24,40`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u32>()
                    .map_err(|e| DatasetError::Config(format!("invalid cutoff '{}': {}", part.trim(), e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(values)
    }
}

/// Output resolution of processed images, stored as (height, width).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u32; 2]", into = "[u32; 2]")]
pub struct TargetSize {
    pub height: u32,
    pub width: u32,
}

impl TargetSize {
    pub fn new(height: u32, width: u32) -> Result<Self, DatasetError> {
        if height == 0 || width == 0 {
            return Err(DatasetError::Config(format!(
                "target size must be positive, got {height}x{width}"
            )));
        }
        Ok(Self { height, width })
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        let (height, width) = constants::DEFAULT_TARGET_SIZE;
        Self { height, width }
    }
}

impl TryFrom<[u32; 2]> for TargetSize {
    type Error = DatasetError;

    fn try_from([height, width]: [u32; 2]) -> Result<Self, Self::Error> {
        Self::new(height, width)
    }
}

impl From<TargetSize> for [u32; 2] {
    fn from(size: TargetSize) -> Self {
        [size.height, size.width]
    }
}

impl FromStr for TargetSize {
    type Err = DatasetError;

    /// Parses `HxW`, e.g. `128x128`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, w) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| DatasetError::Config(format!("target size '{s}' is not of the form HxW")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| DatasetError::Config(format!("invalid target size '{s}': {e}")))
        };
        Self::new(parse(h)?, parse(w)?)
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// One manifest row: image file name relative to its directory, and its bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub category: Category,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>, category: Category) -> Self {
        Self {
            path: path.into(),
            category,
        }
    }
}

/// The manifests produced by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// Every labelled image, written by the Normalizer.
    Full,
    /// Train and validation rows together (`train.csv`).
    TrainVal,
    Validation,
    Test,
}

impl Split {
    pub fn manifest_name(self) -> &'static str {
        match self {
            Split::Full => constants::FULL_MANIFEST,
            Split::TrainVal => constants::TRAIN_MANIFEST,
            Split::Validation => constants::VALIDATION_MANIFEST,
            Split::Test => constants::TEST_MANIFEST,
        }
    }

    /// Directory holding the images of this split, relative to the root.
    /// Validation images live in the train directory unless materialized.
    pub fn image_dir(self, materialized_validation: bool) -> &'static str {
        match self {
            Split::Full => constants::PROCESSED_DIR,
            Split::TrainVal => constants::TRAIN_DIR,
            Split::Validation if materialized_validation => constants::VALIDATION_DIR,
            Split::Validation => constants::TRAIN_DIR,
            Split::Test => constants::TEST_DIR,
        }
    }

    /// Whether images of this split are laid out as `<dir>/<category>/<file>`.
    pub fn is_bucketed(self) -> bool {
        !matches!(self, Split::Full)
    }

    pub fn all() -> [Split; 4] {
        [Split::Full, Split::TrainVal, Split::Validation, Split::Test]
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Split::Full => "full",
            Split::TrainVal => "trainval",
            Split::Validation => "validation",
            Split::Test => "test",
        };
        f.write_str(name)
    }
}
