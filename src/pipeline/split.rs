//! Two-stage stratified splitting and per-split materialization.

use crate::config::DatasetConfig;
use crate::constants;
use crate::error::{DatasetError, Result};
use crate::storage::{read_manifest, write_manifest};
use crate::types::{Category, ManifestEntry, Split};
use metrics::counter;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Rows of one split run. `train` and `validation` together are the
/// train-pool that was split off from `test`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    pub train: Vec<ManifestEntry>,
    pub validation: Vec<ManifestEntry>,
    pub test: Vec<ManifestEntry>,
}

impl SplitResult {
    /// Train rows followed by validation rows, as written to `train.csv`.
    pub fn trainval(&self) -> Vec<ManifestEntry> {
        self.train.iter().chain(&self.validation).cloned().collect()
    }
}

/// Splits per-category counts so the picks sum to `n_pick` and each
/// category's share of `n_pick` is its proportional share, rounded by
/// largest remainder. Ties go to the lower category.
pub fn allocate_quotas(counts: &[usize], n_pick: usize) -> Vec<usize> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0; counts.len()];
    }
    let mut quotas: Vec<usize> = counts.iter().map(|&c| c * n_pick / total).collect();
    let assigned: usize = quotas.iter().sum();

    let mut by_remainder: Vec<usize> = (0..counts.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = counts[a] * n_pick % total;
        let rb = counts[b] * n_pick % total;
        rb.cmp(&ra).then(a.cmp(&b))
    });
    for &i in by_remainder.iter().take(n_pick - assigned) {
        quotas[i] += 1;
    }
    quotas
}

/// Stratified random split of `entries` into (train, test).
///
/// The test side gets `ceil(test_fraction * n)` rows; each category
/// contributes in proportion to its size. Row choice within a category and
/// the final order of both sides come from `rng`.
pub fn stratified_split(
    entries: &[ManifestEntry],
    test_fraction: f64,
    rng: &mut ChaCha8Rng,
) -> Result<(Vec<ManifestEntry>, Vec<ManifestEntry>)> {
    let n = entries.len();
    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(DatasetError::EmptySplit(format!(
            "{n} rows with test fraction {test_fraction} leaves {} train and {n_test} test rows",
            n.saturating_sub(n_test)
        )));
    }

    let mut groups: BTreeMap<Category, Vec<usize>> = BTreeMap::new();
    for (i, entry) in entries.iter().enumerate() {
        groups.entry(entry.category).or_default().push(i);
    }
    let counts: Vec<usize> = groups.values().map(Vec::len).collect();
    let quotas = allocate_quotas(&counts, n_test);

    let mut train_idx = Vec::with_capacity(n - n_test);
    let mut test_idx = Vec::with_capacity(n_test);
    for (mut members, quota) in groups.into_values().zip(quotas) {
        members.shuffle(rng);
        test_idx.extend_from_slice(&members[..quota]);
        train_idx.extend_from_slice(&members[quota..]);
    }
    train_idx.shuffle(rng);
    test_idx.shuffle(rng);

    let pick = |idx: &[usize]| idx.iter().map(|&i| entries[i].clone()).collect::<Vec<_>>();
    Ok((pick(&train_idx), pick(&test_idx)))
}

/// Copies each row's image from `source_dir` to `dest_root/<category>/<path>`.
pub fn materialize(entries: &[ManifestEntry], source_dir: &Path, dest_root: &Path, split: Split) -> Result<usize> {
    for (i, entry) in entries.iter().enumerate() {
        let src = source_dir.join(&entry.path);
        if !src.is_file() {
            return Err(DatasetError::MissingSource(src));
        }
        let dst = dest_root.join(entry.category.to_string()).join(&entry.path);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&src, &dst)?;
        counter!("fgnet_files_copied_total", "split" => split.to_string()).increment(1);
        if (i + 1) % constants::PROGRESS_EVERY == 0 {
            debug!("Copied {}/{} {} images", i + 1, entries.len(), split);
        }
    }
    info!("Copied {} images into {}", entries.len(), dest_root.display());
    Ok(entries.len())
}

/// Splits the full manifest, copies images per split and writes the split manifests.
#[instrument(skip(config), fields(root = %config.root.display()))]
pub fn split(config: &DatasetConfig) -> Result<SplitResult> {
    let manifest = read_manifest(&config.manifest_path(Split::Full))?;
    let processed_dir = config.processed_dir();

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let (pool, test) = stratified_split(&manifest, config.test_size, &mut rng)?;

    materialize(&test, &processed_dir, &config.root.join(constants::TEST_DIR), Split::Test)?;
    materialize(&pool, &processed_dir, &config.root.join(constants::TRAIN_DIR), Split::TrainVal)?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let (train, validation) = stratified_split(&pool, config.validation_size, &mut rng)?;
    if config.materialize_validation {
        materialize(
            &validation,
            &processed_dir,
            &config.root.join(constants::VALIDATION_DIR),
            Split::Validation,
        )?;
    }

    let result = SplitResult { train, validation, test };
    write_manifest(&config.manifest_path(Split::Test), &result.test)?;
    write_manifest(&config.manifest_path(Split::TrainVal), &result.trainval())?;
    write_manifest(&config.manifest_path(Split::Validation), &result.validation)?;

    info!(
        "Split {} rows: {} train, {} validation, {} test",
        manifest.len(),
        result.train.len(),
        result.validation.len(),
        result.test.len()
    );
    Ok(result)
}
