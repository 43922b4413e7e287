use super::{acquire, normalize, split, StageOutcome};
use crate::app::ports::ArchiveFetcher;
use crate::config::DatasetConfig;
use crate::constants;
use crate::error::Result;
use crate::idempotency::{self, StageState};
use crate::infra::http_client::ReqwestFetcher;
use crate::storage::read_manifest;
use crate::types::{ManifestEntry, Split};
use metrics::histogram;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Per-stage outcome of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub acquire: StageOutcome,
    pub process: StageOutcome,
    pub split: StageOutcome,
}

/// Fingerprint of everything that shapes the processed images and manifest.
pub fn process_fingerprint(config: &DatasetConfig) -> String {
    let cutoffs = config
        .categories
        .as_slice()
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    idempotency::compute_fingerprint(&[
        constants::STAGE_PROCESS,
        &config.target_size.to_string(),
        &cutoffs,
    ])
}

/// Fingerprint of the split inputs, chained to the process fingerprint so a
/// re-process also invalidates the split.
pub fn split_fingerprint(config: &DatasetConfig) -> Result<String> {
    let manifest_digest = idempotency::file_digest(&config.manifest_path(Split::Full))?;
    Ok(idempotency::compute_fingerprint(&[
        constants::STAGE_SPLIT,
        &process_fingerprint(config),
        &manifest_digest,
        &config.test_size.to_string(),
        &config.validation_size.to_string(),
        &config.seed.to_string(),
        &config.materialize_validation.to_string(),
    ]))
}

fn remove_stale(dir: &Path) -> Result<()> {
    if dir.exists() {
        warn!("Removing incomplete or stale output {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    Ok(())
}

fn record_duration(stage: &'static str, started: Instant) {
    histogram!("fgnet_stage_duration_seconds", "stage" => stage).record(started.elapsed().as_secs_f64());
}

/// Acquirer stage: download, verify and extract if the images are absent.
pub fn run_download(config: &DatasetConfig, fetcher: &dyn ArchiveFetcher) -> Result<StageOutcome> {
    let started = Instant::now();
    let outcome = acquire::download(&config.root, &config.archive, fetcher)?;
    record_duration("acquire", started);
    Ok(outcome)
}

/// Labeler + Normalizer stage, skipped when its sentinel matches.
#[instrument(skip(config), fields(root = %config.root.display()))]
pub fn run_process(config: &DatasetConfig) -> Result<StageOutcome> {
    let fingerprint = process_fingerprint(config);
    if idempotency::stage_state(&config.root, constants::STAGE_PROCESS, &fingerprint)? == StageState::Complete {
        info!("Files already processed and verified");
        return Ok(StageOutcome::Skipped);
    }

    let started = Instant::now();
    idempotency::clear(&config.root, constants::STAGE_SPLIT)?;
    remove_stale(&config.processed_dir())?;

    let entries = normalize::process(config)?;
    idempotency::mark_complete(&config.root, constants::STAGE_PROCESS, &fingerprint, entries.len())?;
    record_duration(constants::STAGE_PROCESS, started);
    Ok(StageOutcome::Completed)
}

/// Splitter stage, skipped when its sentinel matches.
#[instrument(skip(config), fields(root = %config.root.display()))]
pub fn run_split(config: &DatasetConfig) -> Result<StageOutcome> {
    let fingerprint = split_fingerprint(config)?;
    if idempotency::stage_state(&config.root, constants::STAGE_SPLIT, &fingerprint)? == StageState::Complete {
        info!("Files already split and verified");
        return Ok(StageOutcome::Skipped);
    }

    let started = Instant::now();
    for dir in [constants::TRAIN_DIR, constants::VALIDATION_DIR, constants::TEST_DIR] {
        remove_stale(&config.root.join(dir))?;
    }

    let result = split::split(config)?;
    let rows = result.train.len() + result.validation.len() + result.test.len();
    idempotency::mark_complete(&config.root, constants::STAGE_SPLIT, &fingerprint, rows)?;
    record_duration(constants::STAGE_SPLIT, started);
    Ok(StageOutcome::Completed)
}

/// Handle on a prepared FG-NET dataset.
#[derive(Debug)]
pub struct FgNet {
    config: DatasetConfig,
    report: PipelineReport,
}

impl FgNet {
    /// Prepares the dataset, downloading over HTTP when `config.download` is set.
    pub fn new(config: DatasetConfig) -> Result<Self> {
        let fetcher = ReqwestFetcher::new()?;
        Self::with_fetcher(config, &fetcher)
    }

    /// Runs the stages in order: acquire (if requested), integrity check, then
    /// process and split when `process_data` is set.
    #[instrument(skip_all, fields(root = %config.root.display()))]
    pub fn with_fetcher(config: DatasetConfig, fetcher: &dyn ArchiveFetcher) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.root)?;

        let acquire = if config.download {
            run_download(&config, fetcher)?
        } else {
            StageOutcome::Skipped
        };
        acquire::ensure_integrity(&config.root)?;

        let (process, split) = if config.process_data {
            (run_process(&config)?, run_split(&config)?)
        } else {
            (StageOutcome::Skipped, StageOutcome::Skipped)
        };

        let report = PipelineReport { acquire, process, split };
        info!(?report, "Dataset ready");
        Ok(Self { config, report })
    }

    /// Opens an already prepared root without running any stage.
    pub fn open(config: DatasetConfig) -> Result<Self> {
        config.validate()?;
        acquire::ensure_integrity(&config.root)?;
        let report = PipelineReport {
            acquire: StageOutcome::Skipped,
            process: StageOutcome::Skipped,
            split: StageOutcome::Skipped,
        };
        Ok(Self { config, report })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn report(&self) -> PipelineReport {
        self.report
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn num_classes(&self) -> usize {
        self.config.categories.num_classes()
    }

    /// Reads one of the manifests written by the pipeline.
    pub fn manifest(&self, split: Split) -> Result<Vec<ManifestEntry>> {
        read_manifest(&self.config.manifest_path(split))
    }

    /// Location of a manifest row's image for the given split.
    pub fn image_path(&self, split: Split, entry: &ManifestEntry) -> PathBuf {
        let dir = self
            .config
            .root
            .join(split.image_dir(self.config.materialize_validation));
        if split.is_bucketed() {
            dir.join(entry.category.to_string()).join(&entry.path)
        } else {
            dir.join(&entry.path)
        }
    }
}
