//! Archive and on-disk layout constants for the FG-NET dataset.
//! Every path below is relative to the configured dataset root.

// Remote archive
pub const FGNET_ARCHIVE_URL: &str = "http://yanweifu.github.io/FG_NET_data/FGNET.zip";
pub const FGNET_ARCHIVE_FILENAME: &str = "fgnet.zip";
pub const FGNET_ARCHIVE_MD5: &str = "1206978cac3626321b84c22b24cc8d19";

// Directory layout
pub const IMAGES_DIR: &str = "FGNET/images";
pub const PROCESSED_DIR: &str = "FGNET/data_processed";
pub const TRAIN_DIR: &str = "FGNET/train";
pub const VALIDATION_DIR: &str = "FGNET/validation";
pub const TEST_DIR: &str = "FGNET/test";
pub const STAGES_DIR: &str = "FGNET/.stages";

// Manifest file names (inside PROCESSED_DIR)
pub const FULL_MANIFEST: &str = "fgnet.csv";
pub const TRAIN_MANIFEST: &str = "train.csv";
pub const VALIDATION_MANIFEST: &str = "validation.csv";
pub const TEST_MANIFEST: &str = "test.csv";

// Stage names, also used as sentinel file stems and metric labels
pub const STAGE_PROCESS: &str = "process";
pub const STAGE_SPLIT: &str = "split";

// Defaults
pub const DEFAULT_TARGET_SIZE: (u32, u32) = (128, 128);
pub const DEFAULT_CUTOFFS: [u32; 5] = [3, 11, 16, 24, 40];
pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_VALIDATION_SIZE: f64 = 0.15;
pub const DEFAULT_SEED: u64 = 1;

/// How often the per-image stages emit a progress line
pub const PROGRESS_EVERY: usize = 50;
