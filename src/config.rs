use crate::constants;
use crate::error::{DatasetError, Result};
use crate::types::{Cutoffs, TargetSize};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the dataset archive lives and how to verify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteArchive {
    pub url: String,
    /// File name the archive is saved under inside the root.
    pub filename: String,
    pub md5: String,
}

impl Default for RemoteArchive {
    fn default() -> Self {
        Self {
            url: constants::FGNET_ARCHIVE_URL.to_string(),
            filename: constants::FGNET_ARCHIVE_FILENAME.to_string(),
            md5: constants::FGNET_ARCHIVE_MD5.to_string(),
        }
    }
}

/// Options recognized when building the dataset.
///
/// `Default` builds a fresh value every time; nothing is shared between
/// instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub root: PathBuf,
    pub download: bool,
    pub process_data: bool,
    pub target_size: TargetSize,
    pub categories: Cutoffs,
    pub test_size: f64,
    pub validation_size: f64,
    pub seed: u64,
    /// Also copy validation rows into `FGNET/validation/<category>/`.
    pub materialize_validation: bool,
    pub archive: RemoteArchive,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            download: false,
            process_data: true,
            target_size: TargetSize::default(),
            categories: Cutoffs::default(),
            test_size: constants::DEFAULT_TEST_SIZE,
            validation_size: constants::DEFAULT_VALIDATION_SIZE,
            seed: constants::DEFAULT_SEED,
            materialize_validation: false,
            archive: RemoteArchive::default(),
        }
    }
}

impl DatasetConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Loads a TOML config file; missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DatasetError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: DatasetConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides the root from `FGNET_ROOT` when set.
    pub fn apply_env(mut self) -> Self {
        if let Ok(root) = std::env::var("FGNET_ROOT") {
            if !root.trim().is_empty() {
                self.root = PathBuf::from(root);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_fraction("test_size", self.test_size)?;
        check_fraction("validation_size", self.validation_size)?;
        if self.archive.url.trim().is_empty() {
            return Err(DatasetError::Config("archive url must not be empty".into()));
        }
        if self.archive.md5.len() != 32 || hex::decode(&self.archive.md5).is_err() {
            return Err(DatasetError::Config(format!(
                "archive md5 '{}' is not a 32-digit hex digest",
                self.archive.md5
            )));
        }
        Ok(())
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(constants::IMAGES_DIR)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(constants::PROCESSED_DIR)
    }

    pub fn manifest_path(&self, split: crate::types::Split) -> PathBuf {
        self.processed_dir().join(split.manifest_name())
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(DatasetError::Config(format!("{name} must be in (0, 1), got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = DatasetConfig::new("/tmp/fgnet");
        assert!(!config.download);
        assert!(config.process_data);
        assert_eq!(config.target_size, TargetSize { height: 128, width: 128 });
        assert_eq!(config.categories.as_slice(), &[3, 11, 16, 24, 40]);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.validation_size, 0.15);
        assert_eq!(config.seed, 1);
        assert_eq!(config.archive.md5, constants::FGNET_ARCHIVE_MD5);
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults_are_not_shared() {
        let mut a = DatasetConfig::default();
        let b = DatasetConfig::default();
        a.categories = Cutoffs::new(vec![1, 2]).unwrap();
        assert_eq!(b.categories, Cutoffs::default());
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fgnet.toml");
        fs::write(
            &path,
            r#"
root = "/data/fgnet"
target_size = [64, 48]
categories = [10, 20]
test_size = 0.25

[archive]
url = "http://mirror.example/FGNET.zip"
"#,
        )
        .unwrap();

        let config = DatasetConfig::load(&path).unwrap();
        assert_eq!(config.root, PathBuf::from("/data/fgnet"));
        assert_eq!(config.target_size, TargetSize { height: 64, width: 48 });
        assert_eq!(config.categories.num_classes(), 3);
        assert_eq!(config.test_size, 0.25);
        assert_eq!(config.validation_size, 0.15);
        assert_eq!(config.archive.url, "http://mirror.example/FGNET.zip");
        assert_eq!(config.archive.filename, "fgnet.zip");
    }

    #[test]
    fn test_rejects_bad_fractions_and_cutoffs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");

        fs::write(&path, "test_size = 1.0\n").unwrap();
        assert!(matches!(DatasetConfig::load(&path), Err(DatasetError::Config(_))));

        fs::write(&path, "categories = [5, 1]\n").unwrap();
        assert!(DatasetConfig::load(&path).is_err());

        let mut config = DatasetConfig::default();
        config.validation_size = 0.0;
        assert!(config.validate().is_err());
    }
}
