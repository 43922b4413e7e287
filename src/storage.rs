use crate::error::Result;
use crate::types::ManifestEntry;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Writes a manifest as `path,category` CSV, creating parent directories.
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    // An empty manifest still carries its header
    if entries.is_empty() {
        writer.write_record(["path", "category"])?;
    }
    writer.flush()?;
    debug!("Wrote {} manifest rows to {}", entries.len(), path.display());
    Ok(())
}

/// Reads a `path,category` manifest back in file order.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let mut reader = csv::Reader::from_path(path)?;
    let entries = reader
        .deserialize()
        .collect::<std::result::Result<Vec<ManifestEntry>, _>>()?;
    debug!("Read {} manifest rows from {}", entries.len(), path.display());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use tempfile::tempdir;

    #[test]
    fn test_manifest_schema_and_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/fgnet.csv");
        let entries = vec![
            ManifestEntry::new("002A05.JPG", Category(1)),
            ManifestEntry::new("001A43a.JPG", Category(5)),
        ];

        write_manifest(&path, &entries).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "path,category\n002A05.JPG,1\n001A43a.JPG,5\n");
        assert_eq!(read_manifest(&path).unwrap(), entries);
    }

    #[test]
    fn test_empty_manifest_keeps_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_manifest(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "path,category\n");
        assert!(read_manifest(&path).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_integer_category() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "path,category\n001A02.JPG,young\n").unwrap();
        assert!(read_manifest(&path).is_err());
    }
}
