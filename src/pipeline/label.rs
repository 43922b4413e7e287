use crate::error::Result;
use crate::parser::age_from_filename;
use crate::types::{Cutoffs, ManifestEntry};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Builds the manifest for every regular file in `images_dir`.
///
/// Files are visited in lexicographic order so the manifest, and every split
/// derived from it, does not depend on directory iteration order. A name that
/// does not follow the FG-NET grammar fails the whole scan.
#[instrument(skip(cutoffs))]
pub fn load_data(images_dir: &Path, cutoffs: &Cutoffs) -> Result<Vec<ManifestEntry>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(images_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    let entries = names
        .into_iter()
        .map(|name| {
            let age = age_from_filename(&name)?;
            let category = cutoffs.find_category(age);
            debug!(file = %name, age, %category, "labelled");
            Ok(ManifestEntry::new(name, category))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Labelled {} images from {}", entries.len(), images_dir.display());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetError;
    use crate::types::Category;
    use tempfile::tempdir;

    #[test]
    fn test_manifest_is_sorted_and_bucketed() {
        let dir = tempdir().unwrap();
        for name in ["002A45.JPG", "001A10.JPG", "001A02.JPG", "003A16b.JPG"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        // Subdirectories are not images
        fs::create_dir(dir.path().join("999A01")).unwrap();

        let entries = load_data(dir.path(), &Cutoffs::default()).unwrap();
        assert_eq!(
            entries,
            vec![
                ManifestEntry::new("001A02.JPG", Category(0)),
                ManifestEntry::new("001A10.JPG", Category(1)),
                ManifestEntry::new("002A45.JPG", Category(5)),
                ManifestEntry::new("003A16b.JPG", Category(3)),
            ]
        );
    }

    #[test]
    fn test_nonconforming_file_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("001A02.JPG"), b"").unwrap();
        fs::write(dir.path().join("Thumbs.db"), b"").unwrap();

        let err = load_data(dir.path(), &Cutoffs::default()).unwrap_err();
        assert!(matches!(err, DatasetError::Filename { ref name, .. } if name == "Thumbs.db"));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_data(&dir.path().join("nope"), &Cutoffs::default()).unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }
}
