use super::StageOutcome;
use crate::app::ports::ArchiveFetcher;
use crate::config::RemoteArchive;
use crate::constants;
use crate::error::{DatasetError, Result};
use md5::{Digest, Md5};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use tracing::{debug, info, instrument};
use zip::ZipArchive;

/// True when the extracted image directory is present under `root`.
pub fn check_integrity(root: &Path) -> bool {
    root.join(constants::IMAGES_DIR).is_dir()
}

pub fn ensure_integrity(root: &Path) -> Result<()> {
    if check_integrity(root) {
        Ok(())
    } else {
        Err(DatasetError::Integrity(format!(
            "Dataset not found or corrupted under {}. You can use download=true to download it",
            root.display()
        )))
    }
}

/// Downloads, verifies and extracts the archive unless the images are already there.
#[instrument(skip(archive, fetcher), fields(url = %archive.url))]
pub fn download(root: &Path, archive: &RemoteArchive, fetcher: &dyn ArchiveFetcher) -> Result<StageOutcome> {
    if check_integrity(root) {
        info!("Files already downloaded and verified");
        return Ok(StageOutcome::Skipped);
    }

    fs::create_dir_all(root)?;
    let archive_path = root.join(&archive.filename);
    fetcher.fetch(&archive.url, &archive_path)?;
    verify_md5(&archive_path, &archive.md5)?;
    let entries = extract_archive(&archive_path, root)?;
    info!("Extracted {} archive entries into {}", entries, root.display());

    ensure_integrity(root)?;
    Ok(StageOutcome::Completed)
}

/// Streaming MD5 of a file, lowercase hex.
pub fn file_md5(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Md5::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

pub fn verify_md5(path: &Path, expected: &str) -> Result<()> {
    let actual = file_md5(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(DatasetError::ChecksumMismatch {
            expected: expected.to_ascii_lowercase(),
            actual,
        });
    }
    debug!("Checksum verified for {}", path.display());
    Ok(())
}

/// Extracts a zip archive into `dest`, refusing entries that would land outside it.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<usize> {
    let reader = BufReader::new(File::open(archive_path)?);
    let mut archive = ZipArchive::new(reader)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                return Err(DatasetError::Integrity(format!(
                    "archive entry '{}' escapes the extraction directory",
                    entry.name()
                )))
            }
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        debug!("Extracted {}", out_path.display());
    }

    Ok(archive.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, bytes) in files {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_md5_of_known_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(file_md5(&path).unwrap(), "900150983cd24fb0d6963f7d28e17f72");
        verify_md5(&path, "900150983CD24FB0D6963F7D28E17F72").unwrap();
        assert!(matches!(
            verify_md5(&path, "00000000000000000000000000000000"),
            Err(DatasetError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_extract_creates_nested_files() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("a.zip");
        write_zip(&zip_path, &[("FGNET/images/001A02.JPG", b"x"), ("FGNET/README", b"y")]);

        let out = dir.path().join("out");
        let n = extract_archive(&zip_path, &out).unwrap();
        assert_eq!(n, 2);
        assert!(check_integrity(&out));
        assert_eq!(fs::read(out.join("FGNET/images/001A02.JPG")).unwrap(), b"x");
    }

    #[test]
    fn test_extract_rejects_escaping_entries() {
        let dir = tempdir().unwrap();
        let zip_path = dir.path().join("evil.zip");
        write_zip(&zip_path, &[("../evil.txt", b"x")]);
        let out = dir.path().join("out");
        assert!(matches!(
            extract_archive(&zip_path, &out),
            Err(DatasetError::Integrity(_))
        ));
        assert!(!dir.path().join("evil.txt").exists());
    }

    #[test]
    fn test_integrity_requires_images_dir() {
        let dir = tempdir().unwrap();
        assert!(ensure_integrity(dir.path()).is_err());
        fs::create_dir_all(dir.path().join("FGNET")).unwrap();
        assert!(ensure_integrity(dir.path()).is_err());
        fs::create_dir_all(dir.path().join("FGNET/images")).unwrap();
        assert!(ensure_integrity(dir.path()).is_ok());
    }
}
