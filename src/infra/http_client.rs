use crate::app::ports::ArchiveFetcher;
use crate::error::{DatasetError, Result};
use reqwest::header::CONTENT_LENGTH;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Blocking reqwest client streaming the archive straight to disk.
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()?;
        Ok(Self { client })
    }
}

impl ArchiveFetcher for ReqwestFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {} to {}", url, dest.display());
        let mut resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DatasetError::Download {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let expected: Option<u64> = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        debug!("Content-Length: {:?}", expected);

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(dest)?);
        let written = io::copy(&mut resp, &mut writer)?;
        writer.flush()?;

        info!("Downloaded {} bytes", written);
        Ok(written)
    }
}
