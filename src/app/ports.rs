use crate::error::Result;
use std::path::Path;

/// Download seam for the Acquirer.
///
/// Implementations write the resource at `url` to `dest` and return the number
/// of bytes written. Verification and extraction happen in the caller.
pub trait ArchiveFetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}
