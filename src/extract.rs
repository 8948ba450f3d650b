//! Safe extraction of the bundle archive into the scratch directory.

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, RunletError};
use crate::platform::{detect_platform, safe_join, substitute_placeholder};

/// Copy buffer size for streaming entry payloads.
const COPY_BUF_SIZE: usize = 8 * 1024;

/// Unpacks the bundle archive into a destination directory.
///
/// Every entry's destination is resolved through [`safe_join`], so an entry
/// whose name would escape the destination root aborts the whole extraction
/// with [`RunletError::PathTraversal`] before anything is written for it.
/// The extractor never removes anything, not even on failure; directory
/// removal is the cleanup manager's job regardless of how far extraction got.
pub struct ArchiveExtractor {
    platform: String,
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self {
            platform: detect_platform(),
        }
    }

    /// Override the detected platform string (tests).
    #[cfg(test)]
    fn with_platform(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
        }
    }

    /// Extract all entries of `archive` under `dest`.
    pub fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        let file = File::open(archive).map_err(RunletError::Extraction)?;
        let mut bundle = zip::ZipArchive::new(BufReader::new(file))?;

        info!(
            archive = %archive.display(),
            dest = %dest.display(),
            entries = bundle.len(),
            "Extracting bundle"
        );

        let mut buf = [0u8; COPY_BUF_SIZE];
        for index in 0..bundle.len() {
            let mut entry = bundle.by_index(index)?;
            let name = substitute_placeholder(entry.name(), &self.platform);
            let dest_path = safe_join(dest, &name)?;

            if entry.is_dir() {
                fs::create_dir_all(&dest_path).map_err(RunletError::Extraction)?;
                continue;
            }

            // Archives written on some platforms omit directory entries.
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent).map_err(RunletError::Extraction)?;
            }

            let mut out = File::create(&dest_path).map_err(RunletError::Extraction)?;
            loop {
                let n = entry.read(&mut buf).map_err(RunletError::Extraction)?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n]).map_err(RunletError::Extraction)?;
            }

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))
                    .map_err(RunletError::Extraction)?;
            }

            debug!(entry = %name, size = entry.size(), "Extracted");
        }

        Ok(())
    }
}
