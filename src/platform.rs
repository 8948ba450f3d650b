//! The single path-normalization boundary.
//!
//! Every translation from an archive-internal entry name to a real
//! filesystem path goes through [`safe_join`]. Platform quirks (drive
//! letters, separators) and the zip-slip defense live here and nowhere else.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Result, RunletError};

/// Placeholder token embedded in bundle entry names by the packaging step.
/// Rewritten at extraction time to the detected platform string so one
/// bundle serves every platform.
pub const PLATFORM_PLACEHOLDER: &str = "platform-XX";

/// The concrete platform string for this launch, e.g. `platform-linux-x86_64`.
pub fn detect_platform() -> String {
    format!(
        "platform-{}-{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Rewrite the platform placeholder in an entry name, if present.
pub fn substitute_placeholder(entry_name: &str, platform: &str) -> String {
    if entry_name.contains(PLATFORM_PLACEHOLDER) {
        let rewritten = entry_name.replace(PLATFORM_PLACEHOLDER, platform);
        debug!(
            from = entry_name,
            to = %rewritten,
            "Rewrote platform placeholder in entry name"
        );
        rewritten
    } else {
        entry_name.to_string()
    }
}

/// Join an archive-internal relative name onto the extraction root.
///
/// The name is normalized lexically: `.` segments are dropped and `..`
/// segments consume the preceding segment. A name that is absolute, carries
/// a drive-letter prefix, or climbs above the root fails with
/// [`RunletError::PathTraversal`]. The returned path is always a descendant
/// of `root` (or `root` itself for an empty name).
pub fn safe_join(root: &Path, entry_name: &str) -> Result<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(seg) => parts.push(seg),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(RunletError::PathTraversal {
                        entry: entry_name.to_string(),
                    });
                }
            }
            // Absolute or drive-letter-prefixed names never resolve inside
            // the root, on any platform.
            Component::RootDir | Component::Prefix(_) => {
                return Err(RunletError::PathTraversal {
                    entry: entry_name.to_string(),
                });
            }
        }
    }

    let mut joined = root.to_path_buf();
    for seg in parts {
        joined.push(seg);
    }
    debug_assert!(joined.starts_with(root));
    Ok(joined)
}
