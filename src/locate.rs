//! Discovery of the managed-runtime component files after extraction.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, RunletError};

/// Naming-convention prefix of the runtime core component.
pub const CORE_PREFIX: &str = "runtime-core";

/// Naming-convention prefix of the runtime standard-library component.
pub const STDLIB_PREFIX: &str = "runtime-stdlib";

/// The two runtime component files found at the scratch root.
#[derive(Debug, Clone)]
pub struct RuntimeComponents {
    pub core: PathBuf,
    pub stdlib: PathBuf,
}

/// Finds runtime components in the scratch directory by `(prefix, suffix)`
/// naming convention.
///
/// The immediate directory listing is scanned once, sorted lexically. If
/// several files match a pattern the lexically-first one wins; this
/// tie-break is a fixed contract, not an accident of listing order.
pub struct RuntimeLocator<'a> {
    core_prefix: &'a str,
    stdlib_prefix: &'a str,
    suffix: &'a str,
}

impl<'a> RuntimeLocator<'a> {
    pub fn new(core_prefix: &'a str, stdlib_prefix: &'a str, suffix: &'a str) -> Self {
        Self {
            core_prefix,
            stdlib_prefix,
            suffix,
        }
    }

    /// Locator with the conventional component prefixes and the given
    /// file-name suffix (which differs by invocation strategy).
    pub fn with_suffix(suffix: &'a str) -> Self {
        Self::new(CORE_PREFIX, STDLIB_PREFIX, suffix)
    }

    /// Return exactly one core and one stdlib component from `dir`.
    pub fn locate(&self, dir: &Path) -> Result<RuntimeComponents> {
        let mut names: Vec<(String, PathBuf)> = Vec::new();
        for dirent in std::fs::read_dir(dir)? {
            let dirent = dirent?;
            if !dirent.file_type()?.is_file() {
                continue;
            }
            if let Ok(name) = dirent.file_name().into_string() {
                names.push((name, dirent.path()));
            }
        }
        names.sort();

        let core = self.first_match(&names, self.core_prefix, "core")?;
        let stdlib = self.first_match(&names, self.stdlib_prefix, "stdlib")?;

        debug!(core = %core.display(), stdlib = %stdlib.display(), "Located runtime components");
        Ok(RuntimeComponents { core, stdlib })
    }

    fn first_match(
        &self,
        names: &[(String, PathBuf)],
        prefix: &str,
        component: &str,
    ) -> Result<PathBuf> {
        names
            .iter()
            .find(|(name, _)| name.starts_with(prefix) && name.ends_with(self.suffix))
            .map(|(_, path)| path.clone())
            .ok_or_else(|| RunletError::MissingComponent {
                component: component.to_string(),
            })
    }
}
