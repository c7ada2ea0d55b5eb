//! License file replacement inside a local clone

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{LicenseText, LocalRepository};

/// Extensionless license filename; always the write target
pub const CANONICAL_LICENSE_FILE: &str = "LICENSE";

/// Existing license files to replace, highest priority first. The first one
/// present is removed before the canonical file is written.
pub const LICENSE_CANDIDATES: [&str; 3] = ["LICENSE.md", "LICENSE.txt", CANONICAL_LICENSE_FILE];

#[cfg(unix)]
const LICENSE_FILE_MODE: u32 = 0o644;

/// Find the license file currently in `dir`, falling back to the canonical
/// name when none exists
pub fn resolve_license_file(dir: &Path) -> PathBuf {
    LICENSE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
        .unwrap_or_else(|| dir.join(CANONICAL_LICENSE_FILE))
}

/// Replace the repository's license with `text`, returning the written path.
///
/// The resolved file is deleted before the canonical file is written so no
/// stale content survives in the canonical file.
pub fn apply_license(local: &LocalRepository, text: &LicenseText) -> Result<PathBuf> {
    let existing = resolve_license_file(&local.path);
    let target = local.path.join(CANONICAL_LICENSE_FILE);

    if existing.exists() {
        tracing::debug!("Removing existing license {}", existing.display());
        std::fs::remove_file(&existing)?;
    }

    std::fs::write(&target, &text.body)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(LICENSE_FILE_MODE))?;
    }

    tracing::info!("Wrote {} in {}", CANONICAL_LICENSE_FILE, local.name);
    Ok(target)
}
