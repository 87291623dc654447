use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Replace the original file with the freshly encoded temporary output.
///
/// This single rename is the commit point: everything before it is
/// reversible, and once it succeeds the temporary output no longer exists
/// under its own name.
pub fn atomic_replace(original: &Path, new: &Path) -> Result<()> {
    if !new.exists() {
        anyhow::bail!("temporary output does not exist: {}", new.display());
    }

    fs::rename(new, original).with_context(|| {
        format!(
            "failed to rename {} over {}",
            new.display(),
            original.display()
        )
    })
}
