//! Write-then-rename helper so a save never leaves a half-written file in
//! place of a prior one (§6 "database snapshot", §4.1 cache round trip).

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;

pub struct PendingWrite {
    target: std::path::PathBuf,
    pub tmp: NamedTempFile,
}

pub fn open_for_atomic_write(target: &Path, force: bool) -> Result<PendingWrite> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent.display()))?;
    }
    if !force && target.exists() {
        bail!("refusing to overwrite existing file: {} (pass force=true to overwrite)", target.display());
    }
    let dir = target.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(dir).context("creating temp file for atomic write")?;
    Ok(PendingWrite { target: target.to_path_buf(), tmp })
}

pub fn finalize_atomic_write(pending: PendingWrite) -> Result<()> {
    pending.tmp.as_file().sync_all().ok();
    pending
        .tmp
        .persist(&pending.target)
        .with_context(|| format!("renaming temp file into place at {}", pending.target.display()))?;
    Ok(())
}
