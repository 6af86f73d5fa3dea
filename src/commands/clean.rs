//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::Press;

/// Clean the public directory and generation cache
pub fn run(press: &Press) -> Result<()> {
    for dir in [&press.public_dir, &press.cache_dir] {
        if dir.exists() {
            fs::remove_dir_all(dir)?;
            tracing::info!("Deleted: {:?}", dir);
        }
    }

    Ok(())
}
