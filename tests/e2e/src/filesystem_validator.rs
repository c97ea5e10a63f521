use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Every uploaded file sits directly under the data dir with the sent bytes
pub fn validate_upload(server_data_dir: &Path, files: &[(String, Vec<u8>)]) -> Result<()> {
    for (name, expected) in files {
        let path = server_data_dir.join(name);
        if !path.is_file() {
            anyhow::bail!("Uploaded file does not exist: {:?}", path);
        }

        let content = fs::read(&path).with_context(|| format!("Failed to read file: {:?}", path))?;
        if &content != expected {
            anyhow::bail!(
                "Stored content of {} differs ({} bytes, expected {})",
                name,
                content.len(),
                expected.len()
            );
        }
    }

    println!("  ✓ All {} files exist with the uploaded content", files.len());
    Ok(())
}

/// Nothing left behind by finished uploads
pub fn validate_no_staging_leftovers(server_data_dir: &Path) -> Result<()> {
    let staging_dir = server_data_dir.join(".staging");
    if !staging_dir.exists() {
        println!("  ⚠ Staging directory does not exist: {:?}", staging_dir);
        return Ok(());
    }

    let leftovers = fs::read_dir(&staging_dir)
        .with_context(|| format!("Failed to read staging directory {:?}", staging_dir))?
        .count();
    if leftovers != 0 {
        anyhow::bail!("{} staged uploads left in {:?}", leftovers, staging_dir);
    }

    println!("  ✓ Staging directory is empty");
    Ok(())
}

pub fn validate_deleted(server_data_dir: &Path, name: &str) -> Result<()> {
    let path = server_data_dir.join(name);
    if path.exists() {
        anyhow::bail!("Deleted file still exists: {:?}", path);
    }

    println!("  ✓ {} removed from disk", name);
    Ok(())
}
