use std::path::Path;

use crate::foundation::error::{GenError, GenResult};

/// Sum the sizes of all regular files at any depth below `dir`.
///
/// Symlinks are neither followed nor counted; directories contribute only their contents.
/// An empty directory yields 0.
#[tracing::instrument]
pub fn dir_size(dir: &Path) -> GenResult<u64> {
    let mut total = 0u64;
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current).map_err(|e| GenError::io(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| GenError::io(&current, e))?;
            let path = entry.path();
            // `DirEntry::file_type` does not traverse symlinks.
            let file_type = entry.file_type().map_err(|e| GenError::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                let meta = entry.metadata().map_err(|e| GenError::io(&path, e))?;
                total += meta.len();
            }
        }
    }

    Ok(total)
}
