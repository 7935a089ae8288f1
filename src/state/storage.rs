// File system operations for the output directory and composition files
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Output path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Create the output directory if needed (idempotent)
pub fn ensure_output_dir(dir: &Path) -> StorageResult<PathBuf> {
    if dir.exists() && !dir.is_dir() {
        return Err(StorageError::NotADirectory(dir.to_path_buf()));
    }
    fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

/// Store a file in the output directory and return its path and SHA256 hash
pub fn store_file(dir: &Path, filename: &str, data: &[u8]) -> StorageResult<(PathBuf, String)> {
    let file_path = dir.join(filename);
    let mut file = fs::File::create(&file_path)?;
    file.write_all(data)?;
    file.flush()?;

    Ok((file_path, calculate_sha256(data)))
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Make a genre label safe to use in a file name
///
/// Keeps ASCII letters, digits, `-` and `_`; anything else becomes `_`.
pub fn sanitize_file_stem(label: &str) -> String {
    let stem: String = label
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if stem.is_empty() {
        "composition".to_string()
    } else {
        stem
    }
}
