// State management module
// Handles the output directory, composition files and run manifests

pub mod models;
pub mod storage;

pub use models::{CompositionRecord, RunManifest, MANIFEST_FILE_NAME};
pub use storage::{calculate_sha256, ensure_output_dir, sanitize_file_stem, store_file, StorageError};
