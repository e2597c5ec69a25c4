// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::{ops::Deref, path::{Path, PathBuf}};

use miette::IntoDiagnostic;

#[derive(Debug)]
pub struct TempDir {
    pub path: PathBuf,
}

/// Create a temporary directory. The directory is automatically deleted when the
/// [`TempDir`] struct is dropped.
///
/// # Errors
///
/// Returns an error if the directory can't be created.
pub fn try_create_temp_dir() -> miette::Result<TempDir> {
    let root = std::env::temp_dir();
    let new_temp_dir = root.join(format!("error_monitor_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir(&new_temp_dir).into_diagnostic()?;
    Ok(TempDir { path: new_temp_dir })
}

impl Deref for TempDir {
    type Target = Path;

    fn deref(&self) -> &Self::Target { &self.path }
}

impl Drop for TempDir {
    // A leftover folder in the OS temp dir is not worth a panic in drop.
    fn drop(&mut self) { let _ = std::fs::remove_dir_all(&self.path); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir() {
        let temp_dir = try_create_temp_dir().unwrap();
        assert!(temp_dir.exists());
        assert!(temp_dir.join("conformance.log").starts_with(&temp_dir.path));
    }

    #[test]
    fn test_temp_dir_drop() {
        let temp_dir = try_create_temp_dir().unwrap();
        let copy_of_path = temp_dir.path.clone();

        drop(temp_dir);

        assert!(!copy_of_path.exists());
    }
}
