// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Staging store for detector input files
//!
//! The detection model reads images from a path, so each detection request
//! writes its bytes to a uniquely named file first. A [`StagedImage`] owns
//! that file: `release()` deletes it and reports failures, and dropping the
//! handle deletes it on any path that skipped `release()`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use thiserror::Error;
use tracing::{debug, warn};

use crate::acquisition::RawImage;
use crate::vision::image_utils::format_to_extension;

const STAGED_PREFIX: &str = "ffd-";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Failed to create staging file in {dir}: {source}")]
    Create {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write staging file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove staging file {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Creates staged files inside one directory
#[derive(Debug, Clone)]
pub struct StagingStore {
    dir: PathBuf,
}

impl StagingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the OS temp directory
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `image` to a fresh, collision-free file
    ///
    /// The extension follows the sniffed format so the decoder on the other
    /// side picks the right codec. Unknown formats are staged as `.png`.
    pub fn stage(&self, image: RawImage) -> Result<StagedImage, StagingError> {
        let extension = image.format.map(format_to_extension).unwrap_or("png");
        let suffix = format!(".{}", extension);

        let mut file = Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(&suffix)
            .tempfile_in(&self.dir)
            .map_err(|source| StagingError::Create {
                dir: self.dir.clone(),
                source,
            })?;

        if let Err(source) = file.write_all(&image.bytes).and_then(|_| file.flush()) {
            let path = file.path().to_path_buf();
            // Dropping `file` removes the partial write
            return Err(StagingError::Write { path, source });
        }

        let path = file.into_temp_path();
        debug!("Staged {} bytes at {}", image.len(), path.display());

        Ok(StagedImage { path })
    }
}

/// An exclusively-owned staged file
#[derive(Debug)]
pub struct StagedImage {
    path: TempPath,
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the staged file
    pub fn release(self) -> Result<(), StagingError> {
        let path = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => {
                debug!("Released staged file {}", path.display());
                Ok(())
            }
            Err(source) => {
                warn!("Failed to release staged file {}: {}", path.display(), source);
                Err(StagingError::Remove { path, source })
            }
        }
    }
}
