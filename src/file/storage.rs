//! File storage for Filebox.
//!
//! Files live in two flat sibling directories:
//! ```text
//! {base_dir}/
//! ├── uploads/
//! │   ├── report.pdf
//! │   └── cat.png
//! └── thumbnails/
//!     └── cat.png
//! ```
//! A thumbnail always carries the name of the stored file it was derived
//! from. Every operation that changes a name holds that name's lock.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::config::FilesConfig;
use crate::{FileboxError, Result};

use super::locks::NameLocks;
use super::name::{extension_of, validate_file_name};

/// A stored file as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// File name.
    pub name: String,
    /// Extension including the dot, empty if none.
    pub extension: String,
    /// Size in bytes.
    pub size: u64,
}

/// Outcome of a rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameOutcome {
    /// Whether a thumbnail was moved along with the file.
    pub thumbnail_moved: bool,
}

/// Outcome of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Whether a thumbnail was removed along with the file.
    pub thumbnail_removed: bool,
}

/// Directory under the uploads directory holding partially written files.
const STAGING_DIR: &str = ".staging";

/// Storage over the uploads and thumbnails directories.
#[derive(Debug)]
pub struct FileStorage {
    uploads_dir: PathBuf,
    thumbnails_dir: PathBuf,
    staging_dir: PathBuf,
    locks: NameLocks,
}

impl FileStorage {
    /// Open storage over the given directories, creating them if missing.
    ///
    /// Fails if either directory cannot be created.
    pub fn new(uploads_dir: impl Into<PathBuf>, thumbnails_dir: impl Into<PathBuf>) -> Result<Self> {
        let uploads_dir = uploads_dir.into();
        let thumbnails_dir = thumbnails_dir.into();
        let staging_dir = uploads_dir.join(STAGING_DIR);
        std::fs::create_dir_all(&staging_dir)?;
        std::fs::create_dir_all(&thumbnails_dir)?;

        Ok(Self {
            uploads_dir,
            thumbnails_dir,
            staging_dir,
            locks: NameLocks::new(),
        })
    }

    /// Open storage as described by the files configuration.
    pub fn from_config(config: &FilesConfig) -> Result<Self> {
        Self::new(config.uploads_path(), config.thumbnails_path())
    }

    /// Directory holding stored files.
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Directory holding thumbnails.
    pub fn thumbnails_dir(&self) -> &Path {
        &self.thumbnails_dir
    }

    /// Path of a stored file. The name is validated first.
    pub fn file_path(&self, name: &str) -> Result<PathBuf> {
        validate_file_name(name)?;
        if name == STAGING_DIR {
            return Err(FileboxError::InvalidName(format!(
                "'{name}' is reserved"
            )));
        }
        Ok(self.uploads_dir.join(name))
    }

    /// Path of a thumbnail. The name is validated first.
    pub fn thumbnail_path(&self, name: &str) -> Result<PathBuf> {
        validate_file_name(name)?;
        Ok(self.thumbnails_dir.join(name))
    }

    /// List stored files, sorted by name.
    ///
    /// Only regular files are listed. Directories and symbolic links are
    /// skipped and links are not followed.
    pub async fn list(&self) -> Result<Vec<StoredFile>> {
        let mut entries = fs::read_dir(&self.uploads_dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            // Entries deleted since `read_dir` are skipped
            let file_type = match skip_missing(entry.file_type().await)? {
                Some(file_type) => file_type,
                None => continue,
            };
            if !file_type.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::debug!(name = ?raw, "Skipping non UTF-8 file name");
                    continue;
                }
            };
            let size = match skip_missing(entry.metadata().await)? {
                Some(meta) => meta.len(),
                None => continue,
            };
            files.push(StoredFile {
                extension: extension_of(&name).to_string(),
                name,
                size,
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Check whether a stored file exists.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.file_path(name)?;
        is_regular_file(&path).await
    }

    /// Check whether a thumbnail exists.
    pub async fn thumbnail_exists(&self, name: &str) -> Result<bool> {
        let path = self.thumbnail_path(name)?;
        is_regular_file(&path).await
    }

    /// Store a file, replacing any file of the same name.
    ///
    /// The content is staged and renamed into place, so readers see either
    /// the old or the new file. With a thumbnail, it is written after the
    /// file; if that write fails the file is removed again. Without one,
    /// any thumbnail left from an earlier upload of the same name is
    /// removed, best effort.
    pub async fn save(&self, name: &str, content: &[u8], thumbnail: Option<&[u8]>) -> Result<()> {
        let path = self.file_path(name)?;
        let thumb_path = self.thumbnail_path(name)?;
        let _guard = self.locks.lock(name).await;

        self.write_staged(&path, content).await?;

        match thumbnail {
            Some(thumb) => {
                if let Err(e) = fs::write(&thumb_path, thumb).await {
                    tracing::error!(file = %name, error = %e, "Failed to write thumbnail");
                    if let Err(cleanup) = fs::remove_file(&path).await {
                        tracing::warn!(
                            file = %name,
                            error = %cleanup,
                            "Failed to remove file after thumbnail failure"
                        );
                    }
                    return Err(e.into());
                }
            }
            None => match remove_if_exists(&thumb_path).await {
                Ok(true) => tracing::debug!(file = %name, "Removed stale thumbnail"),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "Failed to remove stale thumbnail")
                }
            },
        }

        Ok(())
    }

    /// Write `content` to a staging file, then rename it over `target`.
    async fn write_staged(&self, target: &Path, content: &[u8]) -> Result<()> {
        let staged = self
            .staging_dir
            .join(format!("{}.part", uuid::Uuid::new_v4()));

        let result = match fs::write(&staged, content).await {
            Ok(()) => fs::rename(&staged, target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            if let Err(cleanup) = remove_if_exists(&staged).await {
                tracing::warn!(error = %cleanup, "Failed to remove staged upload");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Open a stored file for reading, returning the file and its size.
    pub async fn open(&self, name: &str) -> Result<(fs::File, u64)> {
        let path = self.file_path(name)?;
        if !is_regular_file(&path).await? {
            return Err(FileboxError::NotFound(format!("File '{name}'")));
        }
        let file = fs::File::open(&path).await?;
        let size = file.metadata().await?.len();
        Ok((file, size))
    }

    /// Load a thumbnail.
    pub async fn load_thumbnail(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.thumbnail_path(name)?;
        if !is_regular_file(&path).await? {
            return Err(FileboxError::NotFound(format!("Thumbnail '{name}'")));
        }
        Ok(fs::read(&path).await?)
    }

    /// Delete a stored file and its thumbnail.
    ///
    /// Fails with `NotFound` and deletes nothing if the file is missing.
    /// Thumbnail removal is best effort: a failure is logged and reported
    /// through the outcome.
    pub async fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        let path = self.file_path(name)?;
        let thumb_path = self.thumbnail_path(name)?;
        let _guard = self.locks.lock(name).await;

        if !is_regular_file(&path).await? {
            return Err(FileboxError::NotFound(format!("File '{name}'")));
        }
        fs::remove_file(&path).await?;

        let thumbnail_removed = match remove_if_exists(&thumb_path).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Failed to remove thumbnail");
                false
            }
        };

        Ok(DeleteOutcome { thumbnail_removed })
    }

    /// Rename a stored file and move its thumbnail along.
    ///
    /// Fails with `NotFound` if `old_name` is missing and with `Conflict`
    /// if `new_name` is taken. Moving the thumbnail is best effort; when it
    /// fails the old thumbnail is removed so it cannot describe a file it
    /// does not belong to.
    pub async fn rename(&self, old_name: &str, new_name: &str) -> Result<RenameOutcome> {
        let old_path = self.file_path(old_name)?;
        let new_path = self.file_path(new_name)?;
        let old_thumb = self.thumbnail_path(old_name)?;
        let new_thumb = self.thumbnail_path(new_name)?;

        if old_name == new_name {
            return Err(FileboxError::Validation(
                "old and new names are identical".to_string(),
            ));
        }

        let _guard = self.locks.lock_pair(old_name, new_name).await;

        if !is_regular_file(&old_path).await? {
            return Err(FileboxError::NotFound(format!("File '{old_name}'")));
        }
        if path_exists(&new_path).await? {
            return Err(FileboxError::Conflict(format!("File '{new_name}'")));
        }

        fs::rename(&old_path, &new_path).await?;

        if !is_regular_file(&old_thumb).await.unwrap_or(false) {
            // An orphaned thumbnail under the new name would now be
            // attributed to the renamed file.
            if let Err(e) = remove_if_exists(&new_thumb).await {
                tracing::warn!(file = %new_name, error = %e, "Failed to remove orphaned thumbnail");
            }
            return Ok(RenameOutcome {
                thumbnail_moved: false,
            });
        }

        match fs::rename(&old_thumb, &new_thumb).await {
            Ok(()) => Ok(RenameOutcome {
                thumbnail_moved: true,
            }),
            Err(e) => {
                tracing::warn!(
                    old = %old_name,
                    new = %new_name,
                    error = %e,
                    "Failed to move thumbnail, removing it"
                );
                if let Err(e) = remove_if_exists(&old_thumb).await {
                    tracing::warn!(file = %old_name, error = %e, "Failed to remove thumbnail");
                }
                Ok(RenameOutcome {
                    thumbnail_moved: false,
                })
            }
        }
    }
}

/// Whether `path` is a regular file. Symbolic links are not followed.
async fn is_regular_file(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path).await {
        Ok(meta) => Ok(meta.file_type().is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Whether anything exists at `path`.
async fn path_exists(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Map `NotFound` to `None`, passing other results through.
fn skip_missing<T>(result: io::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Remove a file, returning `false` if it did not exist.
async fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
