//! Storage and File System Abstractions
//!
//! Platform-agnostic file I/O used by the disk cache tier.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts file I/O operations to support different platforms:
/// - Desktop: Direct filesystem access
/// - iOS: Sandboxed app directories (Caches / Application Support)
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn cache_data(fs: &dyn FileSystemAccess, data: &[u8]) -> Result<()> {
///     let cache_dir = fs.get_cache_directory().await?;
///     let file_path = cache_dir.join("data.bin");
///     fs.write_file(&file_path, Bytes::copy_from_slice(data)).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Get the application's persistent cache directory
    async fn get_cache_directory(&self) -> Result<PathBuf>;

    /// Get the application's data directory
    async fn get_data_directory(&self) -> Result<PathBuf>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating or truncating it
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Rename a file, replacing the destination if it exists
    ///
    /// Implementations must make the replacement atomic where the platform
    /// allows it; the disk cache relies on this to publish complete files.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Delete a directory and all its contents
    async fn delete_dir_all(&self, path: &Path) -> Result<()>;

    /// List all entries in a directory
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Calculate total size of a directory recursively
    async fn directory_size(&self, path: &Path) -> Result<u64> {
        let mut total = 0u64;
        let entries = self.list_directory(path).await?;

        for entry in entries {
            let metadata = self.metadata(&entry).await?;
            if metadata.is_directory {
                total += self.directory_size(&entry).await?;
            } else {
                total += metadata.size;
            }
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Flat in-memory file system; directories are implied by path prefixes.
    #[derive(Default)]
    struct MemoryFs {
        files: Mutex<HashMap<PathBuf, Bytes>>,
    }

    #[async_trait]
    impl FileSystemAccess for MemoryFs {
        async fn get_cache_directory(&self) -> Result<PathBuf> {
            Ok(PathBuf::from("/cache"))
        }

        async fn get_data_directory(&self) -> Result<PathBuf> {
            Ok(PathBuf::from("/data"))
        }

        async fn exists(&self, path: &Path) -> Result<bool> {
            Ok(self.files.lock().unwrap().contains_key(path))
        }

        async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
            let files = self.files.lock().unwrap();
            match files.get(path) {
                Some(data) => Ok(FileMetadata {
                    size: data.len() as u64,
                    created_at: None,
                    modified_at: None,
                    is_directory: false,
                }),
                None => Ok(FileMetadata {
                    size: 0,
                    created_at: None,
                    modified_at: None,
                    is_directory: true,
                }),
            }
        }

        async fn create_dir_all(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        async fn read_file(&self, path: &Path) -> Result<Bytes> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound).into())
        }

        async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
            self.files.lock().unwrap().insert(path.to_path_buf(), data);
            Ok(())
        }

        async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
            let mut files = self.files.lock().unwrap();
            let data = files
                .remove(from)
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
            files.insert(to.to_path_buf(), data);
            Ok(())
        }

        async fn delete_file(&self, path: &Path) -> Result<()> {
            self.files.lock().unwrap().remove(path);
            Ok(())
        }

        async fn delete_dir_all(&self, path: &Path) -> Result<()> {
            self.files.lock().unwrap().retain(|p, _| !p.starts_with(path));
            Ok(())
        }

        async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
            let files = self.files.lock().unwrap();
            let mut entries: Vec<PathBuf> = Vec::new();
            for file in files.keys() {
                if let Ok(rest) = file.strip_prefix(path) {
                    if let Some(first) = rest.components().next() {
                        let child = path.join(first);
                        if !entries.contains(&child) {
                            entries.push(child);
                        }
                    }
                }
            }
            Ok(entries)
        }
    }

    #[core_async::test]
    async fn test_directory_size_recurses() {
        let fs = MemoryFs::default();
        fs.write_file(Path::new("/cache/a.json"), Bytes::from_static(b"12345"))
            .await
            .unwrap();
        fs.write_file(Path::new("/cache/sub/b.json"), Bytes::from_static(b"123"))
            .await
            .unwrap();

        let size = fs.directory_size(Path::new("/cache")).await.unwrap();
        assert_eq!(size, 8);
    }

    #[core_async::test]
    async fn test_rename_replaces_destination() {
        let fs = MemoryFs::default();
        fs.write_file(Path::new("/cache/x.tmp"), Bytes::from_static(b"new"))
            .await
            .unwrap();
        fs.write_file(Path::new("/cache/x.json"), Bytes::from_static(b"old"))
            .await
            .unwrap();

        fs.rename(Path::new("/cache/x.tmp"), Path::new("/cache/x.json"))
            .await
            .unwrap();

        assert!(!fs.exists(Path::new("/cache/x.tmp")).await.unwrap());
        assert_eq!(
            fs.read_file(Path::new("/cache/x.json")).await.unwrap(),
            Bytes::from_static(b"new")
        );
    }
}
