//! Image I/O operations service
//!
//! This module separates file I/O operations from the widget workflow,
//! making the controller testable without touching the file system.

use crate::{
    error::{BgRemovalError, Result},
    types::{ProcessedImage, SourceImage},
};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Service for reading selected files and saving results
pub struct ImageIOService;

impl ImageIOService {
    /// Read a selected file into a `SourceImage`
    ///
    /// No content validation is done here: a file that is not an image is
    /// loaded as-is and fails later at preview or at the remote call.
    ///
    /// # Examples
    /// ```rust,no_run
    /// use bgremove_remote::services::ImageIOService;
    ///
    /// let source = ImageIOService::load_source("portrait.jpg")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    ///
    /// # Errors
    /// - The file does not exist or cannot be read
    pub fn load_source<P: AsRef<Path>>(path: P) -> Result<SourceImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(BgRemovalError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        let data = std::fs::read(path_ref)
            .map_err(|e| BgRemovalError::file_io_error("read image data", path_ref, &e))?;
        log::debug!("Loaded {} bytes from {}", data.len(), path_ref.display());

        Ok(SourceImage::new(data, file_name_of(path_ref)))
    }

    /// Async variant of [`ImageIOService::load_source`]
    ///
    /// # Errors
    /// - The file does not exist or cannot be read
    pub async fn load_source_async<P: AsRef<Path>>(path: P) -> Result<SourceImage> {
        let path_ref = path.as_ref();
        let data = tokio::fs::read(path_ref)
            .await
            .map_err(|e| BgRemovalError::file_io_error("read image data", path_ref, &e))?;
        log::debug!("Loaded {} bytes from {}", data.len(), path_ref.display());

        Ok(SourceImage::new(data, file_name_of(path_ref)))
    }

    /// Save a processed image under `dir/file_name`
    ///
    /// The bytes go to a temporary file in the same directory first and are
    /// then renamed into place, so a partially written result never appears
    /// under the final name. An existing file is replaced.
    ///
    /// # Errors
    /// - The directory cannot be created
    /// - The file cannot be written or moved into place
    pub fn save_result<P: AsRef<Path>>(
        image: &ProcessedImage,
        dir: P,
        file_name: &str,
    ) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| BgRemovalError::file_io_error("create download directory", dir, &e))?;

        let target = dir.join(file_name);
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| BgRemovalError::file_io_error("create temporary file in", dir, &e))?;
        temp.write_all(image.as_bytes())
            .and_then(|()| temp.flush())
            .map_err(|e| BgRemovalError::file_io_error("write downloaded result", &target, &e))?;
        temp.persist(&target).map_err(|e| {
            BgRemovalError::file_io_error("move downloaded result to", &target, &e.error)
        })?;

        log::info!(
            "Saved {} bytes to {}",
            image.len(),
            target.display()
        );
        Ok(target)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_source_reads_bytes_and_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cat.webp");
        std::fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let source = ImageIOService::load_source(&path).unwrap();
        assert_eq!(source.as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(source.file_name(), "cat.webp");
        assert_eq!(source.mime_type(), "image/webp");
    }

    #[test]
    fn test_load_source_accepts_non_image() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("readme.txt");
        std::fs::write(&path, "hello").unwrap();

        let source = ImageIOService::load_source(&path).unwrap();
        assert_eq!(source.len(), 5);
        assert!(source.preview().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = ImageIOService::load_source("/definitely/not/here.png").unwrap_err();
        assert!(err.to_string().contains("read image file"));
    }

    #[tokio::test]
    async fn test_load_source_async() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dog.png");
        std::fs::write(&path, [7u8; 16]).unwrap();

        let source = ImageIOService::load_source_async(&path).await.unwrap();
        assert_eq!(source.len(), 16);
        assert_eq!(source.mime_type(), "image/png");
    }

    #[test]
    fn test_save_result_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("downloads");

        let first = ProcessedImage::new(vec![1u8, 1, 1], None);
        let path = ImageIOService::save_result(&first, &nested, "removed-background.png").unwrap();
        assert_eq!(path, nested.join("removed-background.png"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 1, 1]);

        let second = ProcessedImage::new(vec![2u8, 2], None);
        ImageIOService::save_result(&second, &nested, "removed-background.png").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![2, 2]);

        let entries = std::fs::read_dir(&nested).unwrap().count();
        assert_eq!(entries, 1);
    }
}
