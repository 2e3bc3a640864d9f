use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::course::ImageRef;

pub const MAX_THUMBNAIL_BYTES: usize = 5 * 1024 * 1024;
const THUMBNAIL_EXTS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Checks an uploaded course file and returns its text. Accepts `.txt` files
/// or anything sent as `text/plain`.
pub fn read_import_file(
    file_name: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
    max_bytes: usize,
) -> Result<String> {
    if data.len() > max_bytes {
        return Err(Error::PayloadTooLarge(format!(
            "Course files are limited to {} bytes",
            max_bytes
        )));
    }

    let is_txt = file_name.and_then(extension).as_deref() == Some("txt");
    let is_plain = content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("text/plain"))
        .unwrap_or(false);
    if !is_txt && !is_plain {
        return Err(Error::UnsupportedMediaType(
            "Course files must be .txt (text/plain)".to_string(),
        ));
    }

    let text = std::str::from_utf8(data)
        .map_err(|_| Error::BadRequest("Course file is not valid UTF-8 text".to_string()))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Stores uploaded images under `<root>/thumbnails`.
#[derive(Clone, Debug)]
pub struct UploadService {
    root: PathBuf,
}

impl UploadService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn save_thumbnail(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<ImageRef> {
        if data.is_empty() {
            return Err(Error::BadRequest("Thumbnail file is empty".into()));
        }
        if data.len() > MAX_THUMBNAIL_BYTES {
            return Err(Error::PayloadTooLarge(format!(
                "Thumbnails are limited to {} bytes",
                MAX_THUMBNAIL_BYTES
            )));
        }

        let ext = extension(file_name).unwrap_or_default();
        if !THUMBNAIL_EXTS.contains(&ext.as_str()) {
            return Err(Error::UnsupportedMediaType(format!(
                "Thumbnail type .{} is not allowed",
                ext
            )));
        }
        let (valid, mime) = match ext.as_str() {
            "jpg" | "jpeg" => (data.starts_with(&[0xFF, 0xD8]), "image/jpeg"),
            "png" => (data.starts_with(&[0x89, 0x50, 0x4E, 0x47]), "image/png"),
            _ => (
                data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP",
                "image/webp",
            ),
        };
        if !valid {
            return Err(Error::BadRequest(format!("Invalid .{} file content", ext)));
        }

        let dir = self.root.join("thumbnails");
        fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.{}", Uuid::new_v4(), ext));
        fs::write(&path, data).await.map_err(|e| {
            tracing::error!("Failed to write thumbnail: {}", e);
            Error::Internal(format!("Failed to save file: {}", e))
        })?;

        Ok(ImageRef {
            file_name: file_name.to_string(),
            content_type: content_type
                .filter(|ct| ct.starts_with("image/"))
                .unwrap_or(mime)
                .to_string(),
            path: path.to_string_lossy().into_owned(),
            size_bytes: data.len() as u64,
        })
    }

    pub async fn read(&self, image: &ImageRef) -> Result<Vec<u8>> {
        Ok(fs::read(&image.path).await?)
    }

    /// Best effort; a missing file is not an error.
    pub async fn remove(&self, image: &ImageRef) {
        if let Err(e) = fs::remove_file(&image.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove old thumbnail {}: {}", image.path, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn accepts_txt_by_extension_or_media_type() {
        assert_eq!(
            read_import_file(Some("course.TXT"), None, b"TITLE = A", 100).unwrap(),
            "TITLE = A"
        );
        assert!(read_import_file(Some("course"), Some("text/plain; charset=utf-8"), b"x", 100).is_ok());
        assert!(matches!(
            read_import_file(Some("course.pdf"), Some("application/pdf"), b"x", 100),
            Err(Error::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn rejects_oversized_and_binary_files() {
        assert!(matches!(
            read_import_file(Some("a.txt"), None, &[b'a'; 11], 10),
            Err(Error::PayloadTooLarge(_))
        ));
        assert!(matches!(
            read_import_file(Some("a.txt"), None, &[0xFF, 0xFE, 0x00], 10),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn strips_byte_order_mark() {
        let text = read_import_file(Some("a.txt"), None, "\u{feff}TITLE = A".as_bytes(), 100).unwrap();
        assert_eq!(text, "TITLE = A");
    }

    #[tokio::test]
    async fn saves_png_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadService::new(dir.path());
        let image = uploads.save_thumbnail("cover.png", None, PNG).await.unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.size_bytes, PNG.len() as u64);
        assert_eq!(uploads.read(&image).await.unwrap(), PNG);

        uploads.remove(&image).await;
        assert!(uploads.read(&image).await.is_err());
    }

    #[tokio::test]
    async fn rejects_mismatched_image_content() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadService::new(dir.path());
        assert!(matches!(
            uploads.save_thumbnail("cover.jpg", Some("image/jpeg"), PNG).await,
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            uploads.save_thumbnail("cover.gif", None, PNG).await,
            Err(Error::UnsupportedMediaType(_))
        ));
    }
}
