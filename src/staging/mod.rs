//! Image staging
//!
//! Copies the picked or captured image into a cache directory before it is
//! uploaded, so the upload reads from a stable local file rather than from
//! wherever the image originally came from.

pub mod mime;

pub use mime::detect_image_mime;

use crate::models::{ImageSource, FALLBACK_FILENAME};
use crate::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name a camera capture is written to. Each capture replaces the last.
pub const CAPTURE_FILENAME: &str = "captured_image.jpg";

const CAPTURE_JPEG_QUALITY: u8 = 100;

pub struct ImageStager {
    cache_dir: PathBuf,
}

impl ImageStager {
    pub fn new(cache_dir: &Path) -> Result<Self> {
        fs::create_dir_all(cache_dir)?;
        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Copy a picked file into the cache under its display name.
    ///
    /// A file that already is the staged copy is used as is. Otherwise the
    /// copy goes through a temporary name so the target is never observed
    /// half-written.
    pub async fn stage_file(&self, source: &Path, display_name: Option<&str>) -> Result<ImageSource> {
        let name = display_name
            .map(str::to_string)
            .or_else(|| {
                source
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            });
        let target = self.target_path(name.as_deref());

        if is_same_file(source, &target).await? {
            tracing::info!("{} is already staged", source.display());
            return Ok(ImageSource::from_path(source));
        }

        let partial = self.cache_dir.join(format!(".{}.part", Uuid::new_v4()));
        if let Err(e) = tokio::fs::copy(source, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        tokio::fs::rename(&partial, &target).await?;
        tracing::info!("Staged {} as {}", source.display(), target.display());

        Ok(ImageSource::from_path(target))
    }

    /// Write an in-memory image stream into the cache.
    pub async fn stage_bytes(&self, bytes: &[u8], display_name: Option<&str>) -> Result<ImageSource> {
        let target = self.target_path(display_name);

        tokio::fs::write(&target, bytes).await?;
        tracing::info!("Staged {} bytes as {}", bytes.len(), target.display());

        Ok(ImageSource::from_path(target))
    }

    /// Encode a captured frame as a full-quality JPEG.
    pub async fn stage_capture(&self, capture: DynamicImage) -> Result<ImageSource> {
        let target = self.cache_dir.join(CAPTURE_FILENAME);

        tokio::task::spawn_blocking({
            let target = target.clone();
            move || write_jpeg(&capture, &target)
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("Capture encoding task failed: {}", e))))??;

        tracing::info!("Saved capture to {}", target.display());
        Ok(ImageSource::from_path(target).with_content_type("image/jpeg"))
    }

    fn target_path(&self, display_name: Option<&str>) -> PathBuf {
        self.cache_dir.join(sanitize_filename(display_name))
    }
}

async fn is_same_file(source: &Path, target: &Path) -> Result<bool> {
    let source = tokio::fs::canonicalize(source).await?;
    match tokio::fs::canonicalize(target).await {
        Ok(target) => Ok(source == target),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn write_jpeg(image: &DynamicImage, path: &Path) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();
    JpegEncoder::new_with_quality(&mut writer, CAPTURE_JPEG_QUALITY).encode_image(&rgb)?;
    writer.flush()?;
    Ok(())
}

/// Keep only the final path component of a reported display name.
fn sanitize_filename(display_name: Option<&str>) -> String {
    display_name
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_FILENAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageData;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const JPEG_BYTES: [u8; 10] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

    fn staged_path(source: &ImageSource) -> PathBuf {
        match source.data() {
            ImageData::File(path) => path.clone(),
            other => panic!("expected a file source, got {:?}", other),
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(Some("photo.jpg")), "photo.jpg");
        assert_eq!(sanitize_filename(Some("../../etc/passwd")), "passwd");
        assert_eq!(sanitize_filename(Some(r"C:\Users\me\pic.png")), "pic.png");
        assert_eq!(sanitize_filename(Some("..")), "temp_image");
        assert_eq!(sanitize_filename(Some("  ")), "temp_image");
        assert_eq!(sanitize_filename(None), "temp_image");
    }

    #[tokio::test]
    async fn test_stage_file_copies_under_display_name() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("IMG_0001.jpg");
        fs::write(&original, b"jpeg bytes").unwrap();

        let stager = ImageStager::new(&dir.path().join("cache")).unwrap();
        let staged = stager.stage_file(&original, Some("holiday.jpg")).await.unwrap();

        assert_eq!(staged.filename(), "holiday.jpg");
        let path = staged_path(&staged);
        assert!(path.starts_with(stager.cache_dir()));
        assert_eq!(fs::read(path).unwrap(), b"jpeg bytes".to_vec());
    }

    #[tokio::test]
    async fn test_stage_file_defaults_to_source_name() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("IMG_0002.png");
        fs::write(&original, b"png").unwrap();

        let stager = ImageStager::new(&dir.path().join("cache")).unwrap();
        let staged = stager.stage_file(&original, None).await.unwrap();
        assert_eq!(staged.filename(), "IMG_0002.png");
    }

    #[tokio::test]
    async fn test_stage_file_already_in_cache_keeps_contents() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("photo.jpg");
        fs::write(&photo, JPEG_BYTES).unwrap();

        let stager = ImageStager::new(dir.path()).unwrap();
        let staged = stager.stage_file(&photo, None).await.unwrap();

        assert_eq!(staged.filename(), "photo.jpg");
        assert_eq!(staged.read_bytes().await.unwrap(), JPEG_BYTES.to_vec());
        assert_eq!(fs::read(&photo).unwrap(), JPEG_BYTES.to_vec());
    }

    #[tokio::test]
    async fn test_restaging_a_capture_keeps_contents() {
        let dir = TempDir::new().unwrap();
        let stager = ImageStager::new(dir.path()).unwrap();
        let frame = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3])));

        let capture = stager.stage_capture(frame).await.unwrap();
        let captured = capture.read_bytes().await.unwrap();
        assert!(!captured.is_empty());

        let restaged = stager
            .stage_file(&staged_path(&capture), None)
            .await
            .unwrap();
        assert_eq!(restaged.read_bytes().await.unwrap(), captured);
    }

    #[tokio::test]
    async fn test_stage_file_leaves_no_partial_files() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("IMG_0003.jpg");
        fs::write(&original, JPEG_BYTES).unwrap();

        let cache = dir.path().join("cache");
        let stager = ImageStager::new(&cache).unwrap();
        stager.stage_file(&original, None).await.unwrap();
        stager.stage_file(&original, None).await.unwrap();

        let entries: Vec<String> = fs::read_dir(&cache)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["IMG_0003.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_stage_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let stager = ImageStager::new(dir.path()).unwrap();

        let result = stager.stage_file(&dir.path().join("gone.jpg"), None).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_stage_bytes_without_name_uses_fallback() {
        let dir = TempDir::new().unwrap();
        let stager = ImageStager::new(dir.path()).unwrap();

        let staged = stager.stage_bytes(&[1, 2, 3], None).await.unwrap();
        assert_eq!(staged.filename(), "temp_image");
        assert_eq!(staged.read_bytes().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stage_capture_writes_jpeg() {
        let dir = TempDir::new().unwrap();
        let stager = ImageStager::new(dir.path()).unwrap();
        let frame = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            16,
            12,
            image::Rgba([10, 200, 30, 255]),
        ));

        let staged = stager.stage_capture(frame).await.unwrap();
        assert_eq!(staged.filename(), CAPTURE_FILENAME);
        assert_eq!(staged.content_type(), "image/jpeg");

        let bytes = staged.read_bytes().await.unwrap();
        assert_eq!(detect_image_mime(&bytes), Some("image/jpeg"));

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }
}
