//! 入力画像の取得
//!
//! ファイルパス（拡張子から形式を判定）または base64 文字列から画像を読み込む。
//! 失敗はリクエスト全体の致命的エラーで、エンジンは呼ばれない。

use crate::error::{Result, WellBomError};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::DynamicImage;
use std::path::Path;

/// 対応拡張子と content type
pub const SUPPORTED_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("webp", "image/webp"),
];

/// 拡張子から content type を判定（大文字小文字は区別しない）
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    SUPPORTED_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, content_type)| *content_type)
}

/// 読み込み済みのスキーム画像
#[derive(Debug, Clone)]
pub struct SchemeImage {
    /// 表示用の出所（ファイル名または "base64"）
    pub source: String,
    /// 元のバイト列（キャッシュキーに使用）
    pub bytes: Vec<u8>,
    pub image: DynamicImage,
}

impl SchemeImage {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(WellBomError::FileNotFound(path.display().to_string()));
        }
        if content_type_for(path).is_none() {
            return Err(WellBomError::UnsupportedContentType(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(source, bytes)
    }

    /// base64 文字列から読み込む（前後の空白・改行は無視）
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let compact: String = encoded.split_whitespace().collect();
        // data URL 形式 (data:image/png;base64,....) にも対応
        let payload = match compact.split_once(',') {
            Some((header, data)) if header.starts_with("data:") => data,
            _ => compact.as_str(),
        };
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| WellBomError::ImageDecode(format!("base64: {}", e)))?;
        Self::from_bytes("base64".to_string(), bytes)
    }

    pub fn from_bytes(source: String, bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(WellBomError::EmptyImage);
        }
        let image = image::load_from_memory(&bytes)
            .map_err(|e| WellBomError::ImageDecode(format!("{}: {}", source, e)))?;

        tracing::info!(source = %source, width = image.width(), height = image.height(), "画像を読み込み");

        Ok(Self { source, bytes, image })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for(Path::new("a.JPG")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("a.tiff")), Some("image/tiff"));
        assert_eq!(content_type_for(Path::new("a.gif")), None);
        assert_eq!(content_type_for(Path::new("noext")), None);
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scheme.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let image = SchemeImage::from_path(&path).unwrap();
        assert_eq!(image.source, "scheme.png");
        assert_eq!(image.image.width(), 4);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scheme.gif");
        std::fs::write(&path, png_bytes()).unwrap();
        assert!(matches!(
            SchemeImage::from_path(&path),
            Err(WellBomError::UnsupportedContentType(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SchemeImage::from_path(Path::new("/nonexistent/scheme.png")),
            Err(WellBomError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_empty_and_corrupt_bytes() {
        assert!(matches!(
            SchemeImage::from_bytes("x".into(), Vec::new()),
            Err(WellBomError::EmptyImage)
        ));
        assert!(matches!(
            SchemeImage::from_bytes("x".into(), b"not an image".to_vec()),
            Err(WellBomError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_from_base64() {
        let encoded = STANDARD.encode(png_bytes());
        let image = SchemeImage::from_base64(&encoded).unwrap();
        assert_eq!(image.source, "base64");

        let data_url = format!("data:image/png;base64,{}\n", encoded);
        assert!(SchemeImage::from_base64(&data_url).is_ok());

        assert!(matches!(
            SchemeImage::from_base64("@@@"),
            Err(WellBomError::ImageDecode(_))
        ));
        assert!(matches!(SchemeImage::from_base64(""), Err(WellBomError::EmptyImage)));
    }
}
