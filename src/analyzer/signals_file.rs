//! 記録済み信号ファイル
//!
//! 外部モデルの出力を JSON (SchemeSignals) として保存したもので、4つのモデルを代替する。

use super::{ImageCaptioner, ObjectDetector, TextFragment, TextRecognizer, ZeroShotClassifier};
use crate::error::{Result, WellBomError};
use crate::preprocess::ImageVariant;
use crate::scanner::SchemeImage;
use std::path::{Path, PathBuf};
use well_bom_common::{CaptionResult, Detection, LabelScore, SchemeSignals};

/// 画像の隣に置く信号ファイルのパス（scheme.png → scheme.signals.json）
pub fn sidecar_path(image_path: &Path, suffix: &str) -> PathBuf {
    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    image_path.with_file_name(format!("{}{}", stem, suffix))
}

#[derive(Debug, Clone, Default)]
pub struct RecordedSignals {
    signals: SchemeSignals,
}

impl RecordedSignals {
    pub fn new(signals: SchemeSignals) -> Self {
        Self { signals }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(WellBomError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let signals: SchemeSignals = serde_json::from_str(&content)?;
        Ok(Self::new(signals))
    }

    pub fn signals(&self) -> &SchemeSignals {
        &self.signals
    }
}

impl TextRecognizer for RecordedSignals {
    /// 記録済みテキストは連結済みなので原画像に対してのみ返す
    fn recognize(&self, variant: &ImageVariant) -> Result<Vec<TextFragment>> {
        if !variant.is_original() || self.signals.ocr_text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![TextFragment::new(self.signals.ocr_text.clone(), None)])
    }
}

impl ImageCaptioner for RecordedSignals {
    fn caption(&self, _image: &SchemeImage, _questions: &[&str]) -> Result<CaptionResult> {
        Ok(self.signals.caption.clone())
    }
}

impl ZeroShotClassifier for RecordedSignals {
    fn classify(&self, _image: &SchemeImage, _labels: &[&str]) -> Result<Vec<LabelScore>> {
        Ok(self.signals.classifications.clone())
    }
}

impl ObjectDetector for RecordedSignals {
    /// 閾値以上の記録済み検出を返す
    fn detect(&self, _image: &SchemeImage, threshold: f64) -> Result<Vec<Detection>> {
        Ok(self
            .signals
            .detections
            .iter()
            .filter(|d| d.confidence >= threshold)
            .map(|d| Detection {
                threshold: Some(threshold),
                ..d.clone()
            })
            .collect())
    }
}
