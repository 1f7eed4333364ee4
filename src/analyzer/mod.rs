//! 外部モデル連携と検出パイプライン
//!
//! OCR・キャプション・ゼロショット分類・物体検出はそれぞれトレイト1つで抽象化し、
//! `MaterialDetector` に注入する。どれかが失敗しても空の結果に置き換えて続行する。

pub mod cache;
mod signals_file;
mod tesseract_cli;
mod types;

pub use cache::{compute_hash, CacheFile};
pub use signals_file::{sidecar_path, RecordedSignals};
pub use tesseract_cli::TesseractCli;
pub use types::{AnalysisResults, BatchItem, DetectionResponse, Outcome, ProcessingInfo, TextFragment};

use crate::config::Config;
use crate::error::{Result, WellBomError};
use crate::preprocess::{generate_variants, ImageVariant};
use crate::scanner::SchemeImage;
use std::path::Path;
use well_bom_common::taxonomy::{CAPTION_QUESTIONS, CLASSIFIER_LABELS};
use well_bom_common::{build_report, rank_classifications, CaptionResult, Detection, LabelScore, SchemeSignals};

/// 画像バリアントからテキスト断片を読み取る
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, variant: &ImageVariant) -> Result<Vec<TextFragment>>;
}

/// キャプションと固定質問への回答（回答は質問と同順）
pub trait ImageCaptioner: Send + Sync {
    fn caption(&self, image: &SchemeImage, questions: &[&str]) -> Result<CaptionResult>;
}

/// 固定ラベル語彙でのゼロショット分類
pub trait ZeroShotClassifier: Send + Sync {
    fn classify(&self, image: &SchemeImage, labels: &[&str]) -> Result<Vec<LabelScore>>;
}

/// 指定閾値での物体検出
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, image: &SchemeImage, threshold: f64) -> Result<Vec<Detection>>;
}

/// 設定されていない外部モデル（常に失敗）
#[derive(Debug, Clone, Copy)]
pub struct Unavailable(pub &'static str);

impl Unavailable {
    fn error(&self) -> WellBomError {
        WellBomError::Collaborator(format!("{} は利用できません", self.0))
    }
}

impl TextRecognizer for Unavailable {
    fn recognize(&self, _variant: &ImageVariant) -> Result<Vec<TextFragment>> {
        Err(self.error())
    }
}

impl ImageCaptioner for Unavailable {
    fn caption(&self, _image: &SchemeImage, _questions: &[&str]) -> Result<CaptionResult> {
        Err(self.error())
    }
}

impl ZeroShotClassifier for Unavailable {
    fn classify(&self, _image: &SchemeImage, _labels: &[&str]) -> Result<Vec<LabelScore>> {
        Err(self.error())
    }
}

impl ObjectDetector for Unavailable {
    fn detect(&self, _image: &SchemeImage, _threshold: f64) -> Result<Vec<Detection>> {
        Err(self.error())
    }
}

/// 外部モデル一式
pub struct Collaborators {
    pub recognizer: Box<dyn TextRecognizer>,
    pub captioner: Box<dyn ImageCaptioner>,
    pub classifier: Box<dyn ZeroShotClassifier>,
    pub detector: Box<dyn ObjectDetector>,
}

impl Collaborators {
    /// OCRは tesseract、他は利用不可
    pub fn from_config(config: &Config) -> Self {
        Self {
            recognizer: Box::new(TesseractCli::from_config(&config.ocr)),
            captioner: Box::new(Unavailable("captioner")),
            classifier: Box::new(Unavailable("classifier")),
            detector: Box::new(Unavailable("detector")),
        }
    }

    /// 記録済み信号で全モデルを代替する
    pub fn from_recorded(recorded: RecordedSignals) -> Self {
        Self {
            recognizer: Box::new(recorded.clone()),
            captioner: Box::new(recorded.clone()),
            classifier: Box::new(recorded.clone()),
            detector: Box::new(recorded),
        }
    }

    /// 画像ごとの外部モデルを決める
    ///
    /// 明示された信号ファイル → 画像の隣の信号ファイル → tesseract の順。
    pub fn resolve(config: &Config, image_path: Option<&Path>, signals: Option<&Path>) -> Result<Self> {
        if let Some(path) = signals {
            return Ok(Self::from_recorded(RecordedSignals::load(path)?));
        }
        if let Some(image_path) = image_path {
            let sidecar = sidecar_path(image_path, &config.signals_suffix);
            if sidecar.is_file() {
                tracing::info!(path = %sidecar.display(), "記録済み信号を使用");
                return Ok(Self::from_recorded(RecordedSignals::load(&sidecar)?));
            }
        }
        Ok(Self::from_config(config))
    }
}

/// 失敗した外部モデルの結果を空に置き換える
fn or_empty<T: Default>(result: Result<T>, collaborator: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(collaborator, "外部モデルが失敗したため空の結果で続行: {}", e);
            T::default()
        }
    }
}

/// 全バリアントのOCR断片を1つのテキストにまとめる
///
/// 信頼度が閾値以下の断片と空白だけの断片は捨て、改行で連結する。
pub fn merge_ocr_text(fragments: &[TextFragment], min_confidence: f64) -> String {
    fragments
        .iter()
        .filter(|f| f.confidence.map_or(true, |c| c > min_confidence))
        .map(|f| f.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// 外部モデルから集めた信号とバリアント数
#[derive(Debug, Clone, PartialEq)]
pub struct GatheredSignals {
    pub signals: SchemeSignals,
    pub processed_images: usize,
}

/// 資材検出パイプライン
pub struct MaterialDetector {
    collaborators: Collaborators,
    config: Config,
}

impl MaterialDetector {
    pub fn new(collaborators: Collaborators, config: Config) -> Self {
        Self { collaborators, config }
    }

    /// 外部モデルを呼んで信号を集める
    pub fn gather_signals(&self, image: &SchemeImage) -> GatheredSignals {
        let variants = generate_variants(&image.image, &self.config);

        let mut fragments = Vec::new();
        for (index, variant) in variants.iter().enumerate() {
            tracing::debug!(variant = variant.name, "OCR {}/{}", index + 1, variants.len());
            fragments.extend(or_empty(self.collaborators.recognizer.recognize(variant), "ocr"));
        }
        let ocr_text = merge_ocr_text(&fragments, self.config.ocr.min_confidence);
        tracing::info!(length = ocr_text.chars().count(), "テキスト抽出完了");

        let caption = or_empty(
            self.collaborators.captioner.caption(image, CAPTION_QUESTIONS),
            "captioner",
        );

        let classifications = rank_classifications(&or_empty(
            self.collaborators.classifier.classify(image, CLASSIFIER_LABELS),
            "classifier",
        ));

        // 全閾値の検出をまとめる（重複はエンジン側でIoU除去）
        let detections: Vec<Detection> = self
            .config
            .detection_thresholds
            .iter()
            .flat_map(|&threshold| {
                or_empty(self.collaborators.detector.detect(image, threshold), "detector")
            })
            .collect();

        GatheredSignals {
            signals: SchemeSignals {
                ocr_text,
                caption,
                classifications,
                detections,
            },
            processed_images: variants.len(),
        }
    }

    /// 画像1件を処理してレスポンスを作る
    pub fn detect(&self, image: &SchemeImage, with_analysis: bool) -> DetectionResponse {
        let gathered = self.gather_signals(image);
        respond(&gathered.signals, gathered.processed_images, with_analysis)
    }
}

/// 信号からレスポンスを作る（画像なしでも使用）
pub fn respond(signals: &SchemeSignals, processed_images: usize, with_analysis: bool) -> DetectionResponse {
    let report = build_report(signals);
    tracing::info!(
        materials = report.materials.len(),
        confidence = report.overall_confidence,
        "資材検出完了"
    );

    let response = DetectionResponse::from_report(report, signals, processed_images);
    if with_analysis {
        response.with_well_analysis()
    } else {
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_ocr_text_filters_low_confidence() {
        let fragments = vec![
            TextFragment::new("кольцо кс-20", Some(0.9)),
            TextFragment::new("шум", Some(0.2)),
            TextFragment::new("   ", None),
            TextFragment::new("люк 700\n", None),
        ];
        assert_eq!(merge_ocr_text(&fragments, 0.2), "кольцо кс-20\nлюк 700");
    }

    #[test]
    fn test_merge_ocr_text_empty() {
        assert_eq!(merge_ocr_text(&[], 0.2), "");
    }

    fn label(name: &str, confidence: f64) -> LabelScore {
        LabelScore {
            label: name.to_string(),
            confidence,
        }
    }

    /// 記録済み信号の分類が未整列でも上位5件だけで判定する
    #[test]
    fn test_respond_ranks_unsorted_classifications() {
        let signals = SchemeSignals {
            ocr_text: "кирпич м150".to_string(),
            classifications: vec![
                label("pipe", 0.4),
                label("tube", 0.5),
                label("fitting", 0.6),
                label("valve", 0.7),
                label("technical drawing", 0.8),
                label("bottom plate", 0.45),
                label("water well", 0.31),
            ],
            ..Default::default()
        };

        let response = respond(&signals, 0, false);
        assert!(!response.is_well_scheme);
        assert!(!response.materials.is_empty());
        assert_eq!(response.analysis_results.classifications.len(), 5);
        assert_eq!(response.analysis_results.processing_info.top_class, "technical drawing");

        // 記録済み信号を外部モデルとして通した場合と一致する
        let image = SchemeImage {
            source: "test".into(),
            bytes: vec![1],
            image: image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
                2,
                2,
                image::Rgb([255, 255, 255]),
            )),
        };
        let config = Config {
            generate_variants: false,
            ..Default::default()
        };
        let detector = MaterialDetector::new(
            Collaborators::from_recorded(RecordedSignals::new(signals)),
            config,
        );
        let detected = detector.detect(&image, false);
        assert_eq!(detected.is_well_scheme, response.is_well_scheme);
        assert_eq!(detected.materials, response.materials);
        assert_eq!(detected.overall_confidence, response.overall_confidence);
    }

    #[test]
    fn test_or_empty_substitutes_default() {
        let failed: Result<Vec<LabelScore>> = Err(WellBomError::Collaborator("down".into()));
        assert!(or_empty(failed, "classifier").is_empty());
    }
}
