//! 検出パイプラインの統合テスト
//!
//! 外部モデルを差し替えて、信号の収集からレスポンス生成・一括処理までを検証

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use well_bom::analyzer::{
    Collaborators, ImageCaptioner, MaterialDetector, ObjectDetector, Outcome, TextFragment,
    TextRecognizer, Unavailable, ZeroShotClassifier,
};
use well_bom::batch::{run_batch, BatchOptions};
use well_bom::config::Config;
use well_bom::error::Result;
use well_bom::engine::{BoundingBox, CaptionResult, Detection, LabelScore, SchemeSignals};
use well_bom::preprocess::ImageVariant;
use well_bom::scanner::{self, SchemeImage};

fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb([250, 250, 250]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn scheme_image() -> SchemeImage {
    SchemeImage::from_bytes("test.png".to_string(), png_bytes()).unwrap()
}

fn unavailable() -> Collaborators {
    Collaborators {
        recognizer: Box::new(Unavailable("ocr")),
        captioner: Box::new(Unavailable("captioner")),
        classifier: Box::new(Unavailable("classifier")),
        detector: Box::new(Unavailable("detector")),
    }
}

/// バリアントごとに同じ断片を返すOCR
struct FixedText {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl TextRecognizer for FixedText {
    fn recognize(&self, variant: &ImageVariant) -> Result<Vec<TextFragment>> {
        self.calls.lock().unwrap().push(variant.name);
        if variant.is_original() {
            Ok(vec![
                TextFragment::new("Схема: колодец", Some(0.9)),
                TextFragment::new("кольцо кс-20", Some(0.8)),
                TextFragment::new("шум", Some(0.1)),
            ])
        } else {
            Ok(vec![TextFragment::new("люк 700", None)])
        }
    }
}

struct FixedCaption;

impl ImageCaptioner for FixedCaption {
    fn caption(&self, _image: &SchemeImage, questions: &[&str]) -> Result<CaptionResult> {
        Ok(CaptionResult {
            caption: "a technical drawing of a manhole".to_string(),
            answers: questions.iter().map(|_| String::new()).collect(),
        })
    }
}

struct FixedLabels;

impl ZeroShotClassifier for FixedLabels {
    fn classify(&self, _image: &SchemeImage, _labels: &[&str]) -> Result<Vec<LabelScore>> {
        Ok(vec![
            LabelScore { label: "pipe".to_string(), confidence: 0.2 },
            LabelScore { label: "water well".to_string(), confidence: 0.7 },
            LabelScore { label: "unknown label".to_string(), confidence: 0.9 },
        ])
    }
}

/// どの閾値でも同じ箱を返す検出器
struct SameBox {
    thresholds: Arc<Mutex<Vec<f64>>>,
}

impl ObjectDetector for SameBox {
    fn detect(&self, _image: &SchemeImage, threshold: f64) -> Result<Vec<Detection>> {
        self.thresholds.lock().unwrap().push(threshold);
        Ok(vec![Detection {
            class_name: "cup".to_string(),
            confidence: 0.6,
            bbox: BoundingBox::new(0.0, 0.0, 4.0, 4.0),
            threshold: Some(threshold),
        }])
    }
}

#[test]
fn test_failing_collaborators_yield_empty_success() {
    let detector = MaterialDetector::new(unavailable(), Config::default());
    let response = detector.detect(&scheme_image(), false);

    assert!(response.success);
    assert!(response.materials.is_empty());
    assert!(!response.is_well_scheme);
    assert_eq!(response.overall_confidence, 0.0);
    assert_eq!(response.recommendations.len(), 1);
    assert!(response.well_analysis.is_none());

    let info = &response.analysis_results.processing_info;
    assert_eq!(info.processed_images, 7);
    assert_eq!(info.text_length, 0);
    assert_eq!(info.top_class, "unknown");
    assert_eq!(info.detection_count, 0);
}

#[test]
fn test_gather_signals_from_all_collaborators() {
    let ocr_calls = Arc::new(Mutex::new(Vec::new()));
    let thresholds = Arc::new(Mutex::new(Vec::new()));
    let collaborators = Collaborators {
        recognizer: Box::new(FixedText { calls: Arc::clone(&ocr_calls) }),
        captioner: Box::new(FixedCaption),
        classifier: Box::new(FixedLabels),
        detector: Box::new(SameBox { thresholds: Arc::clone(&thresholds) }),
    };
    let detector = MaterialDetector::new(collaborators, Config::default());

    let gathered = detector.gather_signals(&scheme_image());

    // 全バリアントにOCRをかける
    assert_eq!(gathered.processed_images, 7);
    assert_eq!(ocr_calls.lock().unwrap().len(), 7);

    // 低信頼度の断片は捨てる
    assert!(gathered.signals.ocr_text.starts_with("Схема: колодец\nкольцо кс-20\nлюк 700"));
    assert!(!gathered.signals.ocr_text.contains("шум"));

    // 質問と回答は同数
    assert_eq!(gathered.signals.caption.answers.len(), 10);

    // 語彙外ラベルを除いて降順
    let labels: Vec<&str> = gathered
        .signals
        .classifications
        .iter()
        .map(|c| c.label.as_str())
        .collect();
    assert_eq!(labels, vec!["water well", "pipe"]);

    // 全閾値の結果をまとめる（重複除去前）
    assert_eq!(*thresholds.lock().unwrap(), vec![0.25, 0.35, 0.45, 0.55]);
    assert_eq!(gathered.signals.detections.len(), 4);
}

#[test]
fn test_pooled_detections_are_deduplicated() {
    let collaborators = Collaborators {
        recognizer: Box::new(Unavailable("ocr")),
        captioner: Box::new(Unavailable("captioner")),
        classifier: Box::new(Unavailable("classifier")),
        detector: Box::new(SameBox { thresholds: Arc::new(Mutex::new(Vec::new())) }),
    };
    let detector = MaterialDetector::new(collaborators, Config::default());

    let response = detector.detect(&scheme_image(), false);

    assert_eq!(response.analysis_results.detections.len(), 1);
    assert_eq!(response.analysis_results.processing_info.detection_count, 1);
    assert_eq!(response.materials.len(), 1);
    assert_eq!(response.materials[0].name, "Муфта соединительная");
}

#[test]
fn test_variants_disabled() {
    let config = Config {
        generate_variants: false,
        ..Default::default()
    };
    let detector = MaterialDetector::new(unavailable(), config);
    let response = detector.detect(&scheme_image(), true);

    assert_eq!(response.analysis_results.processing_info.processed_images, 1);
    let analysis = response.well_analysis.expect("分析が付与されていない");
    assert_eq!(analysis.scheme_type, "unknown");
}

#[test]
fn test_resolve_uses_sidecar_signals() {
    let dir = tempdir().expect("Failed to create temp dir");
    let image_path = dir.path().join("well.png");
    std::fs::write(&image_path, png_bytes()).unwrap();

    let signals = SchemeSignals {
        ocr_text: "колодец\nканализация\nкольцо кс-20".to_string(),
        ..Default::default()
    };
    std::fs::write(
        dir.path().join("well.signals.json"),
        serde_json::to_string(&signals).unwrap(),
    )
    .unwrap();

    let config = Config::default();
    let collaborators = Collaborators::resolve(&config, Some(&image_path), None).unwrap();
    let detector = MaterialDetector::new(collaborators, config);
    let response = detector.detect(&SchemeImage::from_path(&image_path).unwrap(), true);

    assert!(response.is_well_scheme);
    assert!(!response.materials.is_empty());
    assert_eq!(response.analysis_results.detected_text, signals.ocr_text);
    assert_eq!(
        response.well_analysis.map(|a| a.scheme_type),
        Some("канализационный колодец".to_string())
    );
}

#[test]
fn test_batch_keeps_going_after_failure() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("broken.jpg"), b"not an image").unwrap();
    std::fs::write(dir.path().join("well.png"), png_bytes()).unwrap();
    std::fs::write(
        dir.path().join("well.signals.json"),
        r#"{"ocr_text": "колодец\nкольцо кс-20\nлюк 700"}"#,
    )
    .unwrap();

    let images = scanner::scan_folder(dir.path()).unwrap();
    assert_eq!(images.len(), 2);

    let options = BatchOptions {
        use_cache: true,
        with_analysis: false,
        show_progress: false,
    };
    let report = run_batch(&images, dir.path(), &Config::default(), &options).unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed(), 1);
    assert!(!report.generated_at.is_empty());

    assert_eq!(report.items[0].file_name, "broken.jpg");
    match &report.items[0].outcome {
        Outcome::Failure(failure) => assert_eq!(failure.error_type, "ImageDecodeError"),
        Outcome::Success(_) => panic!("broken.jpg は失敗するはず"),
    }
    match &report.items[1].outcome {
        Outcome::Success(response) => assert!(response.is_well_scheme),
        Outcome::Failure(failure) => panic!("well.png が失敗: {}", failure.error),
    }

    // 成功した画像だけキャッシュされる
    let cache = well_bom::analyzer::CacheFile::load(dir.path());
    assert_eq!(cache.len(), 1);

    // 2回目はキャッシュから同じ結果
    let again = run_batch(&images, dir.path(), &Config::default(), &options).unwrap();
    assert_eq!(again.succeeded, 1);
    assert_eq!(again.items[1], report.items[1]);
}
