//! 資材抽出の型定義
//!
//! CLIとバッチ処理で共有される型:
//! - SchemeSignals: 外部モデル（OCR・キャプション・分類・検出）の出力
//! - MaterialCandidate: 重複を含む暫定検出
//! - MaterialRecord: 統合後の最終明細
//! - MaterialReport: 信頼度・推奨事項を含む最終出力

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// サイズ未指定時の番兵値
pub const STANDARD_SIZE: &str = "Standard";

/// 物体検出由来の候補に付くサイズ
pub const DETECTED_SIZE: &str = "Determine from scheme";

/// 抽出経路
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    TextPattern,
    TextKeyword,
    CaptionText,
    DetectionMapped,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::TextPattern => write!(f, "text_pattern"),
            Provenance::TextKeyword => write!(f, "text_keyword"),
            Provenance::CaptionText => write!(f, "caption_text"),
            Provenance::DetectionMapped => write!(f, "detection_mapped"),
        }
    }
}

/// 暫定検出（統合前）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCandidate {
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub category: String,
    pub unit: String,
    pub confidence: f64,
    pub source: Provenance,
    /// 用途メモ（文脈補正で付与）
    #[serde(default)]
    pub notes: Vec<String>,
}

impl MaterialCandidate {
    /// 正規化キー（小文字名 + サイズ）
    pub fn merge_key(&self) -> String {
        format!("{}_{}", self.name.to_lowercase(), self.size)
    }

    /// サイズが未指定か
    pub fn has_standard_size(&self) -> bool {
        self.size == STANDARD_SIZE
    }
}

/// 統合済みの資材明細
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub category: String,
    pub unit: String,
    pub confidence: f64,
    pub source: Provenance,
    #[serde(default)]
    pub notes: Vec<String>,
    /// 統合元の抽出経路（複数候補を統合した場合のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<BTreeSet<Provenance>>,
}

impl From<MaterialCandidate> for MaterialRecord {
    fn from(candidate: MaterialCandidate) -> Self {
        Self {
            name: candidate.name,
            size: candidate.size,
            quantity: candidate.quantity,
            category: candidate.category,
            unit: candidate.unit,
            confidence: candidate.confidence,
            source: candidate.source,
            notes: candidate.notes,
            sources: None,
        }
    }
}

/// キャプション・質問応答の出力
///
/// `answers` は質問リストと位置で対応する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionResult {
    pub caption: String,
    pub answers: Vec<String>,
}

impl CaptionResult {
    /// キャプションと回答を空白区切りで連結
    pub fn combined_text(&self) -> String {
        let mut parts = Vec::with_capacity(self.answers.len() + 1);
        parts.push(self.caption.as_str());
        parts.extend(self.answers.iter().map(String::as_str));
        parts.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.caption.is_empty() && self.answers.iter().all(|a| a.is_empty())
    }
}

/// ゼロショット分類の1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub confidence: f64,
}

/// 軸平行バウンディングボックス（左上・右下）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    /// 面積（退化した箱は0）
    pub fn area(&self) -> f64 {
        let width = self.x_max - self.x_min;
        let height = self.y_max - self.y_min;
        if width <= 0.0 || height <= 0.0 {
            0.0
        } else {
            width * height
        }
    }

    /// Intersection over Union
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        if self.area() <= 0.0 || other.area() <= 0.0 {
            return 0.0;
        }

        let inter_x_min = self.x_min.max(other.x_min);
        let inter_y_min = self.y_min.max(other.y_min);
        let inter_x_max = self.x_max.min(other.x_max);
        let inter_y_max = self.y_max.min(other.y_max);

        if inter_x_max <= inter_x_min || inter_y_max <= inter_y_min {
            return 0.0;
        }

        let inter_area = (inter_x_max - inter_x_min) * (inter_y_max - inter_y_min);
        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }
}

/// 物体検出の1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
    /// 検出時の信頼度閾値
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

/// 外部モデルから集めた信号一式
///
/// いずれの信号も欠落し得る（空文字列・空配列）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeSignals {
    /// 全OCRエンジン・全画像バリアントの連結テキスト
    pub ocr_text: String,
    pub caption: CaptionResult,
    pub classifications: Vec<LabelScore>,
    pub detections: Vec<Detection>,
}

/// スキーム判定結果と根拠
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemeClassification {
    pub is_well_scheme: bool,
    /// OCRテキストで一致したキーワード
    pub matched_keywords: Vec<String>,
    /// キャプション・回答で一致したキーワード
    pub matched_caption_keywords: Vec<String>,
    /// 閾値を超えた分類ラベル
    pub matched_labels: Vec<String>,
}

/// 推奨事項の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Warning,
    Info,
}

/// 推奨事項
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub message: String,
    pub suggestion: String,
}

/// エンジンの最終出力
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialReport {
    pub materials: Vec<MaterialRecord>,
    pub is_well_scheme: bool,
    pub scheme: SchemeClassification,
    pub overall_confidence: f64,
    pub recommendations: Vec<Recommendation>,
    /// IoU重複除去後の検出
    #[serde(default)]
    pub detections: Vec<Detection>,
    /// 順位付け済みの分類（判定と信頼度に使用したもの）
    #[serde(default)]
    pub classifications: Vec<LabelScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_boxes() {
        let a = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_iou_disjoint_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_touching_edges_is_zero() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        // 50 / 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_iou_degenerate_box() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let flat = BoundingBox::new(0.0, 5.0, 10.0, 5.0);
        assert_eq!(a.iou(&flat), 0.0);
        assert_eq!(flat.iou(&flat), 0.0);
    }

    #[test]
    fn test_caption_combined_text() {
        let caption = CaptionResult {
            caption: "a drawing".to_string(),
            answers: vec!["pipes".to_string(), "rings".to_string()],
        };
        assert_eq!(caption.combined_text(), "a drawing pipes rings");
        assert!(!caption.is_empty());
        assert!(CaptionResult::default().is_empty());
    }

    #[test]
    fn test_signals_deserialize_partial() {
        let json = r#"{"ocr_text": "кольцо кс-20"}"#;
        let signals: SchemeSignals = serde_json::from_str(json).unwrap();
        assert_eq!(signals.ocr_text, "кольцо кс-20");
        assert!(signals.caption.is_empty());
        assert!(signals.detections.is_empty());
    }

    #[test]
    fn test_detection_serializes_class_field() {
        let detection = Detection {
            class_name: "bottle".to_string(),
            confidence: 0.5,
            bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            threshold: None,
        };
        let json = serde_json::to_value(&detection).unwrap();
        assert_eq!(json["class"], "bottle");
        assert!(json.get("threshold").is_none());
    }

    #[test]
    fn test_provenance_serialization() {
        let json = serde_json::to_string(&Provenance::DetectionMapped).unwrap();
        assert_eq!(json, "\"detection_mapped\"");
        assert_eq!(Provenance::TextKeyword.to_string(), "text_keyword");
    }

    #[test]
    fn test_recommendation_type_field() {
        let rec = Recommendation {
            kind: RecommendationKind::Warning,
            message: "m".to_string(),
            suggestion: "s".to_string(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "warning");
    }
}
