use crate::error::FailureResponse;
use serde::{Deserialize, Serialize};
use well_bom_common::{
    CaptionResult, Detection, LabelScore, MaterialRecord, MaterialReport, Recommendation,
    SchemeClassification, SchemeSignals, WellAnalysis,
};

/// OCR断片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    /// エンジンが信頼度を返さない場合は None
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// 処理の概要
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    /// OCRに渡した画像バリアント数
    pub processed_images: usize,
    /// 連結テキストの文字数
    pub text_length: usize,
    pub caption: String,
    /// 分類の最上位ラベル（なければ "unknown"）
    pub top_class: String,
    pub detection_count: usize,
}

/// 外部モデル出力の内訳
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub detected_text: String,
    pub caption: CaptionResult,
    pub classifications: Vec<LabelScore>,
    /// 重複除去後の検出
    pub detections: Vec<Detection>,
    pub total_materials: usize,
    pub processing_info: ProcessingInfo,
}

/// 検出リクエスト1件のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,
    pub materials: Vec<MaterialRecord>,
    pub is_well_scheme: bool,
    pub scheme: SchemeClassification,
    pub overall_confidence: f64,
    pub recommendations: Vec<Recommendation>,
    pub analysis_results: AnalysisResults,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_analysis: Option<WellAnalysis>,
}

impl DetectionResponse {
    pub fn from_report(report: MaterialReport, signals: &SchemeSignals, processed_images: usize) -> Self {
        let processing_info = ProcessingInfo {
            processed_images,
            text_length: signals.ocr_text.chars().count(),
            caption: signals.caption.caption.clone(),
            top_class: report
                .classifications
                .first()
                .map(|c| c.label.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            detection_count: report.detections.len(),
        };

        Self {
            success: true,
            analysis_results: AnalysisResults {
                detected_text: signals.ocr_text.clone(),
                caption: signals.caption.clone(),
                classifications: report.classifications,
                detections: report.detections,
                total_materials: report.materials.len(),
                processing_info,
            },
            materials: report.materials,
            is_well_scheme: report.is_well_scheme,
            scheme: report.scheme,
            overall_confidence: report.overall_confidence,
            recommendations: report.recommendations,
            well_analysis: None,
        }
    }

    /// 井戸分析を付与する
    pub fn with_well_analysis(mut self) -> Self {
        self.well_analysis = Some(well_bom_common::analyze_well(&self.materials, self.is_well_scheme));
        self
    }
}

/// バッチ1件の結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Success(Box<DetectionResponse>),
    Failure(FailureResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }
}
