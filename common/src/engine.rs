//! 資材抽出エンジン
//!
//! 外部モデルの信号一式から最終レポートまでを同期的に処理する。
//! 共有状態は読み取り専用のタクソノミーのみ。

use crate::classifier::{classify_scheme, rank_classifications};
use crate::context::enhance_candidates;
use crate::detection::detection_candidates;
use crate::extractor::{extract_caption_candidates, extract_candidates, TextOrigin};
use crate::merge::merge_candidates;
use crate::scoring::{generate_recommendations, overall_confidence};
use crate::taxonomy::{taxonomy, TaxonomyKind};
use crate::types::{
    Detection, LabelScore, MaterialRecord, MaterialReport, SchemeClassification, SchemeSignals,
};

/// 抽出・統合までの中間結果
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub scheme: SchemeClassification,
    pub materials: Vec<MaterialRecord>,
    /// 重複除去後の検出
    pub detections: Vec<Detection>,
    /// 順位付け済みの分類（上位のみ）
    pub classifications: Vec<LabelScore>,
}

/// スキーム判定結果に対応するタクソノミー種別
pub fn taxonomy_kind_for(is_well_scheme: bool) -> TaxonomyKind {
    if is_well_scheme {
        TaxonomyKind::Well
    } else {
        TaxonomyKind::General
    }
}

/// 信号から資材明細を抽出する
///
/// 判定 → タクソノミー選択 → OCR/キャプション抽出 → 検出マッピング → 文脈補正 → 統合
pub fn extract_materials(signals: &SchemeSignals) -> Extraction {
    let caption_text = signals.caption.combined_text();
    let classifications = rank_classifications(&signals.classifications);
    let scheme = classify_scheme(&signals.ocr_text, &caption_text, &classifications);
    let taxonomy = taxonomy(taxonomy_kind_for(scheme.is_well_scheme));

    let mut candidates = extract_candidates(&signals.ocr_text, taxonomy, TextOrigin::Ocr);
    candidates.extend(extract_caption_candidates(&signals.caption, taxonomy));

    let (detections, detected) = detection_candidates(&signals.detections);
    candidates.extend(detected);

    let candidate_count = candidates.len();
    let enhanced = enhance_candidates(candidates, &signals.ocr_text, scheme.is_well_scheme);
    let materials = merge_candidates(enhanced);

    tracing::debug!(
        is_well_scheme = scheme.is_well_scheme,
        candidates = candidate_count,
        materials = materials.len(),
        "資材抽出完了"
    );

    Extraction {
        scheme,
        materials,
        detections,
        classifications,
    }
}

/// 信号から最終レポートを作る
pub fn build_report(signals: &SchemeSignals) -> MaterialReport {
    let Extraction {
        scheme,
        materials,
        detections,
        classifications,
    } = extract_materials(signals);

    let confidence = overall_confidence(
        &materials,
        &signals.ocr_text,
        &signals.caption.caption,
        &classifications,
    );
    let recommendations = generate_recommendations(&materials, scheme.is_well_scheme, confidence);

    MaterialReport {
        materials,
        is_well_scheme: scheme.is_well_scheme,
        scheme,
        overall_confidence: confidence,
        recommendations,
        detections,
        classifications,
    }
}
