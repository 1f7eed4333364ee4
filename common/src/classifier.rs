//! 井戸スキーム判定
//!
//! OCRテキスト・キャプション・分類ラベルの3信号をOR結合で判定する。
//! 再現率優先: 誤検出は専用タクソノミーを選ぶだけで済むが、
//! 見逃しは誤ったタクソノミーで抽出することになる。

use crate::taxonomy::{
    CLASSIFIER_LABELS, CLASSIFIER_TOP_K, SCHEME_KEYWORDS, WELL_LABELS, WELL_LABEL_THRESHOLD,
};
use crate::types::{LabelScore, SchemeClassification};

/// テキストに含まれるスキームキーワードを返す
fn matched_keywords(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lower = text.to_lowercase();
    SCHEME_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .map(|kw| kw.to_string())
        .collect()
}

/// 分類結果を確率の降順に並べ、語彙外ラベルを除いて上位のみ残す
///
/// 判定と総合信頼度はこの順位付け済みリストだけを見る。
pub fn rank_classifications(classifications: &[LabelScore]) -> Vec<LabelScore> {
    let mut ranked: Vec<LabelScore> = classifications
        .iter()
        .filter(|c| CLASSIFIER_LABELS.contains(&c.label.as_str()))
        .cloned()
        .collect();
    // 同率は入力順を保つ
    ranked.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(CLASSIFIER_TOP_K);
    ranked
}

/// 井戸スキームかどうかを判定する
///
/// 3つの判定を順に評価し、最初に真になった時点で打ち切る:
/// 1. OCRテキストのキーワード
/// 2. キャプション＋回答のキーワード
/// 3. 分類ラベル（確率 > 0.3）
///
/// 入力が空でも失敗せず、全判定が偽なら汎用扱い。
pub fn classify_scheme(
    ocr_text: &str,
    caption_text: &str,
    classifications: &[LabelScore],
) -> SchemeClassification {
    let mut result = SchemeClassification::default();

    result.matched_keywords = matched_keywords(ocr_text);
    if !result.matched_keywords.is_empty() {
        result.is_well_scheme = true;
        tracing::debug!(keywords = ?result.matched_keywords, "OCRテキストで井戸スキームを検出");
        return result;
    }

    result.matched_caption_keywords = matched_keywords(caption_text);
    if !result.matched_caption_keywords.is_empty() {
        result.is_well_scheme = true;
        tracing::debug!(keywords = ?result.matched_caption_keywords, "キャプションで井戸スキームを検出");
        return result;
    }

    result.matched_labels = classifications
        .iter()
        .filter(|c| WELL_LABELS.contains(&c.label.as_str()) && c.confidence > WELL_LABEL_THRESHOLD)
        .map(|c| c.label.clone())
        .collect();
    result.is_well_scheme = !result.matched_labels.is_empty();
    if result.is_well_scheme {
        tracing::debug!(labels = ?result.matched_labels, "分類ラベルで井戸スキームを検出");
    }

    result
}
