//! 文脈による候補補正
//!
//! - 井戸スキームの場合、標準サイズ・典型数量を事前分布で補い信頼度を加点
//! - テキスト全体の用途キーワード（上水・下水・排水）に応じたメモを全候補に付与

use crate::taxonomy::{taxonomy, TaxonomyKind, UsageContext, DOMAIN_PRIORS, USAGE_CONTEXTS};
use crate::types::MaterialCandidate;

/// 事前分布一致時の信頼度加点
pub const PRIOR_CONFIDENCE_BONUS: f64 = 0.1;

/// テキスト全体に現れる用途
pub fn detect_usage_contexts(text: &str) -> Vec<&'static UsageContext> {
    let lower = text.to_lowercase();
    USAGE_CONTEXTS
        .iter()
        .filter(|ctx| ctx.keywords.iter().any(|kw| lower.contains(kw)))
        .collect()
}

/// 候補を文脈で補正する（件数は変えない）
///
/// # Arguments
/// * `candidates` - 抽出済み候補
/// * `text` - 連結済みOCRテキスト
/// * `is_well_scheme` - スキーム判定結果
pub fn enhance_candidates(
    candidates: Vec<MaterialCandidate>,
    text: &str,
    is_well_scheme: bool,
) -> Vec<MaterialCandidate> {
    let notes: Vec<String> = detect_usage_contexts(text)
        .iter()
        .map(|ctx| ctx.note.to_string())
        .collect();

    candidates
        .into_iter()
        .map(|mut candidate| {
            if is_well_scheme {
                apply_domain_prior(&mut candidate);
            }
            candidate.notes = notes.clone();
            candidate
        })
        .collect()
}

/// 最初に一致した事前分布だけを適用する
fn apply_domain_prior(candidate: &mut MaterialCandidate) {
    let name = candidate.name.to_lowercase();
    let Some(prior) = DOMAIN_PRIORS.iter().find(|p| name.contains(p.keyword)) else {
        return;
    };

    if candidate.has_standard_size() {
        if let Some(size) = taxonomy(TaxonomyKind::Well).default_size(prior.category_key) {
            candidate.size = size.to_string();
        }
    }
    if candidate.quantity == 1 && prior.typical_quantity > 1 {
        candidate.quantity = prior.typical_quantity;
    }
    candidate.confidence = (candidate.confidence + PRIOR_CONFIDENCE_BONUS).min(1.0);
}
