//! 総合信頼度と推奨事項

use crate::taxonomy::ESSENTIAL_FAMILIES;
use crate::types::{LabelScore, MaterialRecord, Recommendation, RecommendationKind};

/// これ未満で低精度警告
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// これを超える数量で再確認を促す
pub const HIGH_QUANTITY_THRESHOLD: u32 = 10;

/// 必須ファミリーがこれ未満なら欠落警告
pub const MIN_ESSENTIAL_FAMILIES: usize = 3;

/// 信号が欠けているときの中立値
///
/// 欠落したキャプションは50文字未満のキャプションより高く評価される。
const NEUTRAL_QUALITY: f64 = 0.5;

/// 総合信頼度を計算する
///
/// 0.4 × 平均信頼度 + 0.2 × テキスト品質 + 0.2 × キャプション品質 + 0.2 × 分類の最上位確率。
/// 資材が1件もなければ他の信号に関わらず 0.0。
pub fn overall_confidence(
    materials: &[MaterialRecord],
    text: &str,
    caption: &str,
    classifications: &[LabelScore],
) -> f64 {
    if materials.is_empty() {
        return 0.0;
    }

    let material_confidence =
        materials.iter().map(|m| m.confidence).sum::<f64>() / materials.len() as f64;

    let text_quality = (text.chars().count() as f64 / 1000.0).min(1.0);

    let caption_quality = if caption.is_empty() {
        NEUTRAL_QUALITY
    } else {
        (caption.chars().count() as f64 / 100.0).min(1.0)
    };

    let classifier_quality = classifications
        .first()
        .map(|c| c.confidence)
        .unwrap_or(NEUTRAL_QUALITY);

    let overall = material_confidence * 0.4
        + text_quality * 0.2
        + caption_quality * 0.2
        + classifier_quality * 0.2;

    overall.clamp(0.0, 1.0)
}

/// 明細に含まれる必須ファミリーの種類数
pub fn essential_family_count(materials: &[MaterialRecord]) -> usize {
    ESSENTIAL_FAMILIES
        .iter()
        .filter(|family| {
            materials
                .iter()
                .any(|m| m.name.to_lowercase().contains(*family))
        })
        .count()
}

/// 推奨事項を生成する（条件は互いに独立）
pub fn generate_recommendations(
    materials: &[MaterialRecord],
    is_well_scheme: bool,
    confidence: f64,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if confidence < LOW_CONFIDENCE_THRESHOLD {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Warning,
            message: "Анализ показал низкую точность. Рекомендуется проверить результаты вручную."
                .to_string(),
            suggestion: "Попробуйте загрузить более четкое изображение схемы.".to_string(),
        });
    }

    if is_well_scheme {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Info,
            message: "Обнаружена схема колодца водоснабжения/канализации.".to_string(),
            suggestion: "Проверьте соответствие материалов нормативам СНиП.".to_string(),
        });

        if essential_family_count(materials) < MIN_ESSENTIAL_FAMILIES {
            recommendations.push(Recommendation {
                kind: RecommendationKind::Warning,
                message: "Не все основные элементы колодца обнаружены.".to_string(),
                suggestion: "Убедитесь, что на схеме присутствуют: кольца, крышка, люк, трубы."
                    .to_string(),
            });
        }
    }

    let bulk: Vec<&str> = materials
        .iter()
        .filter(|m| m.quantity > HIGH_QUANTITY_THRESHOLD)
        .map(|m| m.name.as_str())
        .collect();
    if !bulk.is_empty() {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Info,
            message: format!(
                "Обнаружены материалы в больших количествах: {}",
                bulk.join(", ")
            ),
            suggestion: "Проверьте правильность подсчета количества материалов.".to_string(),
        });
    }

    recommendations
}
