//! 物体検出結果の資材マッピング
//!
//! 検出器は汎用語彙で学習されているため、大半のクラスは無関係。
//! 複数閾値での重複検出をIoUで除去してから、対応表にあるクラスだけを候補化する。

use crate::types::{Detection, MaterialCandidate, Provenance, DETECTED_SIZE};

/// IoUがこれを超えたら同一物体とみなす
pub const IOU_DUPLICATE_THRESHOLD: f64 = 0.5;

/// 検出由来候補のカテゴリ
pub const DETECTED_CATEGORY: &str = "detected_object";

/// 検出由来候補の単位
pub const DETECTED_UNIT: &str = "дона";

/// 検出クラス → 資材名
const DETECTION_MATERIALS: &[(&str, &str)] = &[
    ("bottle", "Труба ПНД"),
    ("cup", "Муфта соединительная"),
    ("bowl", "Заглушка"),
    ("cell phone", "Люк"),
    ("laptop", "Схема"),
    ("book", "Техническая документация"),
    ("scissors", "Инструмент"),
    ("spoon", "Фитинг"),
    ("knife", "Уплотнитель"),
];

/// 検出クラスに対応する資材名
pub fn material_for_class(class_name: &str) -> Option<&'static str> {
    DETECTION_MATERIALS
        .iter()
        .find(|(class, _)| *class == class_name)
        .map(|(_, material)| *material)
}

/// 重なった検出を除去する
///
/// 入力順に走査し、既存の検出とIoU > 0.5 なら信頼度の高い方だけを残す。
pub fn deduplicate_detections(detections: &[Detection]) -> Vec<Detection> {
    let mut unique: Vec<Detection> = Vec::new();

    for detection in detections {
        let overlapping = unique
            .iter()
            .position(|existing| detection.bbox.iou(&existing.bbox) > IOU_DUPLICATE_THRESHOLD);

        match overlapping {
            Some(index) if detection.confidence > unique[index].confidence => {
                unique.remove(index);
                unique.push(detection.clone());
            }
            Some(_) => {}
            None => unique.push(detection.clone()),
        }
    }

    unique
}

/// 検出を資材候補に変換する（対応表にないクラスは捨てる）
pub fn map_detections(detections: &[Detection]) -> Vec<MaterialCandidate> {
    detections
        .iter()
        .filter_map(|d| {
            let material = material_for_class(&d.class_name)?;
            Some(MaterialCandidate {
                name: material.to_string(),
                size: DETECTED_SIZE.to_string(),
                quantity: 1,
                category: DETECTED_CATEGORY.to_string(),
                unit: DETECTED_UNIT.to_string(),
                confidence: d.confidence.clamp(0.0, 1.0),
                source: Provenance::DetectionMapped,
                notes: Vec::new(),
            })
        })
        .collect()
}

/// 重複除去と変換をまとめて行う
///
/// # Returns
/// (生き残った検出, 資材候補)
pub fn detection_candidates(detections: &[Detection]) -> (Vec<Detection>, Vec<MaterialCandidate>) {
    let unique = deduplicate_detections(detections);
    let candidates = map_detections(&unique);
    tracing::debug!(
        raw = detections.len(),
        unique = unique.len(),
        mapped = candidates.len(),
        "検出結果をマッピング"
    );
    (unique, candidates)
}
