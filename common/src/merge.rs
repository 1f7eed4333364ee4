//! 候補の重複統合
//!
//! (小文字名, サイズ) の完全一致でグループ化し、1グループ1明細にまとめる。

use crate::types::{MaterialCandidate, MaterialRecord};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// 複数の信号が一致したときの信頼度加点
pub const CORROBORATION_BONUS: f64 = 0.1;

/// 候補を統合して最終明細にする
///
/// - 1件のグループはそのまま明細化
/// - 複数件は数量を合算し、最大信頼度 + 0.1（上限1.0）、抽出経路を集約
///
/// 結果は (信頼度, 数量) の降順。
pub fn merge_candidates(candidates: Vec<MaterialCandidate>) -> Vec<MaterialRecord> {
    let input_count = candidates.len();

    // 出現順を保ったままグループ化
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<MaterialCandidate>> = HashMap::new();
    for candidate in candidates {
        let key = candidate.merge_key();
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(candidate);
    }

    let mut records: Vec<MaterialRecord> = order
        .iter()
        .filter_map(|key| groups.remove(key))
        .filter_map(merge_group)
        .collect();

    records.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.quantity.cmp(&a.quantity))
    });

    tracing::debug!(candidates = input_count, records = records.len(), "候補を統合");

    records
}

fn merge_group(group: Vec<MaterialCandidate>) -> Option<MaterialRecord> {
    if group.len() == 1 {
        return group.into_iter().next().map(MaterialRecord::from);
    }

    let total_quantity = group.iter().fold(0u32, |acc, c| acc.saturating_add(c.quantity));
    let sources: BTreeSet<_> = group.iter().map(|c| c.source).collect();

    // 同率なら先に現れた候補を採用
    let best = group.into_iter().reduce(|best, c| {
        if c.confidence > best.confidence {
            c
        } else {
            best
        }
    })?;

    let mut record = MaterialRecord::from(best);
    record.quantity = total_quantity;
    record.confidence = (record.confidence + CORROBORATION_BONUS).min(1.0);
    record.sources = Some(sources);
    Some(record)
}
